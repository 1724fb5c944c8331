//! Parallel render driver.
//!
//! Rows are handed out one at a time from a shared atomic counter to a
//! fixed pool of workers, since row cost varies wildly with how much
//! fractal detail a row sees. Finished rows travel back over a channel to
//! the calling thread, which owns the framebuffer and is its only writer.

use std::collections::TryReserveError;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::mpsc;
use std::time::Instant;

use rand::rngs::StdRng;
use rand::SeedableRng;
use sponge_core::{
    Color, FrameOutput, Framebuffer, ImageIoError, ImageSettings, RenderSettings, SettingsError,
};
use sponge_math::DVec3;
use thiserror::Error;

use crate::camera::Camera;
use crate::gen_f64;
use crate::integrator::{Integrator, PathIntegrator};
use crate::scene::Scene;

/// Errors that abort a render.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Invalid settings: {0}")]
    Settings(#[from] SettingsError),

    #[error("Camera basis is degenerate (direction {direction:?}, up {up:?})")]
    DegenerateCamera { direction: DVec3, up: DVec3 },

    #[error("Failed to allocate a {width}x{height} framebuffer: {source}")]
    Allocation {
        width: u32,
        height: u32,
        #[source]
        source: TryReserveError,
    },

    #[error("Failed to start worker threads: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("Failed to write output: {0}")]
    Output(#[from] ImageIoError),

    #[error("Only {delivered} of {expected} rows were rendered")]
    WorkerPanicked { delivered: u32, expected: u32 },
}

impl RenderError {
    /// Non-zero process status for this error class.
    pub fn status_code(&self) -> i32 {
        match self {
            RenderError::Settings(_) => 2,
            RenderError::DegenerateCamera { .. } => 3,
            RenderError::Allocation { .. } => 4,
            RenderError::ThreadPool(_) => 5,
            RenderError::Output(_) => 6,
            RenderError::WorkerPanicked { .. } => 7,
        }
    }
}

/// Read-only view of render progress.
///
/// Called on the thread that started the render, between row deliveries;
/// implementations must return quickly.
pub trait RenderObserver {
    /// A row finished; `rows_done` counts rows delivered so far.
    fn row_completed(&self, _rows_done: u32, _total_rows: u32) {}

    /// Periodic snapshot of the partially filled framebuffer.
    fn snapshot(&self, _framebuffer: &Framebuffer, _rows_done: u32) {}
}

/// Observer that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl RenderObserver for NoopObserver {}

/// A finished image row.
#[derive(Debug, Clone)]
pub struct RowResult {
    /// Row index in render order (0 = bottom of the screen)
    pub y: u32,
    /// Pixel colors, left to right
    pub pixels: Vec<Color>,
}

/// Per-row random number generator; seeds depend only on the row.
pub fn row_rng(y: u32) -> StdRng {
    StdRng::seed_from_u64(y as u64 + 1)
}

/// Running mean of colors.
///
/// Samples are summed as offsets from the first one with Neumaier
/// compensation, so a constant input averages to exactly that constant
/// and long sums of small contributions keep their low bits.
#[derive(Debug, Clone, Copy, Default)]
pub struct ColorMean {
    pivot: Option<Color>,
    sum: Color,
    compensation: Color,
    count: u64,
}

impl ColorMean {
    pub fn add(&mut self, color: Color) {
        let pivot = *self.pivot.get_or_insert(color);
        let x = color - pivot;
        let t = self.sum + x;
        let big_sum = self.sum.abs().cmpge(x.abs());
        self.compensation += Color::select(big_sum, (self.sum - t) + x, (x - t) + self.sum);
        self.sum = t;
        self.count += 1;
    }

    /// Mean over `count` samples, where samples never added count as black.
    pub fn mean_over(&self, count: u64) -> Color {
        let Some(pivot) = self.pivot else {
            return Color::ZERO;
        };
        let missing = count.saturating_sub(self.count);
        let mean = pivot + (self.sum + self.compensation) / self.count as f64;
        if missing == 0 {
            mean
        } else {
            mean * self.count as f64 / count as f64
        }
    }
}

/// Render one row: every pixel averages `samples * supersamples^2`
/// jittered radiance estimates.
pub fn render_row(
    y: u32,
    camera: &Camera,
    integrator: &dyn Integrator,
    image: &ImageSettings,
) -> Vec<Color> {
    let mut rng = row_rng(y);
    let rate = 1.0 / image.supersamples as f64;
    let mut pixels = Vec::with_capacity(image.width as usize);

    for x in 0..image.width {
        let mut pixel = ColorMean::default();
        for sy in 0..image.supersamples {
            for sx in 0..image.supersamples {
                for _ in 0..image.samples {
                    let u = x as f64 + (sx as f64 + gen_f64(&mut rng)) * rate;
                    let v = y as f64 + (sy as f64 + gen_f64(&mut rng)) * rate;
                    if let Some(ray) = camera.ray(u, v) {
                        pixel.add(integrator.estimate_radiance(&ray, &mut rng, 0));
                    }
                }
            }
        }
        pixels.push(pixel.mean_over(image.samples_per_pixel()));
    }

    pixels
}

/// Render the configured scene into a new framebuffer.
pub fn render_framebuffer(
    settings: &RenderSettings,
    observer: &dyn RenderObserver,
) -> Result<Framebuffer, RenderError> {
    let scene = Scene::new(&settings.scene)?;
    let integrator = PathIntegrator::new(scene, settings.march, settings.integrator);
    render_with(settings, &integrator, observer)
}

/// Render with a caller-supplied integrator.
pub fn render_with(
    settings: &RenderSettings,
    integrator: &dyn Integrator,
    observer: &dyn RenderObserver,
) -> Result<Framebuffer, RenderError> {
    settings.validate()?;
    let image = settings.image;
    let (width, height) = (image.width, image.height);

    let camera = Camera::new(&settings.camera, width, height)?;
    let mut framebuffer = Framebuffer::try_new(width, height).map_err(|source| {
        RenderError::Allocation {
            width,
            height,
            source,
        }
    })?;

    let threads = match settings.threads {
        0 => std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1),
        n => n,
    }
    .min(height as usize);
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(|i| format!("sponge-row-{i}"))
        .build()?;

    log::info!(
        "Rendering {}x{} @ {} spp on {} threads",
        width,
        height,
        image.samples_per_pixel(),
        threads
    );
    let start = Instant::now();

    let interval = settings.snapshot_interval();
    let next_row = AtomicU32::new(0);
    let (tx, rx) = mpsc::channel::<RowResult>();
    let mut rows_done = 0u32;

    pool.in_place_scope(|scope| {
        for _ in 0..threads {
            let tx = tx.clone();
            let next_row = &next_row;
            let camera = &camera;
            let image = &image;
            scope.spawn(move |_| loop {
                let y = next_row.fetch_add(1, Ordering::Relaxed);
                if y >= height {
                    break;
                }
                let rendered = panic::catch_unwind(AssertUnwindSafe(|| {
                    render_row(y, camera, integrator, image)
                }));
                let Ok(pixels) = rendered else {
                    log::error!("Worker panicked while rendering row {y}");
                    break;
                };
                if tx.send(RowResult { y, pixels }).is_err() {
                    break;
                }
            });
        }
        drop(tx);

        for row in rx {
            // Render order runs bottom-up; the framebuffer is stored top-down
            let target = height - row.y - 1;
            framebuffer.row_mut(target).copy_from_slice(&row.pixels);
            rows_done += 1;

            log::debug!(
                "Rendered row y = {} ({:.1}%)",
                row.y,
                100.0 * rows_done as f64 / height as f64
            );
            observer.row_completed(rows_done, height);
            if interval > 0 && rows_done % interval == 0 && rows_done < height {
                observer.snapshot(&framebuffer, rows_done);
            }
        }
    });

    if rows_done != height {
        return Err(RenderError::WorkerPanicked {
            delivered: rows_done,
            expected: height,
        });
    }

    log::info!("Rendered {} rows in {:?}", rows_done, start.elapsed());
    Ok(framebuffer)
}

/// Render and hand the finished framebuffer to `output`.
pub fn render(
    settings: &RenderSettings,
    observer: &dyn RenderObserver,
    output: &mut dyn FrameOutput,
) -> Result<(), RenderError> {
    let framebuffer = render_framebuffer(settings, observer)?;
    output.write_frame(&framebuffer)?;
    Ok(())
}

/// Like [`render`], reporting a process status: 0 on success, otherwise
/// [`RenderError::status_code`].
pub fn render_status(
    settings: &RenderSettings,
    observer: &dyn RenderObserver,
    output: &mut dyn FrameOutput,
) -> i32 {
    match render(settings, observer, output) {
        Ok(()) => 0,
        Err(e) => {
            log::error!("Render failed: {e}");
            e.status_code()
        }
    }
}
