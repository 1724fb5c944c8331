use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicU32, Ordering};

use anyhow::{bail, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use sponge_core::image_io::{save_image, DEFAULT_GAMMA};
use sponge_core::{CameraPreset, Framebuffer, ImageFile, RenderSettings};
use sponge_renderer::{render, RenderObserver};

const USAGE: &str = "Usage: sponge [--config render.json] [--output image.png] \
[--width N] [--height N] [--samples N] [--supersamples N] [--threads N] \
[--camera overview|interior|oblique] [--snapshots DIR] [--snapshot-interval N] \
[--gamma G] [--print-config]";

/// Command line options; anything unset keeps the config-file value.
#[derive(Debug, Default)]
struct Args {
    config: Option<PathBuf>,
    output: Option<PathBuf>,
    width: Option<u32>,
    height: Option<u32>,
    samples: Option<u32>,
    supersamples: Option<u32>,
    threads: Option<usize>,
    camera: Option<CameraPreset>,
    snapshots: Option<PathBuf>,
    snapshot_interval: Option<u32>,
    gamma: Option<f64>,
    print_config: bool,
}

impl Args {
    fn parse(args: impl IntoIterator<Item = String>) -> Result<Self> {
        let mut parsed = Args::default();
        let mut args = args.into_iter();

        while let Some(flag) = args.next() {
            let mut value = || {
                args.next()
                    .with_context(|| format!("missing value for {flag}\n{USAGE}"))
            };
            match flag.as_str() {
                "--config" => parsed.config = Some(value()?.into()),
                "--output" | "-o" => parsed.output = Some(value()?.into()),
                "--width" => parsed.width = Some(parse_number(&flag, &value()?)?),
                "--height" => parsed.height = Some(parse_number(&flag, &value()?)?),
                "--samples" => parsed.samples = Some(parse_number(&flag, &value()?)?),
                "--supersamples" => parsed.supersamples = Some(parse_number(&flag, &value()?)?),
                "--threads" => parsed.threads = Some(parse_number(&flag, &value()?)?),
                "--camera" => parsed.camera = Some(value()?.parse()?),
                "--snapshots" => parsed.snapshots = Some(value()?.into()),
                "--snapshot-interval" => {
                    parsed.snapshot_interval = Some(parse_number(&flag, &value()?)?)
                }
                "--gamma" => parsed.gamma = Some(parse_number(&flag, &value()?)?),
                "--print-config" => parsed.print_config = true,
                "--help" | "-h" => bail!("{USAGE}"),
                other => bail!("unknown argument '{other}'\n{USAGE}"),
            }
        }

        Ok(parsed)
    }

    /// Load the config file (or defaults) and apply overrides.
    fn settings(&self) -> Result<RenderSettings> {
        let mut settings = match &self.config {
            Some(path) => RenderSettings::from_json_file(path)
                .with_context(|| format!("failed to load config {}", path.display()))?,
            None => RenderSettings::default(),
        };

        let image = &mut settings.image;
        image.width = self.width.unwrap_or(image.width);
        image.height = self.height.unwrap_or(image.height);
        image.samples = self.samples.unwrap_or(image.samples);
        image.supersamples = self.supersamples.unwrap_or(image.supersamples);
        if let Some(threads) = self.threads {
            settings.threads = threads;
        }
        if let Some(preset) = self.camera {
            settings.camera = preset.config();
        }
        if let Some(interval) = self.snapshot_interval {
            settings.progress_interval = Some(interval);
        }
        if self.snapshots.is_none() && self.snapshot_interval.is_none() {
            // Nobody is looking at snapshots
            settings.progress_interval = Some(0);
        }

        Ok(settings)
    }
}

fn parse_number<T: std::str::FromStr>(flag: &str, value: &str) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .parse()
        .with_context(|| format!("invalid value '{value}' for {flag}"))
}

/// Progress bar plus optional numbered snapshot images.
struct Progress {
    bar: ProgressBar,
    snapshot_dir: Option<PathBuf>,
    gamma: f64,
    snapshot_count: AtomicU32,
}

impl Progress {
    fn new(rows: u32, snapshot_dir: Option<PathBuf>, gamma: f64) -> Self {
        let bar = ProgressBar::new(rows as u64);
        bar.set_style(
            ProgressStyle::with_template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} rows ({percent}%)")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        Self {
            bar,
            snapshot_dir,
            gamma,
            snapshot_count: AtomicU32::new(0),
        }
    }
}

impl RenderObserver for Progress {
    fn row_completed(&self, rows_done: u32, _total_rows: u32) {
        self.bar.set_position(rows_done as u64);
    }

    fn snapshot(&self, framebuffer: &Framebuffer, rows_done: u32) {
        let Some(dir) = &self.snapshot_dir else {
            return;
        };
        let index = self.snapshot_count.fetch_add(1, Ordering::Relaxed);
        let path = dir.join(format!("{index:03}.png"));
        // A failed preview must not stop the render
        match save_image(framebuffer, &path, self.gamma) {
            Ok(()) => log::debug!("Snapshot after {} rows: {}", rows_done, path.display()),
            Err(e) => log::warn!("Failed to write snapshot {}: {}", path.display(), e),
        }
    }
}

fn run() -> Result<()> {
    let args = Args::parse(std::env::args().skip(1))?;
    let settings = args.settings()?;

    if args.print_config {
        println!("{}", serde_json::to_string_pretty(&settings)?);
        return Ok(());
    }

    let gamma = args.gamma.unwrap_or(DEFAULT_GAMMA);
    let output_path = args.output.clone().unwrap_or_else(|| PathBuf::from("image.png"));
    if let Some(dir) = &args.snapshots {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create snapshot directory {}", dir.display()))?;
    }

    let progress = Progress::new(settings.image.height, args.snapshots.clone(), gamma);
    let mut output = ImageFile::new(&output_path).with_gamma(gamma);
    render(&settings, &progress, &mut output)?;
    progress.bar.finish();

    log::info!("Saved to {}", output_path.display());
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    log::info!("Starting Sponge renderer");

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            let code = e
                .downcast_ref::<sponge_renderer::RenderError>()
                .map_or(1, |e| e.status_code());
            ExitCode::from(code as u8)
        }
    }
}
