//! Writing framebuffers to disk.
//!
//! LDR formats go through a gamma-corrected 8-bit conversion; `.hdr`
//! files keep the linear float radiance.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use image::codecs::hdr::HdrEncoder;
use image::{ImageFormat, Rgb, RgbImage};
use thiserror::Error;

use crate::framebuffer::Framebuffer;

/// Errors that can occur while writing an image.
#[derive(Error, Debug)]
pub enum ImageIoError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image encoding error: {0}")]
    Encode(#[from] image::ImageError),

    #[error("Framebuffer of {width}x{height} does not match its pixel data")]
    SizeMismatch { width: u32, height: u32 },
}

/// Receiver of the finished framebuffer.
pub trait FrameOutput {
    fn write_frame(&mut self, framebuffer: &Framebuffer) -> Result<(), ImageIoError>;
}

/// Default display gamma for 8-bit output.
pub const DEFAULT_GAMMA: f64 = 2.2;

/// Image file output; the format follows the file extension.
#[derive(Debug, Clone)]
pub struct ImageFile {
    pub path: PathBuf,
    pub gamma: f64,
}

impl ImageFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            gamma: DEFAULT_GAMMA,
        }
    }

    /// Set the display gamma used for 8-bit formats.
    pub fn with_gamma(mut self, gamma: f64) -> Self {
        self.gamma = gamma;
        self
    }
}

impl FrameOutput for ImageFile {
    fn write_frame(&mut self, framebuffer: &Framebuffer) -> Result<(), ImageIoError> {
        save_image(framebuffer, &self.path, self.gamma)
    }
}

/// Save a framebuffer, picking the encoder from the file extension.
pub fn save_image(
    framebuffer: &Framebuffer,
    path: impl AsRef<Path>,
    gamma: f64,
) -> Result<(), ImageIoError> {
    let path = path.as_ref();
    let format = ImageFormat::from_path(path)?;

    if format == ImageFormat::Hdr {
        save_hdr(framebuffer, path)?;
    } else {
        let (width, height) = (framebuffer.width(), framebuffer.height());
        let image = RgbImage::from_raw(width, height, framebuffer.to_rgb8(gamma))
            .ok_or(ImageIoError::SizeMismatch { width, height })?;
        image.save_with_format(path, format)?;
    }

    log::debug!("Wrote {}", path.display());
    Ok(())
}

fn save_hdr(framebuffer: &Framebuffer, path: &Path) -> Result<(), ImageIoError> {
    let pixels: Vec<Rgb<f32>> = framebuffer
        .pixels()
        .iter()
        .map(|c| Rgb([c.x as f32, c.y as f32, c.z as f32]))
        .collect();
    let writer = BufWriter::new(File::create(path)?);
    HdrEncoder::new(writer).encode(
        &pixels,
        framebuffer.width() as usize,
        framebuffer.height() as usize,
    )?;
    Ok(())
}
