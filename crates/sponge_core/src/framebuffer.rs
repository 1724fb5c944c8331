//! Linear radiance framebuffer.

use std::collections::TryReserveError;

use crate::material::Color;

/// Width x height array of linear colors, row-major, top row first.
#[derive(Debug, Clone, PartialEq)]
pub struct Framebuffer {
    width: u32,
    height: u32,
    pixels: Vec<Color>,
}

impl Framebuffer {
    /// Allocate a black framebuffer, reporting allocation failure instead
    /// of aborting.
    pub fn try_new(width: u32, height: u32) -> Result<Self, TryReserveError> {
        let mut pixels = Vec::new();
        // An overflowing pixel count asks for usize::MAX, which fails the
        // reservation with a capacity overflow
        let len = (width as usize)
            .checked_mul(height as usize)
            .unwrap_or(usize::MAX);
        pixels.try_reserve_exact(len)?;
        pixels.resize(len, Color::ZERO);
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// All pixels, row-major.
    pub fn pixels(&self) -> &[Color] {
        &self.pixels
    }

    /// Get the pixel at (x, y).
    pub fn get(&self, x: u32, y: u32) -> Color {
        self.pixels[self.index(x, y)]
    }

    /// Set the pixel at (x, y).
    pub fn set(&mut self, x: u32, y: u32, color: Color) {
        let index = self.index(x, y);
        self.pixels[index] = color;
    }

    /// Pixels of image row `y`.
    pub fn row(&self, y: u32) -> &[Color] {
        let start = self.index(0, y);
        &self.pixels[start..start + self.width as usize]
    }

    /// Mutable pixels of image row `y`.
    pub fn row_mut(&mut self, y: u32) -> &mut [Color] {
        let start = self.index(0, y);
        &mut self.pixels[start..start + self.width as usize]
    }

    /// Convert to gamma-corrected 8-bit RGB bytes.
    pub fn to_rgb8(&self, gamma: f64) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.pixels.len() * 3);
        for color in &self.pixels {
            bytes.extend_from_slice(&color_to_rgb8(*color, gamma));
        }
        bytes
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        debug_assert!(x < self.width && y < self.height);
        y as usize * self.width as usize + x as usize
    }
}

/// Clamp to [0, 1], apply `1/gamma` and quantize with rounding.
#[inline]
pub fn to_byte(linear: f64, gamma: f64) -> u8 {
    let clamped = if linear.is_nan() { 0.0 } else { linear.clamp(0.0, 1.0) };
    (clamped.powf(1.0 / gamma) * 255.0 + 0.5) as u8
}

/// Convert a linear color to 8-bit RGB.
pub fn color_to_rgb8(color: Color, gamma: f64) -> [u8; 3] {
    [
        to_byte(color.x, gamma),
        to_byte(color.y, gamma),
        to_byte(color.z, gamma),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_is_black() {
        let fb = Framebuffer::try_new(4, 3).unwrap();
        assert_eq!(fb.pixels().len(), 12);
        assert!(fb.pixels().iter().all(|c| *c == Color::ZERO));
    }

    #[test]
    fn test_row_access() {
        let mut fb = Framebuffer::try_new(3, 2).unwrap();
        fb.row_mut(1)[2] = Color::ONE;
        assert_eq!(fb.get(2, 1), Color::ONE);
        assert_eq!(fb.row(1)[2], Color::ONE);
        assert_eq!(fb.pixels()[5], Color::ONE);
    }

    #[test]
    fn test_to_byte() {
        assert_eq!(to_byte(0.0, 2.2), 0);
        assert_eq!(to_byte(1.0, 2.2), 255);
        assert_eq!(to_byte(7.5, 2.2), 255);
        assert_eq!(to_byte(-1.0, 2.2), 0);
        assert_eq!(to_byte(f64::NAN, 2.2), 0);
        assert_eq!(to_byte(0.25, 2.0), 128);
    }

    #[test]
    fn test_to_rgb8_layout() {
        let mut fb = Framebuffer::try_new(2, 1).unwrap();
        fb.set(1, 0, Color::new(1.0, 0.0, 1.0));
        assert_eq!(fb.to_rgb8(2.2), vec![0, 0, 0, 255, 0, 255]);
    }
}
