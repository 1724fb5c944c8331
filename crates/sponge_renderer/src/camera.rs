//! Pinhole camera for ray generation.

use sponge_core::CameraConfig;
use sponge_math::{DVec3, Ray};

use crate::renderer::RenderError;

/// Camera with its screen basis derived once per render.
#[derive(Debug, Clone, Copy)]
pub struct Camera {
    position: DVec3,
    /// Spans the full screen width, pointing right
    screen_x: DVec3,
    /// Spans the full screen height, pointing up
    screen_y: DVec3,
    screen_center: DVec3,
    inv_width: f64,
    inv_height: f64,
}

impl Camera {
    /// Build the screen basis for an image of `width` x `height` pixels.
    pub fn new(config: &CameraConfig, width: u32, height: u32) -> Result<Self, RenderError> {
        let degenerate = || RenderError::DegenerateCamera {
            direction: config.direction,
            up: config.up,
        };

        let direction = config.direction.try_normalize().ok_or_else(degenerate)?;
        let right = direction.cross(config.up).try_normalize().ok_or_else(degenerate)?;
        let up = right.cross(direction).try_normalize().ok_or_else(degenerate)?;

        let screen_width = config.screen_height * width as f64 / height as f64;
        Ok(Self {
            position: config.position,
            screen_x: right * screen_width,
            screen_y: up * config.screen_height,
            screen_center: config.position + direction * config.screen_distance,
            inv_width: 1.0 / width as f64,
            inv_height: 1.0 / height as f64,
        })
    }

    pub fn position(&self) -> DVec3 {
        self.position
    }

    /// Generate the ray through continuous image coordinates `(u, v)`.
    ///
    /// `u` runs 0..width left to right, `v` runs 0..height bottom to top.
    pub fn ray(&self, u: f64, v: f64) -> Option<Ray> {
        let screen_position = self.screen_center
            + self.screen_x * (u * self.inv_width - 0.5)
            + self.screen_y * (v * self.inv_height - 0.5);
        Ray::towards(self.position, screen_position - self.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sponge_core::CameraPreset;

    #[test]
    fn test_center_ray_follows_view_direction() {
        let config = CameraPreset::Overview.config();
        let camera = Camera::new(&config, 640, 480).unwrap();
        let ray = camera.ray(320.0, 240.0).unwrap();
        assert!((ray.direction() - config.direction.normalize()).length() < 1e-12);
        assert_eq!(ray.origin(), config.position);
    }

    #[test]
    fn test_screen_basis_is_orthogonal() {
        for preset in CameraPreset::ALL {
            let camera = Camera::new(&preset.config(), 300, 200).unwrap();
            assert!(camera.screen_x.dot(camera.screen_y).abs() < 1e-9);
            assert!((camera.screen_x.length() - 45.0).abs() < 1e-9);
            assert!((camera.screen_y.length() - 30.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_image_axes() {
        let config = CameraConfig {
            position: DVec3::ZERO,
            direction: DVec3::NEG_Z,
            up: DVec3::Y,
            screen_height: 2.0,
            screen_distance: 1.0,
        };
        let camera = Camera::new(&config, 10, 10).unwrap();

        let top = camera.ray(5.0, 10.0).unwrap();
        let bottom = camera.ray(5.0, 0.0).unwrap();
        let right = camera.ray(10.0, 5.0).unwrap();
        assert!(top.direction().y > 0.0);
        assert!(bottom.direction().y < 0.0);
        assert!(right.direction().x > 0.0);
        // Screen half-height equals the screen distance: 45 degrees
        assert!((top.direction().y - top.direction().z.abs()).abs() < 1e-12);
    }

    #[test]
    fn test_degenerate_basis_rejected() {
        let config = CameraConfig {
            direction: DVec3::Y,
            up: DVec3::Y,
            ..CameraConfig::default()
        };
        assert!(matches!(
            Camera::new(&config, 4, 4),
            Err(RenderError::DegenerateCamera { .. })
        ));

        let zero = CameraConfig {
            direction: DVec3::ZERO,
            ..CameraConfig::default()
        };
        assert!(Camera::new(&zero, 4, 4).is_err());
    }
}
