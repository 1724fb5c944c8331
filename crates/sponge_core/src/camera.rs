//! Pinhole camera configuration.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sponge_math::DVec3;

use crate::settings::SettingsError;

/// Camera placement and screen geometry, in world units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Eye position
    pub position: DVec3,
    /// Viewing direction (normalized when the camera is built)
    pub direction: DVec3,
    /// Approximate up vector
    pub up: DVec3,
    /// Height of the virtual screen; its width follows the image aspect
    pub screen_height: f64,
    /// Distance from the eye to the virtual screen
    pub screen_distance: f64,
}

impl CameraConfig {
    /// Check the screen geometry. Basis degeneracy is detected when the
    /// renderer builds the camera.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if !(self.position.is_finite() && self.direction.is_finite() && self.up.is_finite()) {
            return Err(SettingsError::Invalid("camera vectors must be finite".into()));
        }
        if !(self.screen_height > 0.0 && self.screen_distance > 0.0) {
            return Err(SettingsError::Invalid(format!(
                "camera screen height and distance must be positive, got {} / {}",
                self.screen_height, self.screen_distance
            )));
        }
        Ok(())
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        CameraPreset::Overview.config()
    }
}

/// Named viewpoints onto the default sponge scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraPreset {
    /// Whole sponge, seen from the front
    Overview,
    /// Looking down into the sponge's cavities
    Interior,
    /// Three-quarter view from above
    Oblique,
}

impl CameraPreset {
    pub const ALL: [CameraPreset; 3] = [
        CameraPreset::Overview,
        CameraPreset::Interior,
        CameraPreset::Oblique,
    ];

    /// Build the camera configuration for this preset.
    pub fn config(self) -> CameraConfig {
        let (position, direction, up) = match self {
            CameraPreset::Overview => (
                DVec3::new(50.0, 52.0, 220.0),
                DVec3::new(0.0, -0.04, -1.0),
                DVec3::Y,
            ),
            CameraPreset::Interior => (
                DVec3::new(50.0, 60.0, 80.0),
                DVec3::new(-0.1, -1.0, -0.01),
                DVec3::NEG_Y,
            ),
            CameraPreset::Oblique => (
                DVec3::new(90.0, 78.0, 130.0),
                DVec3::new(-0.4, -0.5, -0.5),
                DVec3::Y,
            ),
        };
        CameraConfig {
            position,
            direction,
            up,
            screen_height: 30.0,
            screen_distance: 40.0,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            CameraPreset::Overview => "overview",
            CameraPreset::Interior => "interior",
            CameraPreset::Oblique => "oblique",
        }
    }
}

impl fmt::Display for CameraPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CameraPreset {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|preset| preset.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| SettingsError::UnknownPreset(s.to_string()))
    }
}
