//! Render configuration.
//!
//! Every setting has a default so a JSON file only needs to name what it
//! changes. The renderer receives a validated, immutable [`RenderSettings`]
//! at call time; nothing here is global.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::camera::CameraConfig;
use crate::material::Color;
use crate::scene::SceneDescription;

/// Errors from loading or validating settings.
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Invalid setting: {0}")]
    Invalid(String),

    #[error("Unknown camera preset: {0}")]
    UnknownPreset(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type SettingsResult<T> = Result<T, SettingsError>;

/// Image resolution and sampling density.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageSettings {
    pub width: u32,
    pub height: u32,
    /// Monte Carlo draws per sub-pixel
    pub samples: u32,
    /// Sub-pixel grid is `supersamples x supersamples`
    pub supersamples: u32,
}

impl ImageSettings {
    /// Total radiance estimates averaged into one pixel.
    pub fn samples_per_pixel(&self) -> u64 {
        self.samples as u64 * self.supersamples as u64 * self.supersamples as u64
    }
}

impl Default for ImageSettings {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            samples: 4,
            supersamples: 2,
        }
    }
}

/// Sphere-tracing constants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarchSettings {
    /// Iteration cap per ray
    pub max_steps: u32,
    /// Rays travelling further than this are misses
    pub max_distance: f64,
    /// A sample closer than this to the surface is a hit
    pub hit_epsilon: f64,
    /// Damping applied to each step (0 < step_scale <= 1)
    pub step_scale: f64,
    /// Half-width of the central difference used for normals
    pub normal_epsilon: f64,
}

impl Default for MarchSettings {
    fn default() -> Self {
        Self {
            max_steps: 512,
            max_distance: 1000.0,
            hit_epsilon: 1e-3,
            step_scale: 0.9,
            normal_epsilon: 1e-3,
        }
    }
}

/// Path integrator constants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntegratorSettings {
    /// Radiance returned by rays that leave the scene
    pub background: Color,
    /// Depth from which Russian roulette is applied
    pub roulette_depth: u32,
    /// Paths are cut unconditionally at this depth
    pub max_depth: u32,
    /// Index of refraction of refractive materials
    pub ior: f64,
    /// Distance continuation rays are pushed off the surface
    pub surface_offset: f64,
}

impl Default for IntegratorSettings {
    fn default() -> Self {
        Self {
            background: Color::ZERO,
            roulette_depth: 5,
            max_depth: 64,
            ior: 1.5,
            surface_offset: 1e-2,
        }
    }
}

/// Everything a render needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    pub image: ImageSettings,
    pub camera: CameraConfig,
    pub scene: SceneDescription,
    pub march: MarchSettings,
    pub integrator: IntegratorSettings,
    /// Worker threads (0 = one per available core)
    pub threads: usize,
    /// Rows between preview snapshots (0 disables, unset = height / 64)
    pub progress_interval: Option<u32>,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            image: ImageSettings::default(),
            camera: CameraConfig::default(),
            scene: SceneDescription::default(),
            march: MarchSettings::default(),
            integrator: IntegratorSettings::default(),
            threads: 0,
            progress_interval: None,
        }
    }
}

impl RenderSettings {
    /// Load settings from a JSON file. Missing fields take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> SettingsResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let settings: RenderSettings = serde_json::from_str(&text)?;
        log::info!("Loaded render settings from {}", path.display());
        Ok(settings)
    }

    /// Rows between preview snapshots; 0 means no snapshots.
    pub fn snapshot_interval(&self) -> u32 {
        self.progress_interval.unwrap_or(self.image.height / 64)
    }

    /// Check every section.
    pub fn validate(&self) -> SettingsResult<()> {
        let image = &self.image;
        if image.width == 0 || image.height == 0 {
            return Err(SettingsError::Invalid(format!(
                "image size must be non-zero, got {}x{}",
                image.width, image.height
            )));
        }
        if image.samples == 0 || image.supersamples == 0 {
            return Err(SettingsError::Invalid(format!(
                "samples and supersamples must be non-zero, got {} / {}",
                image.samples, image.supersamples
            )));
        }

        let march = &self.march;
        if march.max_steps == 0 {
            return Err(SettingsError::Invalid("march max_steps must be non-zero".into()));
        }
        if !(march.hit_epsilon > 0.0 && march.normal_epsilon > 0.0 && march.max_distance > 0.0) {
            return Err(SettingsError::Invalid(
                "march epsilons and max_distance must be positive".into(),
            ));
        }
        if !(march.step_scale > 0.0 && march.step_scale <= 1.0) {
            return Err(SettingsError::Invalid(format!(
                "march step_scale must be in (0, 1], got {}",
                march.step_scale
            )));
        }

        let integrator = &self.integrator;
        if !(integrator.ior > 0.0 && integrator.ior.is_finite()) {
            return Err(SettingsError::Invalid(format!(
                "index of refraction must be positive, got {}",
                integrator.ior
            )));
        }
        if !integrator.background.is_finite() || integrator.background.min_element() < 0.0 {
            return Err(SettingsError::Invalid(
                "background must be finite and non-negative".into(),
            ));
        }
        if integrator.surface_offset <= march.hit_epsilon {
            return Err(SettingsError::Invalid(format!(
                "surface_offset ({}) must exceed hit_epsilon ({}) or bounces re-hit their origin",
                integrator.surface_offset, march.hit_epsilon
            )));
        }
        if integrator.roulette_depth > integrator.max_depth {
            log::warn!(
                "roulette_depth {} exceeds max_depth {}; paths are cut without roulette",
                integrator.roulette_depth,
                integrator.max_depth
            );
        }

        self.camera.validate()?;
        self.scene.validate()
    }
}
