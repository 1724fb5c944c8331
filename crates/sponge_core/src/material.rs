//! Surface materials.
//!
//! Materials are plain data: an emission color, an albedo and a
//! reflection kind. The integrator dispatches on [`ReflectionKind`] with an
//! exhaustive `match`.

use serde::{Deserialize, Serialize};
use sponge_math::DVec3;

use crate::settings::SettingsError;

/// Color type alias (linear RGB radiance or reflectance, non-negative)
pub type Color = DVec3;

/// How a surface scatters incoming light.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReflectionKind {
    /// Lambertian reflection, sampled over a cosine-weighted hemisphere
    Diffuse,
    /// Perfect mirror
    Specular,
    /// Smooth dielectric with Fresnel-weighted reflection and transmission
    Refractive,
}

/// A material definition attached to every surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Material {
    /// Emitted radiance (zero for non-emitters)
    #[serde(default = "zero_color")]
    pub emission: Color,

    /// Reflectance per channel (0-1)
    pub albedo: Color,

    /// Scattering model
    pub kind: ReflectionKind,
}

fn zero_color() -> Color {
    Color::ZERO
}

impl Material {
    /// Create a non-emissive diffuse material.
    pub fn diffuse(albedo: Color) -> Self {
        Self {
            emission: Color::ZERO,
            albedo,
            kind: ReflectionKind::Diffuse,
        }
    }

    /// Create a non-emissive mirror material.
    pub fn specular(albedo: Color) -> Self {
        Self {
            emission: Color::ZERO,
            albedo,
            kind: ReflectionKind::Specular,
        }
    }

    /// Create a non-emissive glass-like material.
    pub fn refractive(albedo: Color) -> Self {
        Self {
            emission: Color::ZERO,
            albedo,
            kind: ReflectionKind::Refractive,
        }
    }

    /// Create a black diffuse emitter.
    pub fn light(emission: Color) -> Self {
        Self {
            emission,
            albedo: Color::ZERO,
            kind: ReflectionKind::Diffuse,
        }
    }

    /// Replace the emission color.
    pub fn with_emission(mut self, emission: Color) -> Self {
        self.emission = emission;
        self
    }

    /// Check that emission and albedo are finite and non-negative.
    pub fn validate(&self) -> Result<(), SettingsError> {
        for (name, color) in [("emission", self.emission), ("albedo", self.albedo)] {
            if !color.is_finite() || color.min_element() < 0.0 {
                return Err(SettingsError::Invalid(format!(
                    "material {name} must be finite and non-negative, got {color:?}"
                )));
            }
        }
        Ok(())
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::diffuse(Color::splat(0.75))
    }
}
