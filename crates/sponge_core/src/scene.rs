//! Scene description types.
//!
//! A scene is a flat list of implicit surfaces. Each object pairs a
//! [`Shape`] (evaluated as a distance field by the renderer) with a
//! [`Material`]. Objects combine by union.

use serde::{Deserialize, Serialize};
use sponge_math::DVec3;

use crate::material::{Color, Material, ReflectionKind};
use crate::settings::SettingsError;

/// An implicit primitive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Shape {
    /// Four-octave Menger sponge occupying a cube of side `0.6 * scale`
    /// centered at `center`.
    MengerSponge { center: DVec3, scale: f64 },

    /// Sphere of `radius` around `center`.
    Sphere { center: DVec3, radius: f64 },

    /// Half-space boundary `dot(p, normal) = offset`; the solid side is
    /// where the dot product is below `offset`.
    Plane { normal: DVec3, offset: f64 },
}

impl Shape {
    /// Check the shape parameters.
    pub fn validate(&self) -> Result<(), SettingsError> {
        match *self {
            Shape::MengerSponge { center, scale } => {
                if !center.is_finite() || !(scale > 0.0 && scale.is_finite()) {
                    return Err(SettingsError::Invalid(format!(
                        "menger sponge needs a finite center and positive scale, got {center:?} / {scale}"
                    )));
                }
            }
            Shape::Sphere { center, radius } => {
                if !center.is_finite() || !(radius > 0.0 && radius.is_finite()) {
                    return Err(SettingsError::Invalid(format!(
                        "sphere needs a finite center and positive radius, got {center:?} / {radius}"
                    )));
                }
            }
            Shape::Plane { normal, offset } => {
                if normal.try_normalize().is_none() || !offset.is_finite() {
                    return Err(SettingsError::Invalid(format!(
                        "plane needs a non-zero normal and finite offset, got {normal:?} / {offset}"
                    )));
                }
            }
        }
        Ok(())
    }

    /// Whether the distance field is signed, with a bounded interior that
    /// a transmitted ray can travel through. The sponge is zero throughout
    /// its solid and the plane has no far side.
    pub fn has_interior(&self) -> bool {
        matches!(self, Shape::Sphere { .. })
    }
}

/// A surface in the scene.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SceneObject {
    pub shape: Shape,
    pub material: Material,
}

impl SceneObject {
    pub fn new(shape: Shape, material: Material) -> Self {
        Self { shape, material }
    }
}

/// Complete scene: a list of objects combined by union.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneDescription {
    pub objects: Vec<SceneObject>,
}

impl SceneDescription {
    /// Center of the sponge in the default scene.
    pub const SPONGE_CENTER: DVec3 = DVec3::new(50.0, 30.0, 100.0);

    /// World units per fractal unit in the default scene.
    pub const SPONGE_SCALE: f64 = 50.0;

    /// The sponge alone, with a diffuse grey material.
    pub fn menger_only() -> Self {
        Self {
            objects: vec![SceneObject::new(
                Shape::MengerSponge {
                    center: Self::SPONGE_CENTER,
                    scale: Self::SPONGE_SCALE,
                },
                Material::diffuse(Color::splat(0.75)),
            )],
        }
    }

    /// The default scene: the sponge on a floor, lit by a spherical lamp.
    pub fn menger_on_floor() -> Self {
        let mut scene = Self::menger_only();
        scene.objects.push(SceneObject::new(
            Shape::Plane {
                normal: DVec3::Y,
                offset: 0.0,
            },
            Material::diffuse(Color::new(0.6, 0.55, 0.5)),
        ));
        scene.objects.push(SceneObject::new(
            Shape::Sphere {
                center: DVec3::new(50.0, 100.0, 100.0),
                radius: 15.0,
            },
            Material::light(Color::splat(36.0)),
        ));
        scene
    }

    /// Number of objects in the scene.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Check if the scene is empty.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Indices of refractive objects whose shape has no interior to
    /// refract into.
    pub fn refractive_without_interior(&self) -> Vec<usize> {
        self.objects
            .iter()
            .enumerate()
            .filter(|(_, object)| {
                object.material.kind == ReflectionKind::Refractive && !object.shape.has_interior()
            })
            .map(|(index, _)| index)
            .collect()
    }

    /// Validate every object.
    pub fn validate(&self) -> Result<(), SettingsError> {
        for (index, object) in self.objects.iter().enumerate() {
            object
                .shape
                .validate()
                .and_then(|_| object.material.validate())
                .map_err(|e| SettingsError::Invalid(format!("scene object {index}: {e}")))?;
        }
        if self.objects.is_empty() {
            log::warn!("Scene has no objects; every ray will miss");
        }
        for index in self.refractive_without_interior() {
            log::warn!(
                "Scene object {index} is refractive but its shape has no interior; \
                 transmitted rays will stall on the surface until max depth"
            );
        }
        Ok(())
    }
}

impl Default for SceneDescription {
    fn default() -> Self {
        Self::menger_on_floor()
    }
}
