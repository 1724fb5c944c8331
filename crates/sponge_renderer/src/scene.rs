//! Renderable scene: a union of implicit surfaces.

use sponge_core::{Material, SceneDescription, SceneObject, SettingsError, Shape};
use sponge_math::DVec3;

use crate::sdf::DistanceField;

/// Scene prepared for tracing.
///
/// Built from a validated [`SceneDescription`] with plane normals
/// normalized once up front.
#[derive(Debug, Clone)]
pub struct Scene {
    objects: Vec<SceneObject>,
}

impl Scene {
    /// Validate the description and prepare it for tracing.
    pub fn new(description: &SceneDescription) -> Result<Self, SettingsError> {
        description.validate()?;
        let objects = description
            .objects
            .iter()
            .map(|object| {
                let shape = match object.shape {
                    Shape::Plane { normal, offset } => Shape::Plane {
                        normal: normal.normalize(),
                        offset,
                    },
                    shape => shape,
                };
                SceneObject::new(shape, object.material)
            })
            .collect();
        Ok(Self { objects })
    }

    /// Number of objects in the scene.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Check if the scene is empty.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Distance to, and material of, the object closest to `p`.
    pub fn nearest(&self, p: DVec3) -> Option<(f64, &Material)> {
        let mut best: Option<(f64, &Material)> = None;
        for object in &self.objects {
            let d = object.shape.distance(p);
            if best.map_or(true, |(closest, _)| d < closest) {
                best = Some((d, &object.material));
            }
        }
        best
    }

    /// Material of the surface nearest to `p`.
    pub fn material_at(&self, p: DVec3) -> Option<&Material> {
        self.nearest(p).map(|(_, material)| material)
    }
}

impl DistanceField for Scene {
    fn distance(&self, p: DVec3) -> f64 {
        self.objects
            .iter()
            .fold(f64::INFINITY, |acc, object| acc.min(object.shape.distance(p)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sponge_core::Color;

    fn two_spheres() -> SceneDescription {
        SceneDescription {
            objects: vec![
                SceneObject::new(
                    Shape::Sphere {
                        center: DVec3::new(-2.0, 0.0, 0.0),
                        radius: 1.0,
                    },
                    Material::diffuse(Color::new(1.0, 0.0, 0.0)),
                ),
                SceneObject::new(
                    Shape::Sphere {
                        center: DVec3::new(2.0, 0.0, 0.0),
                        radius: 1.0,
                    },
                    Material::specular(Color::new(0.0, 0.0, 1.0)),
                ),
            ],
        }
    }

    #[test]
    fn test_union_distance() {
        let scene = Scene::new(&two_spheres()).unwrap();
        assert!((scene.distance(DVec3::ZERO) - 1.0).abs() < 1e-12);
        assert!((scene.distance(DVec3::new(-2.0, 0.0, 0.0)) + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_material_of_nearest_object() {
        let scene = Scene::new(&two_spheres()).unwrap();
        let left = scene.material_at(DVec3::new(-1.0, 0.0, 0.0)).unwrap();
        let right = scene.material_at(DVec3::new(1.5, 0.3, 0.0)).unwrap();
        assert_eq!(left.albedo, Color::new(1.0, 0.0, 0.0));
        assert_eq!(right.albedo, Color::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn test_plane_normal_is_normalized() {
        let description = SceneDescription {
            objects: vec![SceneObject::new(
                Shape::Plane {
                    normal: DVec3::new(0.0, 5.0, 0.0),
                    offset: 1.0,
                },
                Material::default(),
            )],
        };
        let scene = Scene::new(&description).unwrap();
        assert!((scene.distance(DVec3::new(0.0, 4.0, 0.0)) - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_empty_scene() {
        let scene = Scene::new(&SceneDescription { objects: Vec::new() }).unwrap();
        assert!(scene.is_empty());
        assert_eq!(scene.distance(DVec3::ZERO), f64::INFINITY);
        assert!(scene.nearest(DVec3::ZERO).is_none());
    }

    #[test]
    fn test_invalid_description_rejected() {
        let mut description = two_spheres();
        description.objects[0].shape = Shape::Sphere {
            center: DVec3::ZERO,
            radius: -1.0,
        };
        assert!(Scene::new(&description).is_err());
    }
}
