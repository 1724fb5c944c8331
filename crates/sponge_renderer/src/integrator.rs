//! Monte Carlo path integrator.
//!
//! Estimates incoming radiance along a ray with an explicit bounce loop
//! carrying the path throughput:
//! - Cosine-weighted sampling for diffuse surfaces
//! - Mirror reflection for specular surfaces
//! - Fresnel-weighted reflection or transmission for refractive surfaces
//! - Russian roulette on albedo luminance past a configurable depth

use std::f64::consts::PI;

use rand::RngCore;
use sponge_core::{Color, IntegratorSettings, MarchSettings, Material, ReflectionKind};
use sponge_math::{DVec3, Onb, Ray};

use crate::gen_f64;
use crate::march::{MarchResult, Raymarcher};
use crate::scene::Scene;

/// Radiance estimator consumed by the render driver.
pub trait Integrator: Send + Sync {
    /// Estimate radiance arriving along `ray`, for a path already `depth`
    /// bounces long.
    fn estimate_radiance(&self, ray: &Ray, rng: &mut dyn RngCore, depth: u32) -> Color;
}

/// Unidirectional path tracer over a [`Scene`].
pub struct PathIntegrator {
    scene: Scene,
    marcher: Raymarcher,
    settings: IntegratorSettings,
}

impl PathIntegrator {
    pub fn new(scene: Scene, march: MarchSettings, settings: IntegratorSettings) -> Self {
        Self {
            scene,
            marcher: Raymarcher::new(march),
            settings,
        }
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn settings(&self) -> &IntegratorSettings {
        &self.settings
    }

    /// Pick the continuation ray at a hit and return it with the extra
    /// throughput factor beyond the albedo.
    fn scatter(
        &self,
        material: &Material,
        incoming: DVec3,
        point: DVec3,
        normal: DVec3,
        rng: &mut dyn RngCore,
    ) -> (Ray, f64) {
        // Normal on the side the ray arrives from
        let orienting = if normal.dot(incoming) < 0.0 { normal } else { -normal };
        let offset = self.settings.surface_offset;

        match material.kind {
            ReflectionKind::Diffuse => {
                let direction = sample_cosine_hemisphere(orienting, rng);
                (Ray::new(point + orienting * offset, direction), 1.0)
            }
            ReflectionKind::Specular => {
                let direction = reflect(incoming, orienting);
                (Ray::new(point + orienting * offset, direction), 1.0)
            }
            ReflectionKind::Refractive => {
                self.scatter_refractive(incoming, point, normal, orienting, rng)
            }
        }
    }

    fn scatter_refractive(
        &self,
        incoming: DVec3,
        point: DVec3,
        normal: DVec3,
        orienting: DVec3,
        rng: &mut dyn RngCore,
    ) -> (Ray, f64) {
        let offset = self.settings.surface_offset;
        let reflection = Ray::new(point + orienting * offset, reflect(incoming, orienting));

        let entering = normal.dot(orienting) > 0.0;
        let (n_outside, n_inside) = (1.0, self.settings.ior);
        let ratio = if entering {
            n_outside / n_inside
        } else {
            n_inside / n_outside
        };
        let cos_incident = incoming.dot(orienting);
        let cos2_transmitted = 1.0 - ratio * ratio * (1.0 - cos_incident * cos_incident);

        // Total internal reflection
        if cos2_transmitted < 0.0 {
            return (reflection, 1.0);
        }

        let Some(transmitted) = (incoming * ratio
            - orienting * (cos_incident * ratio + cos2_transmitted.sqrt()))
        .try_normalize() else {
            return (reflection, 1.0);
        };

        // Schlick's approximation
        let r0 = ((n_inside - n_outside) / (n_inside + n_outside)).powi(2);
        let c = 1.0
            - if entering {
                -cos_incident
            } else {
                transmitted.dot(-orienting)
            };
        let reflectance = r0 + (1.0 - r0) * c.powi(5);
        let transmittance = (1.0 - reflectance) * ratio * ratio;

        let reflect_probability = 0.25 + 0.5 * reflectance;
        if gen_f64(rng) < reflect_probability {
            (reflection, reflectance / reflect_probability)
        } else {
            (
                Ray::new(point - orienting * offset, transmitted),
                transmittance / (1.0 - reflect_probability),
            )
        }
    }
}

impl Integrator for PathIntegrator {
    fn estimate_radiance(&self, ray: &Ray, rng: &mut dyn RngCore, depth: u32) -> Color {
        let mut radiance = Color::ZERO;
        let mut throughput = Color::ONE;
        let mut ray = *ray;
        let mut depth = depth;

        loop {
            let hit = match self.marcher.march(&self.scene, &ray) {
                MarchResult::Hit(hit) => hit,
                MarchResult::Miss => {
                    radiance += throughput * self.settings.background;
                    break;
                }
            };
            let Some(material) = self.scene.material_at(hit.point) else {
                break;
            };
            radiance += throughput * material.emission;

            if depth >= self.settings.max_depth {
                break;
            }

            let mut survival = 1.0;
            if depth >= self.settings.roulette_depth {
                survival = luminance(material.albedo).clamp(0.0, 1.0);
                if survival <= 0.0 || gen_f64(rng) >= survival {
                    break;
                }
            }

            // A vanished gradient leaves the surface facing the viewer
            let normal = self
                .marcher
                .normal(&self.scene, hit.point)
                .unwrap_or(-ray.direction());

            let (next, weight) = self.scatter(material, ray.direction(), hit.point, normal, rng);
            throughput *= material.albedo * (weight / survival);
            if throughput == Color::ZERO {
                break;
            }

            ray = next;
            depth += 1;
        }

        radiance
    }
}

/// Rec. 709 luminance.
#[inline]
pub fn luminance(color: Color) -> f64 {
    0.2126 * color.x + 0.7152 * color.y + 0.0722 * color.z
}

/// Reflect a vector about a normal.
#[inline]
pub fn reflect(v: DVec3, n: DVec3) -> DVec3 {
    v - 2.0 * v.dot(n) * n
}

/// Cosine-weighted direction in the hemisphere around `normal`.
///
/// The pdf is `cos(theta) / pi`, which cancels the cosine term of the
/// rendering equation for Lambertian surfaces.
pub fn sample_cosine_hemisphere(normal: DVec3, rng: &mut dyn RngCore) -> DVec3 {
    let phi = 2.0 * PI * gen_f64(rng);
    let r2 = gen_f64(rng);
    let r = r2.sqrt();
    Onb::from_w(normal).local(phi.cos() * r, phi.sin() * r, (1.0 - r2).sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use sponge_core::{CameraConfig, SceneDescription, SceneObject, Shape};

    fn integrator(description: SceneDescription, background: Color) -> PathIntegrator {
        let settings = IntegratorSettings {
            background,
            ..IntegratorSettings::default()
        };
        PathIntegrator::new(
            Scene::new(&description).unwrap(),
            MarchSettings::default(),
            settings,
        )
    }

    fn single(shape: Shape, material: Material) -> SceneDescription {
        SceneDescription {
            objects: vec![SceneObject::new(shape, material)],
        }
    }

    fn unit_sphere() -> Shape {
        Shape::Sphere {
            center: DVec3::ZERO,
            radius: 1.0,
        }
    }

    /// Ray from the default eye towards a solid patch of the front face.
    fn sponge_ray() -> Ray {
        let camera = CameraConfig::default();
        let target = SceneDescription::SPONGE_CENTER + DVec3::new(14.8, 14.8, 15.0);
        Ray::towards(camera.position, target - camera.position).unwrap()
    }

    #[test]
    fn test_miss_returns_background() {
        let background = Color::new(0.1, 0.2, 0.3);
        let integrator = integrator(SceneDescription::menger_only(), background);
        let ray = Ray::new(DVec3::new(50.0, 52.0, 220.0), DVec3::Z);
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(integrator.estimate_radiance(&ray, &mut rng, 0), background);
    }

    #[test]
    fn test_emitter_returns_emission() {
        let emission = Color::new(4.0, 2.0, 1.0);
        let integrator = integrator(single(unit_sphere(), Material::light(emission)), Color::ONE);
        let ray = Ray::new(DVec3::new(0.0, 0.0, -5.0), DVec3::Z);
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(integrator.estimate_radiance(&ray, &mut rng, 0), emission);
    }

    #[test]
    fn test_mirror_reflects_background() {
        let plane = Shape::Plane {
            normal: DVec3::Y,
            offset: 0.0,
        };
        let integrator = integrator(single(plane, Material::specular(Color::splat(0.5))), Color::ONE);
        let ray = Ray::towards(DVec3::new(0.0, 5.0, 0.0), DVec3::new(1.0, -1.0, 0.0)).unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        let color = integrator.estimate_radiance(&ray, &mut rng, 0);
        assert!((color - Color::splat(0.5)).length() < 1e-12);
    }

    #[test]
    fn test_deterministic_for_fixed_seed() {
        let integrator = integrator(SceneDescription::menger_only(), Color::new(0.9, 0.8, 0.7));
        let ray = sponge_ray();

        let run = |seed: u64| {
            let mut rng = StdRng::seed_from_u64(seed);
            (0..16)
                .map(|_| integrator.estimate_radiance(&ray, &mut rng, 0))
                .collect::<Vec<_>>()
        };

        let first = run(7);
        let second = run(7);
        for (a, b) in first.iter().zip(&second) {
            assert_eq!(a.to_array().map(f64::to_bits), b.to_array().map(f64::to_bits));
        }
    }

    #[test]
    fn test_diffuse_does_not_amplify_energy() {
        let mut scene = SceneDescription::menger_only();
        scene.objects[0].material = Material::diffuse(Color::splat(0.5));
        let integrator = integrator(scene, Color::ONE);
        let ray = sponge_ray();
        let mut rng = StdRng::seed_from_u64(11);

        let mut total = Color::ZERO;
        let count = 256;
        for _ in 0..count {
            let sample = integrator.estimate_radiance(&ray, &mut rng, 0);
            assert!(sample.max_element() <= 1.0 + 1e-12, "{sample:?}");
            assert!(sample.min_element() >= 0.0);
            total += sample;
        }
        assert!((total / count as f64).max_element() <= 1.0);
    }

    #[test]
    fn test_black_surface_terminates_at_roulette_depth() {
        let integrator = integrator(
            single(unit_sphere(), Material::diffuse(Color::ZERO)),
            Color::ONE,
        );
        let ray = Ray::new(DVec3::new(0.0, 0.0, -5.0), DVec3::Z);
        let mut rng = StdRng::seed_from_u64(5);
        let depth = integrator.settings().roulette_depth;
        assert_eq!(integrator.estimate_radiance(&ray, &mut rng, depth), Color::ZERO);
    }

    #[test]
    fn test_max_depth_returns_emission_only() {
        let emission = Color::splat(0.25);
        let material = Material::diffuse(Color::ONE).with_emission(emission);
        let integrator = integrator(single(unit_sphere(), material), Color::splat(100.0));
        let ray = Ray::new(DVec3::new(0.0, 0.0, -5.0), DVec3::Z);
        let mut rng = StdRng::seed_from_u64(5);
        let depth = integrator.settings().max_depth;
        assert_eq!(integrator.estimate_radiance(&ray, &mut rng, depth), emission);
    }

    #[test]
    fn test_glass_sphere_is_roughly_energy_conserving() {
        let integrator = integrator(
            single(unit_sphere(), Material::refractive(Color::ONE)),
            Color::ONE,
        );
        let ray = Ray::new(DVec3::new(0.0, 0.2, -5.0), DVec3::Z);
        let mut rng = StdRng::seed_from_u64(99);

        let count = 4000;
        let mut total = 0.0;
        for _ in 0..count {
            let sample = integrator.estimate_radiance(&ray, &mut rng, 0);
            assert!(sample.is_finite());
            assert!(sample.min_element() >= 0.0);
            total += sample.x;
        }
        let mean = total / count as f64;
        assert!(mean > 0.8 && mean < 1.2, "mean = {mean}");
    }

    #[test]
    fn test_total_internal_reflection_mirrors_inside() {
        let integrator = integrator(
            single(unit_sphere(), Material::refractive(Color::ONE)),
            Color::ZERO,
        );
        // Leaving the sphere at a grazing angle from inside
        let incoming = DVec3::new(0.9, 1.0, 0.0).normalize();
        let (point, normal) = (DVec3::X, DVec3::X);
        let orienting = -normal;
        let mut rng = StdRng::seed_from_u64(17);

        for _ in 0..32 {
            let (ray, weight) =
                integrator.scatter_refractive(incoming, point, normal, orienting, &mut rng);
            assert_eq!(weight, 1.0);
            assert!((ray.direction() - reflect(incoming, orienting)).length() < 1e-12);
            assert!(ray.direction().x < 0.0);
            assert!((ray.origin() - DVec3::new(0.99, 0.0, 0.0)).length() < 1e-12);
        }
    }

    #[test]
    fn test_normal_incidence_fresnel_weights() {
        let integrator = integrator(
            single(unit_sphere(), Material::refractive(Color::ONE)),
            Color::ZERO,
        );
        let ior = integrator.settings().ior;
        let offset = integrator.settings().surface_offset;
        let (point, normal) = (DVec3::X, DVec3::X);
        let incoming = -DVec3::X;

        let ratio = 1.0 / ior;
        let reflectance = ((ior - 1.0) / (ior + 1.0)).powi(2);
        let reflect_probability = 0.25 + 0.5 * reflectance;
        let transmit_weight = (1.0 - reflectance) * ratio * ratio / (1.0 - reflect_probability);
        let reflect_weight = reflectance / reflect_probability;

        let mut rng = StdRng::seed_from_u64(23);
        let (mut transmitted, mut reflected) = (0, 0);
        for _ in 0..64 {
            let (ray, weight) =
                integrator.scatter_refractive(incoming, point, normal, normal, &mut rng);
            if ray.direction().x < 0.0 {
                transmitted += 1;
                assert!((ray.direction() - incoming).length() < 1e-12);
                assert!((ray.origin() - (point - normal * offset)).length() < 1e-12);
                assert!((weight - transmit_weight).abs() < 1e-12, "{weight}");
            } else {
                reflected += 1;
                assert!((ray.direction() - DVec3::X).length() < 1e-12);
                assert!((ray.origin() - (point + normal * offset)).length() < 1e-12);
                assert!((weight - reflect_weight).abs() < 1e-12, "{weight}");
            }
        }
        assert!(transmitted > 0 && reflected > 0);
    }

    #[test]
    fn test_cosine_hemisphere_samples() {
        let mut rng = StdRng::seed_from_u64(21);
        let normal = DVec3::new(0.0, 0.0, 1.0);
        let mut mean_cos = 0.0;
        let count = 4000;
        for _ in 0..count {
            let d = sample_cosine_hemisphere(normal, &mut rng);
            assert!((d.length() - 1.0).abs() < 1e-9);
            assert!(d.dot(normal) >= 0.0);
            mean_cos += d.dot(normal);
        }
        // E[cos] under a cosine-weighted pdf is 2/3
        mean_cos /= count as f64;
        assert!((mean_cos - 2.0 / 3.0).abs() < 0.03, "{mean_cos}");
    }

    #[test]
    fn test_reflect_and_luminance() {
        let r = reflect(DVec3::new(1.0, -1.0, 0.0), DVec3::Y);
        assert_eq!(r, DVec3::new(1.0, 1.0, 0.0));
        assert!((luminance(Color::ONE) - 1.0).abs() < 1e-12);
    }
}
