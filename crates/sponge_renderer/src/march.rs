//! Sphere tracing against a distance field.
//!
//! Steps use the absolute distance, so a ray that starts inside a signed
//! solid walks towards the boundary it will leave through.

use sponge_core::MarchSettings;
use sponge_math::{DVec3, Ray};

use crate::sdf::DistanceField;

/// A surface hit found by the marcher.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarchHit {
    /// Hit position
    pub point: DVec3,
    /// Ray parameter at the hit
    pub distance: f64,
    /// Iterations taken before the hit (0 = hit at the origin)
    pub steps: u32,
}

/// Outcome of marching a ray.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MarchResult {
    Hit(MarchHit),
    /// Left the trace range, ran out of iterations, or met a NaN estimate
    Miss,
}

impl MarchResult {
    pub fn hit(self) -> Option<MarchHit> {
        match self {
            MarchResult::Hit(hit) => Some(hit),
            MarchResult::Miss => None,
        }
    }
}

/// Sphere tracer with configurable constants.
#[derive(Debug, Clone, Copy)]
pub struct Raymarcher {
    settings: MarchSettings,
}

impl Raymarcher {
    pub fn new(settings: MarchSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &MarchSettings {
        &self.settings
    }

    /// Walk `ray` through `field` until it hits a surface or gives up.
    pub fn march<F: DistanceField + ?Sized>(&self, field: &F, ray: &Ray) -> MarchResult {
        let MarchSettings {
            max_steps,
            max_distance,
            hit_epsilon,
            step_scale,
            ..
        } = self.settings;

        let mut t = 0.0;
        for step in 0..max_steps {
            let point = ray.at(t);
            let d = field.distance(point).abs();
            if d.is_nan() {
                return MarchResult::Miss;
            }
            if d < hit_epsilon {
                return MarchResult::Hit(MarchHit {
                    point,
                    distance: t,
                    steps: step,
                });
            }
            t += d * step_scale;
            if t > max_distance {
                return MarchResult::Miss;
            }
        }
        MarchResult::Miss
    }

    /// Outward surface normal from a central-difference gradient.
    ///
    /// Returns `None` where the gradient vanishes, e.g. in the flat zero
    /// region of an unsigned field.
    pub fn normal<F: DistanceField + ?Sized>(&self, field: &F, p: DVec3) -> Option<DVec3> {
        let h = self.settings.normal_epsilon;
        let dx = DVec3::new(h, 0.0, 0.0);
        let dy = DVec3::new(0.0, h, 0.0);
        let dz = DVec3::new(0.0, 0.0, h);
        let gradient = DVec3::new(
            field.distance(p + dx) - field.distance(p - dx),
            field.distance(p + dy) - field.distance(p - dy),
            field.distance(p + dz) - field.distance(p - dz),
        );
        gradient.try_normalize()
    }
}

impl Default for Raymarcher {
    fn default() -> Self {
        Self::new(MarchSettings::default())
    }
}
