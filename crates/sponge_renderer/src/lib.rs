//! Sponge Renderer - CPU path tracing of signed-distance fractals
//!
//! A Monte Carlo path tracer that sphere-traces implicit surfaces, built
//! around a four-octave Menger sponge.
//!
//! Data flows one way: the render driver asks the integrator for radiance,
//! the integrator marches rays, and the marcher evaluates distance fields.

mod camera;
mod integrator;
mod march;
mod renderer;
mod scene;
pub mod sdf;

pub use camera::Camera;
pub use integrator::{luminance, reflect, sample_cosine_hemisphere, Integrator, PathIntegrator};
pub use march::{MarchHit, MarchResult, Raymarcher};
pub use renderer::{
    render, render_framebuffer, render_row, render_status, render_with, row_rng, NoopObserver,
    RenderError, RenderObserver, RowResult,
};
pub use scene::Scene;
pub use sdf::DistanceField;

/// Re-export common types from sponge_core and sponge_math
pub use sponge_core::{Color, Framebuffer, Material, ReflectionKind, RenderSettings};
pub use sponge_math::{DVec3, Ray};

use rand::Rng;
use rand::RngCore;

/// Draw a uniform `f64` in `[0, 1)`.
#[inline]
pub fn gen_f64(rng: &mut dyn RngCore) -> f64 {
    rng.gen::<f64>()
}
