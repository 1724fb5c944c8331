// Re-export glam for convenience
pub use glam::*;

// Sponge math types
mod onb;
mod ray;
pub use onb::Onb;
pub use ray::Ray;

/// GLSL-style `mod`: the result has the sign of `interval`, so for a
/// positive interval every component lands in `[0, interval)`.
#[inline]
pub fn glsl_mod(p: DVec3, interval: f64) -> DVec3 {
    p - interval * (p / interval).floor()
}
