//! Signed distance functions.
//!
//! The Menger sponge is built from a solid cube by subtracting, for each of
//! four octaves, a tiled set of three perpendicular square bars. All
//! estimates are conservative so sphere tracing never steps through a
//! surface.

use sponge_core::Shape;
use sponge_math::{glsl_mod, DVec2, DVec3};

/// Anything that can report a distance to its surface.
pub trait DistanceField: Send + Sync {
    /// Distance estimate from `p` to the nearest surface point.
    ///
    /// Outside the surface the value never exceeds the true distance.
    fn distance(&self, p: DVec3) -> f64;
}

/// Half extent of the fractal's bounding cube in local units.
pub const SPONGE_HALF_EXTENT: f64 = 0.3;

/// Number of subtraction octaves.
pub const SPONGE_OCTAVES: i32 = 4;

/// Distance from `p` to the surface of an origin-centered cube.
///
/// Zero everywhere inside the cube.
#[inline]
pub fn box_distance(p: DVec3, half_extent: f64) -> f64 {
    (p.abs() - DVec3::splat(half_extent)).max(DVec3::ZERO).length()
}

/// Signed distance to an origin-centered square in 2D.
#[inline]
pub fn bar_distance(p: DVec2, half_extent: f64) -> f64 {
    let d = p.abs() - DVec2::splat(half_extent);
    d.x.max(d.y).min(0.0) + d.max(DVec2::ZERO).length()
}

/// Three mutually perpendicular infinite bars through the origin.
#[inline]
pub fn cross_bar_distance(p: DVec3, half_extent: f64) -> f64 {
    let da = bar_distance(DVec2::new(p.x, p.y), half_extent);
    let db = bar_distance(DVec2::new(p.y, p.z), half_extent);
    let dc = bar_distance(DVec2::new(p.z, p.x), half_extent);
    da.min(db.min(dc))
}

/// Fold `p` into one centered cell of a grid with the given period.
#[inline]
pub fn repeat(p: DVec3, interval: f64) -> DVec3 {
    glsl_mod(p, interval) - DVec3::splat(interval * 0.5)
}

/// Menger sponge in local units, bounded by a cube of half extent 0.3.
pub fn fractal_distance(p: DVec3) -> f64 {
    let folded = p.abs();
    let mut ret = box_distance(p, SPONGE_HALF_EXTENT);
    for octave in 0..SPONGE_OCTAVES {
        let pw = 3.0_f64.powi(octave);
        let period = 0.6 / pw;
        // Shift by half a period so the bars sit at the cell centers
        let cell = repeat(folded + DVec3::splat(period * 0.5), period);
        ret = ret.max(-cross_bar_distance(cell, 0.1 / pw));
    }
    ret
}

/// Menger sponge placed in world space.
///
/// The estimate is rescaled by the same factor as the space transform.
#[inline]
pub fn menger_distance(world: DVec3, center: DVec3, scale: f64) -> f64 {
    fractal_distance((world - center) / scale) * scale
}

#[inline]
pub fn sphere_distance(p: DVec3, center: DVec3, radius: f64) -> f64 {
    (p - center).length() - radius
}

/// Signed distance to the plane `dot(p, normal) = offset`; `normal` must
/// be unit length.
#[inline]
pub fn plane_distance(p: DVec3, normal: DVec3, offset: f64) -> f64 {
    p.dot(normal) - offset
}

impl DistanceField for Shape {
    fn distance(&self, p: DVec3) -> f64 {
        match *self {
            Shape::MengerSponge { center, scale } => menger_distance(p, center, scale),
            Shape::Sphere { center, radius } => sphere_distance(p, center, radius),
            Shape::Plane { normal, offset } => plane_distance(p, normal, offset),
        }
    }
}
