use crate::DVec3;

/// A ray in 3D space with an origin and a unit direction.
///
/// Rays are immutable once built. Every tracing routine assumes the
/// direction is normalized, so use [`Ray::towards`] when the direction
/// comes from arithmetic that may degenerate.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ray {
    origin: DVec3,
    direction: DVec3,
}

impl Ray {
    /// Create a new ray from an already normalized direction.
    #[inline]
    pub fn new(origin: DVec3, direction: DVec3) -> Self {
        debug_assert!(
            (direction.length_squared() - 1.0).abs() < 1e-6,
            "ray direction must be unit length, got {direction:?}"
        );
        Self { origin, direction }
    }

    /// Create a ray pointing along `direction`, normalizing it first.
    ///
    /// Returns `None` for a zero-length or non-finite direction instead of
    /// producing a NaN ray.
    #[inline]
    pub fn towards(origin: DVec3, direction: DVec3) -> Option<Self> {
        direction
            .try_normalize()
            .map(|direction| Self { origin, direction })
    }

    /// Get the origin point of the ray.
    #[inline]
    pub fn origin(&self) -> DVec3 {
        self.origin
    }

    /// Get the unit direction of the ray.
    #[inline]
    pub fn direction(&self) -> DVec3 {
        self.direction
    }

    /// Get the point along the ray at parameter t.
    ///
    /// Returns: origin + t * direction
    #[inline]
    pub fn at(&self, t: f64) -> DVec3 {
        self.origin + self.direction * t
    }
}

impl Default for Ray {
    fn default() -> Self {
        Self {
            origin: DVec3::ZERO,
            direction: DVec3::NEG_Z,
        }
    }
}
