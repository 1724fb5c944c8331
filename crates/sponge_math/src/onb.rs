use crate::DVec3;

/// Orthonormal basis built around a unit `w` axis.
///
/// Used to turn hemisphere samples expressed in local coordinates into
/// world-space directions around a surface normal.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Onb {
    pub u: DVec3,
    pub v: DVec3,
    pub w: DVec3,
}

impl Onb {
    /// Build a basis whose `w` axis is `normal` (expected unit length).
    pub fn from_w(normal: DVec3) -> Self {
        // Pick the helper axis least aligned with the normal
        let helper = if normal.x.abs() > 0.1 { DVec3::Y } else { DVec3::X };
        let u = helper.cross(normal).normalize();
        let v = normal.cross(u);
        Self { u, v, w: normal }
    }

    /// Map local coordinates `(a, b, c)` to `a*u + b*v + c*w`.
    #[inline]
    pub fn local(&self, a: f64, b: f64, c: f64) -> DVec3 {
        self.u * a + self.v * b + self.w * c
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_orthonormal(onb: &Onb) {
        for axis in [onb.u, onb.v, onb.w] {
            assert!((axis.length() - 1.0).abs() < 1e-12);
        }
        assert!(onb.u.dot(onb.v).abs() < 1e-12);
        assert!(onb.v.dot(onb.w).abs() < 1e-12);
        assert!(onb.w.dot(onb.u).abs() < 1e-12);
    }

    #[test]
    fn test_basis_is_orthonormal() {
        assert_orthonormal(&Onb::from_w(DVec3::X));
        assert_orthonormal(&Onb::from_w(DVec3::NEG_Y));
        assert_orthonormal(&Onb::from_w(DVec3::new(1.0, 2.0, -3.0).normalize()));
    }

    #[test]
    fn test_local_w_maps_to_normal() {
        let n = DVec3::new(0.0, 0.6, 0.8);
        let onb = Onb::from_w(n);
        assert!((onb.local(0.0, 0.0, 1.0) - n).length() < 1e-12);
    }
}
