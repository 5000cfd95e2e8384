//! Angle and direction helpers shared by the stepping, vertexing and
//! classification stages.

use std::f32::consts::{FRAC_PI_2, PI};

const EPS: f32 = 1e-6;

/// Angle of a 2D direction vector in radians, in (-π, π].
#[inline]
pub fn angle_of(dir: &[f32; 2]) -> f32 {
    dir[1].atan2(dir[0])
}

/// Computes the unsigned angle between two 2D vectors in radians.
/// Returns a value in [0, π]. Zero if the vectors are parallel
/// and pointing in the same direction; π if they are opposite.
#[inline]
pub fn angle_between(a: &[f32; 2], b: &[f32; 2]) -> f32 {
    let dot = a[0] * b[0] + a[1] * b[1];
    let na = (a[0] * a[0] + a[1] * a[1]).sqrt().max(EPS);
    let nb = (b[0] * b[0] + b[1] * b[1]).sqrt().max(EPS);
    (dot / (na * nb)).clamp(-1.0, 1.0).acos()
}

/// Orientation difference between two 2D vectors treating antipodal
/// directions as equivalent. Returns a value in [0, π/2].
///
/// Trajectory tangents at a vertex point in arbitrary step directions, so
/// vertex and classification cuts compare orientations with this.
#[inline]
pub fn angle_between_dirless(a: &[f32; 2], b: &[f32; 2]) -> f32 {
    let diff = angle_between(a, b);
    if diff > FRAC_PI_2 {
        PI - diff
    } else {
        diff
    }
}

/// Normalizes a vector, returning `None` for (near) zero length.
#[inline]
pub fn unit(v: [f32; 2]) -> Option<[f32; 2]> {
    let norm = (v[0] * v[0] + v[1] * v[1]).sqrt();
    if !norm.is_finite() || norm <= EPS {
        None
    } else {
        Some([v[0] / norm, v[1] / norm])
    }
}

#[inline]
pub fn distance(a: &[f32; 2], b: &[f32; 2]) -> f32 {
    ((a[0] - b[0]).powi(2) + (a[1] - b[1]).powi(2)).sqrt()
}

/// Perpendicular distance of `p` from the line through `origin` along the unit
/// vector `dir`.
#[inline]
pub fn perp_distance(p: &[f32; 2], origin: &[f32; 2], dir: &[f32; 2]) -> f32 {
    let dx = p[0] - origin[0];
    let dy = p[1] - origin[1];
    (dx * dir[1] - dy * dir[0]).abs()
}

/// Signed distance of `p` along the unit vector `dir` measured from `origin`.
#[inline]
pub fn along_distance(p: &[f32; 2], origin: &[f32; 2], dir: &[f32; 2]) -> f32 {
    (p[0] - origin[0]) * dir[0] + (p[1] - origin[1]) * dir[1]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn angle_between_basic() {
        let a = [1.0f32, 0.0];
        assert!(approx_eq(angle_between(&a, &a), 0.0));

        let c = [-1.0f32, 0.0];
        assert!(approx_eq(angle_between(&a, &c), PI));

        let d = [0.0f32, 1.0];
        assert!(approx_eq(angle_between(&a, &d), FRAC_PI_2));
    }

    #[test]
    fn dirless_angle_folds_antiparallel() {
        let a = [1.0f32, 0.0];
        let b = [-1.0f32, 0.05];
        assert!(angle_between_dirless(&a, &b) < 0.06);
    }

    #[test]
    fn perpendicular_and_along_components() {
        let origin = [0.0f32, 0.0];
        let dir = [1.0f32, 0.0];
        let p = [3.0f32, -2.0];
        assert!(approx_eq(perp_distance(&p, &origin, &dir), 2.0));
        assert!(approx_eq(along_distance(&p, &origin, &dir), 3.0));
    }

    #[test]
    fn unit_rejects_zero_vector() {
        assert!(unit([0.0, 0.0]).is_none());
        let u = unit([3.0, 4.0]).unwrap();
        assert!(approx_eq(u[0], 0.6) && approx_eq(u[1], 0.8));
    }
}
