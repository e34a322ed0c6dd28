//! Degree-based angle helpers.
//!
//! Angles throughout the workspace are expressed in degrees. These helpers
//! keep the radian conversion and the finiteness checks in one place so the
//! generator and its tests agree on the exact arithmetic.

use std::f64::consts::PI;

/// Convert an angle in degrees to radians.
#[inline]
pub fn to_radians(degrees: f64) -> f64 {
    (degrees * PI) / 180.0
}

/// Cosine of an angle given in degrees.
#[inline]
pub fn cos_degrees(degrees: f64) -> f64 {
    to_radians(degrees).cos()
}

/// True when `v` is neither NaN nor infinite.
#[inline]
pub fn is_valid_angle(v: f64) -> bool {
    v.is_finite()
}

/// True when `v` can be used as a per-step rotation: finite and nonzero.
#[inline]
pub fn is_valid_rotation(v: f64) -> bool {
    v.is_finite() && v != 0.0
}

/// Advance `angle` by `rotation`, returning `None` when the sum is not finite.
#[inline]
pub fn checked_advance(angle: f64, rotation: f64) -> Option<f64> {
    let next = angle + rotation;
    next.is_finite().then_some(next)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() <= tol
    }

    #[test]
    fn cos_degrees_landmarks() {
        assert!(approx_eq(cos_degrees(0.0), 1.0, 1e-15));
        assert!(approx_eq(cos_degrees(60.0), 0.5, 1e-12));
        assert!(approx_eq(cos_degrees(90.0), 0.0, 1e-12));
        assert!(approx_eq(cos_degrees(180.0), -1.0, 1e-12));
        assert!(approx_eq(cos_degrees(-60.0), 0.5, 1e-12));
    }

    #[test]
    fn rotation_validity() {
        assert!(is_valid_rotation(1.0));
        assert!(is_valid_rotation(-0.01));
        assert!(is_valid_rotation(f64::MAX));
        assert!(!is_valid_rotation(0.0));
        assert!(!is_valid_rotation(-0.0));
        assert!(!is_valid_rotation(f64::NAN));
        assert!(!is_valid_rotation(f64::INFINITY));
    }

    #[test]
    fn checked_advance_detects_overflow() {
        assert_eq!(checked_advance(1.0, 2.0), Some(3.0));
        assert_eq!(checked_advance(f64::MAX, f64::MAX), None);
        assert_eq!(checked_advance(f64::MIN, -f64::MAX), None);
    }
}
