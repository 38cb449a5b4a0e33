//! Scalar helpers shared by the integrators.

use std::f32::consts::{PI, TAU};

use glam::Vec3;

/// Tick rate that per-tick decay factors were authored against.
pub const REFERENCE_TICK_RATE: f32 = 60.0;

/// Linear interpolation without clamping.
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Exponential-style approach: lerp by `rate * dt`, clamped so a long step
/// lands on the target instead of overshooting it.
#[inline]
pub fn approach(current: f32, target: f32, rate: f32, dt: f32) -> f32 {
    lerp(current, target, (rate * dt).clamp(0.0, 1.0))
}

/// Vector form of [`approach`].
#[inline]
pub fn approach_vec3(current: Vec3, target: Vec3, rate: f32, dt: f32) -> Vec3 {
    current.lerp(target, (rate * dt).clamp(0.0, 1.0))
}

/// Scale factor for a multiplicative decay authored as "×`factor` per tick".
///
/// Returns exactly `factor` at [`REFERENCE_TICK_RATE`] and stays consistent
/// at other rates.
#[inline]
pub fn per_tick_decay(factor: f32, dt: f32) -> f32 {
    factor.powf(dt * REFERENCE_TICK_RATE)
}

/// Wrap an angle into `[-PI, PI]`.
pub fn wrap_angle(angle: f32) -> f32 {
    if !angle.is_finite() {
        return 0.0;
    }
    let wrapped = (angle + PI).rem_euclid(TAU) - PI;
    // rem_euclid can round up to TAU for tiny negative inputs.
    wrapped.clamp(-PI, PI)
}

/// Shortest signed rotation taking `from` to `to`.
#[inline]
pub fn shortest_angle(from: f32, to: f32) -> f32 {
    wrap_angle(to - from)
}

/// Sign that maps zero to zero, unlike [`f32::signum`].
#[inline]
pub fn sign(value: f32) -> f32 {
    if value > 0.0 {
        1.0
    } else if value < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// Forward and right unit vectors for a yaw heading where heading 0 faces +Z.
#[inline]
pub fn heading_basis(heading: f32) -> (Vec3, Vec3) {
    let (sin, cos) = heading.sin_cos();
    (Vec3::new(sin, 0.0, cos), Vec3::new(cos, 0.0, -sin))
}

/// Horizontal length of a vector (ignores Y).
#[inline]
pub fn horizontal_length(v: Vec3) -> f32 {
    v.x.hypot(v.z)
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn test_approach_never_overshoots() {
        // rate * dt = 1.5 would overshoot with a plain lerp.
        let v = approach(0.0, 1.0, 15.0, 0.1);
        assert!((v - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_per_tick_decay_matches_reference_rate() {
        let factor = per_tick_decay(0.9, 1.0 / REFERENCE_TICK_RATE);
        assert!((factor - 0.9).abs() < 1e-5);
        // Two half-length ticks decay as much as one full tick.
        let half = per_tick_decay(0.9, 0.5 / REFERENCE_TICK_RATE);
        assert!((half * half - 0.9).abs() < 1e-5);
    }

    #[test]
    fn test_sign_of_zero_is_zero() {
        assert_eq!(sign(0.0), 0.0);
        assert_eq!(sign(-0.0), 0.0);
        assert_eq!(sign(3.0), 1.0);
        assert_eq!(sign(-0.1), -1.0);
    }

    #[test]
    fn test_heading_basis_is_orthonormal() {
        let (forward, right) = heading_basis(0.7);
        assert!((forward.length() - 1.0).abs() < 1e-6);
        assert!((right.length() - 1.0).abs() < 1e-6);
        assert!(forward.dot(right).abs() < 1e-6);
        let (forward, right) = heading_basis(0.0);
        assert!((forward - Vec3::Z).length() < 1e-6);
        assert!((right - Vec3::X).length() < 1e-6);
    }

    #[test]
    fn test_wrap_angle_known_values() {
        assert!((wrap_angle(3.0 * PI / 2.0) + PI / 2.0).abs() < 1e-5);
        assert!((wrap_angle(-3.0 * PI / 2.0) - PI / 2.0).abs() < 1e-5);
        assert!(wrap_angle(TAU).abs() < 1e-5);
        assert_eq!(wrap_angle(f32::NAN), 0.0);
    }

    proptest! {
        #[test]
        fn prop_shortest_angle_is_bounded(a in -50.0f32..50.0, b in -50.0f32..50.0) {
            let diff = shortest_angle(a, b);
            prop_assert!((-PI..=PI).contains(&diff));
        }

        #[test]
        fn prop_applying_shortest_angle_reduces_separation(
            a in -50.0f32..50.0,
            b in -50.0f32..50.0,
            t in 0.1f32..=1.0,
        ) {
            let before = shortest_angle(a, b).abs();
            let stepped = a + shortest_angle(a, b) * t;
            let after = shortest_angle(stepped, b).abs();
            prop_assert!(after <= before + 1e-3);
        }
    }
}
