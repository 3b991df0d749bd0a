//! Yaw-relative planar movement.
//!
//! Yaw is measured in radians around +Y. At yaw 0 an entity looks down -Z
//! with +X on its right.

use glam::Vec3;

/// Unit vector an entity with the given yaw is looking along.
#[must_use]
pub fn forward_vector(yaw: f32) -> Vec3 {
    Vec3::new(-yaw.sin(), 0.0, -yaw.cos())
}

/// Unit vector to the right of an entity with the given yaw.
#[must_use]
pub fn right_vector(yaw: f32) -> Vec3 {
    Vec3::new(yaw.cos(), 0.0, -yaw.sin())
}

/// Horizontal velocity for a (forward, right) input pair under `yaw`.
///
/// The pair is rotated as-is and scaled by `speed`; a diagonal input is
/// `sqrt(2)` times faster than a single axis. Callers cap airborne speed
/// with [`clamp_horizontal`].
#[must_use]
pub fn planar_velocity(forward: f32, right: f32, yaw: f32, speed: f32) -> Vec3 {
    (forward_vector(yaw) * forward + right_vector(yaw) * right) * speed
}

/// Clamp the X/Z magnitude of `velocity` to `max`, leaving Y untouched.
#[must_use]
pub fn clamp_horizontal(velocity: Vec3, max: f32) -> Vec3 {
    let horizontal = Vec3::new(velocity.x, 0.0, velocity.z);
    let speed = horizontal.length();
    if speed <= max || speed == 0.0 {
        return velocity;
    }
    let scaled = horizontal * (max / speed);
    Vec3::new(scaled.x, velocity.y, scaled.z)
}

#[cfg(test)]
mod tests {
    use std::f32::consts::FRAC_PI_2;

    use super::*;

    fn close(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1.0e-5
    }

    #[test]
    fn test_forward_at_zero_yaw() {
        assert!(close(planar_velocity(1.0, 0.0, 0.0, 2.0), Vec3::new(0.0, 0.0, -2.0)));
        assert!(close(planar_velocity(0.0, 1.0, 0.0, 2.0), Vec3::new(2.0, 0.0, 0.0)));
    }

    #[test]
    fn test_forward_rotates_with_yaw() {
        // Quarter turn left: forward now points down -X.
        assert!(close(
            planar_velocity(1.0, 0.0, FRAC_PI_2, 1.0),
            Vec3::new(-1.0, 0.0, 0.0)
        ));
    }

    #[test]
    fn test_diagonal_is_not_normalised() {
        let v = planar_velocity(1.0, 1.0, 0.3, 4.0);
        assert!((v.length() - 4.0 * std::f32::consts::SQRT_2).abs() < 1.0e-4);
    }

    #[test]
    fn test_zero_input_is_zero() {
        assert_eq!(planar_velocity(0.0, 0.0, 1.0, 5.0), Vec3::ZERO);
    }

    #[test]
    fn test_clamp_horizontal_preserves_vertical() {
        let v = clamp_horizontal(Vec3::new(6.0, -3.0, 8.0), 5.0);
        assert!((Vec3::new(v.x, 0.0, v.z).length() - 5.0).abs() < 1.0e-5);
        assert_eq!(v.y, -3.0);
    }

    #[test]
    fn test_clamp_horizontal_leaves_slow_velocity() {
        let v = Vec3::new(1.0, 2.0, 1.0);
        assert_eq!(clamp_horizontal(v, 5.0), v);
    }
}
