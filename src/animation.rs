//! Time-driven scene motion.

use glam::Vec3;

/// Peak distance of the light target from the origin along each axis.
pub const ORBIT_RADIUS: f64 = 10.0;

/// Radians of orbit phase per millisecond of wall-clock time.
pub const ORBIT_RATE: f64 = 0.001;

/// Rotation added to the disco ball on every frame, in radians.
pub const DISCO_BALL_SPIN: f32 = 0.01;

/// Position of the shared spot-light target at `time_ms`.
///
/// One cosine drives all three axes, so the target slides back and forth
/// along the `(1, 1, 1)` diagonal instead of tracing a circle. The phase is
/// computed in `f64`: epoch milliseconds do not fit an `f32` mantissa.
pub fn orbit_target(time_ms: f64) -> Vec3 {
    let orbit = ORBIT_RADIUS * (time_ms * ORBIT_RATE).cos();
    Vec3::splat(orbit as f32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn target_starts_at_the_far_corner() {
        assert_eq!(orbit_target(0.0), Vec3::splat(10.0));
    }

    #[test]
    fn one_second_in() {
        let target = orbit_target(1000.0);
        assert_relative_eq!(target.x, 5.403_023, epsilon = 1e-5);
        assert_eq!(target.x, target.y);
        assert_eq!(target.y, target.z);
    }

    #[test]
    fn axes_stay_equal_for_epoch_times() {
        for time in [1.0, 1_234.5, 86_400_000.0, 1_760_000_000_000.0] {
            let target = orbit_target(time);
            assert_eq!(target.x, target.y);
            assert_eq!(target.x, target.z);
            assert!(target.x.abs() <= 10.0);
        }
    }
}
