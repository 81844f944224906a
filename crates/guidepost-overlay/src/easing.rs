//! Timing curves shared by the renderers.

use std::time::Duration;

/// Symmetric quadratic ease: accelerate through the first half,
/// decelerate through the second.
pub fn ease_in_out_quad(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        2.0 * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
    }
}

/// Linear progress of `elapsed` through `duration`, clamped to `[0, 1]`.
/// A zero duration is already complete.
pub fn progress(elapsed: Duration, duration: Duration) -> f64 {
    if duration.is_zero() {
        return 1.0;
    }
    (elapsed.as_secs_f64() / duration.as_secs_f64()).clamp(0.0, 1.0)
}

/// Position inside a free-running cycle, in `[0, 1)`.
pub fn cycle_phase(elapsed: Duration, period: Duration) -> f64 {
    if period.is_zero() {
        return 0.0;
    }
    let period = period.as_secs_f64();
    (elapsed.as_secs_f64() % period) / period
}

/// 0 at the cycle edges, 1 in the middle.
pub fn triangle(phase: f64) -> f64 {
    let phase = phase.rem_euclid(1.0);
    1.0 - (2.0 * phase - 1.0).abs()
}

/// Smallest scale reached during the click squish.
pub const SQUISH_SCALE: f64 = 0.8;

/// Scale of the cursor core during a click: down to [`SQUISH_SCALE`]
/// through the first half, back to 1 through the second.
pub fn squish_scale(t: f64) -> f64 {
    let depth = triangle(t.clamp(0.0, 1.0));
    1.0 - (1.0 - SQUISH_SCALE) * depth
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_ease_endpoints_and_midpoint() {
        assert_eq!(ease_in_out_quad(0.0), 0.0);
        assert_eq!(ease_in_out_quad(1.0), 1.0);
        assert!(approx(ease_in_out_quad(0.5), 0.5));
        assert!(approx(ease_in_out_quad(0.25), 0.125));
        assert!(approx(ease_in_out_quad(0.75), 0.875));
    }

    #[test]
    fn test_ease_is_monotonic() {
        let mut last = 0.0;
        for i in 0..=100 {
            let v = ease_in_out_quad(i as f64 / 100.0);
            assert!(v >= last);
            last = v;
        }
    }

    #[test]
    fn test_progress_clamps() {
        let d = Duration::from_millis(1000);
        assert_eq!(progress(Duration::ZERO, d), 0.0);
        assert!(approx(progress(Duration::from_millis(250), d), 0.25));
        assert_eq!(progress(Duration::from_millis(5000), d), 1.0);
        assert_eq!(progress(Duration::from_millis(1), Duration::ZERO), 1.0);
    }

    #[test]
    fn test_cycle_phase_wraps() {
        let p = Duration::from_millis(1400);
        assert!(approx(cycle_phase(Duration::from_millis(700), p), 0.5));
        assert!(approx(cycle_phase(Duration::from_millis(2100), p), 0.5));
        assert_eq!(cycle_phase(Duration::from_millis(5), Duration::ZERO), 0.0);
    }

    #[test]
    fn test_triangle() {
        assert_eq!(triangle(0.0), 0.0);
        assert_eq!(triangle(0.5), 1.0);
        assert!(approx(triangle(0.25), 0.5));
        assert!(approx(triangle(1.25), 0.5));
    }

    #[test]
    fn test_squish_bottoms_out_halfway() {
        assert_eq!(squish_scale(0.0), 1.0);
        assert!(approx(squish_scale(0.5), SQUISH_SCALE));
        assert!(approx(squish_scale(1.0), 1.0));
    }
}
