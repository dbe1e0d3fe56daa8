//! Per-round score decay.
//!
//! Every CheckIT mini-game awards points from the same linearly decaying
//! pool: a round starts at 1000 points and loses 50 points per second until
//! it hits zero. The displayed value is refreshed on a 50ms tick, but the
//! points actually awarded are always recomputed from real elapsed time at
//! the moment of response, so a throttled or backgrounded timer can never
//! preserve a higher score than deserved.

/// Maximum points a single round can award.
pub const MAX_ROUND_POINTS: u32 = 1000;

/// Points lost per elapsed millisecond (50 points per second).
pub const DECAY_PER_MS: f64 = 0.05;

/// Elapsed time at which the potential score reaches zero and the round
/// auto-resolves as a timeout.
pub const ROUND_TIME_LIMIT_MS: i64 = 20_000;

/// Display refresh interval for the decaying counter.
pub const TICK_INTERVAL_MS: u64 = 50;

/// How long the correct/incorrect feedback state is held before advancing.
pub const FEEDBACK_DURATION_MS: i64 = 1500;

/// Remaining points a correct answer would earn after `elapsed_ms`.
///
/// Pure and deterministic: `max(0, 1000 - elapsed_ms * 0.05)`, floored to an
/// integer. Negative elapsed times (clock skew) are treated as zero elapsed.
pub fn potential_score(elapsed_ms: i64) -> u32 {
    let elapsed = elapsed_ms.max(0) as f64;
    let remaining = (MAX_ROUND_POINTS as f64) - elapsed * DECAY_PER_MS;
    remaining.max(0.0).floor() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_points_at_zero_elapsed() {
        assert_eq!(potential_score(0), MAX_ROUND_POINTS);
    }

    #[test]
    fn decays_fifty_points_per_second() {
        // Scenario from the quiz game: answering at 2000ms earns 900.
        assert_eq!(potential_score(2000), 900);
        assert_eq!(potential_score(1000), 950);
        assert_eq!(potential_score(10_000), 500);
    }

    #[test]
    fn floors_fractional_remainders() {
        // 1000 - 30 * 0.05 = 998.5 -> 998
        assert_eq!(potential_score(30), 998);
    }

    #[test]
    fn clamps_to_zero_at_and_beyond_the_limit() {
        assert_eq!(potential_score(ROUND_TIME_LIMIT_MS), 0);
        assert_eq!(potential_score(ROUND_TIME_LIMIT_MS + 1), 0);
        assert_eq!(potential_score(i64::MAX), 0);
    }

    #[test]
    fn negative_elapsed_is_treated_as_zero() {
        assert_eq!(potential_score(-500), MAX_ROUND_POINTS);
    }

    #[test]
    fn non_increasing_in_elapsed_time() {
        let mut previous = potential_score(0);
        for elapsed in (0..=25_000).step_by(7) {
            let current = potential_score(elapsed);
            assert!(current <= previous, "score increased at {}ms", elapsed);
            previous = current;
        }
    }
}
