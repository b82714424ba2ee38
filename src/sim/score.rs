//! Distance based scoring
//!
//! `5000 * e^(-d / 1000)`, rounded, with a floor of 50 for any placed guess.
//! Rounds without a guess never reach this function; the engine scores them
//! as 0 directly.

use crate::consts::{MAX_ROUND_SCORE, MIN_PLACED_SCORE, SCORE_DECAY_KM};

/// Points for a guess `distance_km` away from the dish's origin.
///
/// Non-increasing in distance, always within `[50, 5000]`.
pub fn score(distance_km: f64) -> u32 {
    if distance_km.is_nan() {
        return MIN_PLACED_SCORE;
    }
    if distance_km <= 0.0 {
        return MAX_ROUND_SCORE;
    }
    let raw = (f64::from(MAX_ROUND_SCORE) * (-distance_km / SCORE_DECAY_KM).exp()).round();
    // raw is in [0, 5000] here, the cast cannot truncate
    (raw as u32).clamp(MIN_PLACED_SCORE, MAX_ROUND_SCORE)
}

/// Best possible total for a game of `rounds` rounds
pub fn max_total(rounds: u32) -> u32 {
    rounds.saturating_mul(MAX_ROUND_SCORE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_exact_guess_scores_max() {
        assert_eq!(score(0.0), 5000);
        assert_eq!(score(-3.0), 5000);
    }

    #[test]
    fn test_reference_values() {
        assert_eq!(score(1000.0), 1839);
        assert_eq!(score(100.0), 4524);
        // 5000 * e^-5 = 33.7 -> floored at 50
        assert_eq!(score(5000.0), 50);
        assert_eq!(score(10_000.0), 50);
        assert_eq!(score(20_015.0), 50);
    }

    #[test]
    fn test_tiny_distance_rounds_to_max() {
        assert_eq!(score(0.05), 5000);
        assert_eq!(score(1.0), 4995);
    }

    #[test]
    fn test_degenerate_inputs() {
        assert_eq!(score(f64::INFINITY), 50);
        assert_eq!(score(f64::NAN), 50);
    }

    #[test]
    fn test_max_total() {
        assert_eq!(max_total(6), 30_000);
        assert_eq!(max_total(0), 0);
    }

    proptest! {
        #[test]
        fn prop_score_is_monotonic(a in 0.0f64..25_000.0, b in 0.0f64..25_000.0) {
            let (near, far) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(score(near) >= score(far));
        }

        #[test]
        fn prop_score_bounded_for_placed_guess(d in 0.000_001f64..1.0e9) {
            let s = score(d);
            prop_assert!(s >= MIN_PLACED_SCORE);
            prop_assert!(s <= MAX_ROUND_SCORE);
        }
    }
}
