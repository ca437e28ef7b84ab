//! SM-2 spaced repetition.
//!
//! Every completion counts as a review. Quality 0..=5 comes from the score
//! (`round(score / 20)`); a completion without a score is graded 4.

pub const DEFAULT_EASE: f64 = 2.5;
pub const MIN_EASE: f64 = 1.3;
pub const MAX_INTERVAL_DAYS: i32 = 365;
const UNSCORED_QUALITY: u8 = 4;
const PASSING_QUALITY: u8 = 3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReviewState {
    pub ease_factor: f64,
    pub interval_days: i32,
    pub review_count: i32,
}

impl Default for ReviewState {
    fn default() -> Self {
        Self {
            ease_factor: DEFAULT_EASE,
            interval_days: 0,
            review_count: 0,
        }
    }
}

pub fn quality_from_score(score: Option<f64>) -> u8 {
    match score {
        Some(s) => (s / 20.0).round().clamp(0.0, 5.0) as u8,
        None => UNSCORED_QUALITY,
    }
}

/// Next state after a review of quality `q`. The interval uses the ease
/// factor in force before this review and never exceeds a year.
pub fn apply_review(state: ReviewState, quality: u8) -> ReviewState {
    let q = quality.min(5);
    let (interval_days, review_count) = if q >= PASSING_QUALITY {
        let interval = match state.review_count {
            0 => 1,
            1 => 6,
            _ => (f64::from(state.interval_days) * state.ease_factor).round() as i32,
        };
        (interval.min(MAX_INTERVAL_DAYS), state.review_count + 1)
    } else {
        (1, 0)
    };

    let miss = f64::from(5 - q);
    let ease_factor = (state.ease_factor + 0.1 - miss * (0.08 + miss * 0.02)).max(MIN_EASE);

    ReviewState {
        ease_factor,
        interval_days,
        review_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quality_from_score() {
        assert_eq!(quality_from_score(Some(100.0)), 5);
        assert_eq!(quality_from_score(Some(85.0)), 4);
        assert_eq!(quality_from_score(Some(49.0)), 2);
        assert_eq!(quality_from_score(Some(0.0)), 0);
        assert_eq!(quality_from_score(None), 4);
    }

    #[test]
    fn test_interval_progression_1_6_then_scaled() {
        let first = apply_review(ReviewState::default(), 5);
        assert_eq!(first.interval_days, 1);
        assert_eq!(first.review_count, 1);
        assert!((first.ease_factor - 2.6).abs() < 1e-9);

        let second = apply_review(first, 5);
        assert_eq!(second.interval_days, 6);

        let third = apply_review(second, 5);
        // 6 * 2.7 = 16.2
        assert_eq!(third.interval_days, 16);
        assert_eq!(third.review_count, 3);
    }

    #[test]
    fn test_quality_four_keeps_ease() {
        let next = apply_review(ReviewState::default(), 4);
        assert!((next.ease_factor - 2.5).abs() < 1e-9);
    }

    #[test]
    fn test_failed_review_resets() {
        let state = ReviewState {
            ease_factor: 2.5,
            interval_days: 16,
            review_count: 3,
        };
        let next = apply_review(state, 2);
        assert_eq!(next.interval_days, 1);
        assert_eq!(next.review_count, 0);
        // 2.5 + 0.1 - 3 * (0.08 + 0.06) = 2.18
        assert!((next.ease_factor - 2.18).abs() < 1e-9);
    }

    #[test]
    fn test_ease_never_drops_below_floor() {
        let mut state = ReviewState::default();
        for _ in 0..10 {
            state = apply_review(state, 0);
        }
        assert_eq!(state.ease_factor, MIN_EASE);
    }

    #[test]
    fn test_interval_is_capped_at_a_year() {
        let mut state = ReviewState::default();
        for _ in 0..30 {
            state = apply_review(state, 5);
            assert!(state.interval_days <= MAX_INTERVAL_DAYS);
        }
        assert_eq!(state.interval_days, MAX_INTERVAL_DAYS);
        assert_eq!(state.review_count, 30);
    }
}
