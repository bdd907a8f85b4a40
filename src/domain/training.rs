//! Course progress arithmetic.

/// Completed share of a course as a percentage rounded to two decimals.
/// A course without modules reports 0.
pub fn progress_percentage(completed: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let ratio = completed.min(total) as f64 / total as f64;
    (ratio * 10_000.0).round() / 100.0
}

pub fn is_complete(completed: u64, total: u64) -> bool {
    total > 0 && completed >= total
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn partial_progress_rounds_to_two_places() {
        assert_eq!(progress_percentage(1, 3), 33.33);
        assert_eq!(progress_percentage(2, 3), 66.67);
        assert_eq!(progress_percentage(1, 4), 25.0);
    }

    #[test]
    fn all_modules_done_is_complete() {
        assert_eq!(progress_percentage(5, 5), 100.0);
        assert!(is_complete(5, 5));
        assert!(!is_complete(4, 5));
    }

    #[test]
    fn course_without_modules_never_completes() {
        assert_eq!(progress_percentage(0, 0), 0.0);
        assert!(!is_complete(0, 0));
    }

    #[test]
    fn progress_stays_within_bounds() {
        proptest!(|(completed in 0u64..1_000, total in 0u64..1_000)| {
            let pct = progress_percentage(completed, total);
            prop_assert!((0.0..=100.0).contains(&pct));
            prop_assert_eq!(pct == 100.0, is_complete(completed, total));
        });
    }
}
