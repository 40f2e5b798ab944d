//! Stateless numeric transforms over aligned series.
//!
//! Every transform takes plain slices and returns a new value. None of them
//! produce NaN or infinity: degenerate inputs (too few points, zero variance,
//! zero denominators, mismatched lengths) map to empty output, skipped points
//! or a neutral 0.

pub mod correlation;
pub mod percentile;
pub mod roc;
pub mod shift;
pub mod zscore;

pub use correlation::pearson;
pub use percentile::{latest_percentile, percentile_rank};
pub use roc::{rate_of_change, rate_of_change_aligned};
pub use shift::shift_series;
pub use zscore::zscore;

/// Daily dates starting 2020-01-01, for tests.
#[cfg(test)]
pub fn make_dates(n: usize) -> Vec<chrono::NaiveDate> {
    let base = chrono::NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
    (0..n)
        .map(|i| base + chrono::Duration::days(i as i64))
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for transform tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
