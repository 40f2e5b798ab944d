//! Percentile rank against a series' own history.
//!
//! Upstream bundles usually ship percentiles precomputed; these are used when
//! they don't.

use crate::domain::valid;

/// Percentage (0–100) of valid observations in `history` strictly below
/// `value`. `None` when `value` is invalid or history has no valid entries.
pub fn percentile_rank(history: &[Option<f64>], value: f64) -> Option<f64> {
    if !value.is_finite() {
        return None;
    }
    let (below, total) = history
        .iter()
        .filter_map(|v| valid(*v))
        .fold((0usize, 0usize), |(below, total), x| {
            (below + usize::from(x < value), total + 1)
        });
    if total == 0 {
        return None;
    }
    Some(below as f64 / total as f64 * 100.0)
}

/// Last valid observation and its percentile rank within the whole series.
pub fn latest_percentile(values: &[Option<f64>]) -> Option<(f64, f64)> {
    let latest = values.iter().rev().find_map(|v| valid(*v))?;
    percentile_rank(values, latest).map(|p| (latest, p))
}
