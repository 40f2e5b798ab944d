//! Rate of Change (ROC).
//!
//! Percentage change over `period` observations:
//! ROC[t] = (value[t] / value[t-period] - 1) * 100
//!
//! Points whose current or reference value is missing, or whose reference is
//! zero, are skipped rather than emitted as gaps, so the output is shorter
//! than the input.

use crate::domain::{valid, Points};
use chrono::NaiveDate;

pub fn rate_of_change(dates: &[NaiveDate], values: &[Option<f64>], period: usize) -> Points {
    if dates.len() != values.len() {
        tracing::debug!(dates = dates.len(), values = values.len(), "rate_of_change: length mismatch");
        return Points::default();
    }
    let aligned = rate_of_change_aligned(values, period);
    let mut out = Points::with_capacity(aligned.iter().flatten().count());
    for (date, roc) in dates.iter().zip(aligned) {
        if let Some(roc) = roc {
            out.push(*date, roc);
        }
    }
    out
}

/// ROC kept on the input's positions: skipped points are `None`.
pub fn rate_of_change_aligned(values: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    let n = values.len();
    if period == 0 {
        return vec![None; n];
    }
    (0..n)
        .map(|i| {
            let prev = valid(values[i.checked_sub(period)?])?;
            let curr = valid(values[i])?;
            if prev == 0.0 {
                return None;
            }
            valid(Some((curr / prev - 1.0) * 100.0))
        })
        .collect()
}
