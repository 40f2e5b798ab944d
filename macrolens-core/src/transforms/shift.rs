//! Calendar date shift for visual lead/lag exploration.

use crate::domain::{valid, Points};
use chrono::{Duration, NaiveDate};

/// Shift every valid point by `offset_days` calendar days (positive = later).
///
/// Missing points are dropped, as are points whose shifted date falls off
/// the calendar.
pub fn shift_series(dates: &[NaiveDate], values: &[Option<f64>], offset_days: i64) -> Points {
    if dates.len() != values.len() {
        tracing::debug!(dates = dates.len(), values = values.len(), "shift_series: length mismatch");
        return Points::default();
    }
    let Some(offset) = Duration::try_days(offset_days) else {
        return Points::default();
    };

    let mut out = Points::with_capacity(dates.len());
    for (date, value) in dates.iter().zip(values) {
        let Some(v) = valid(*value) else { continue };
        if let Some(shifted) = date.checked_add_signed(offset) {
            out.push(shifted, v);
        }
    }
    out
}
