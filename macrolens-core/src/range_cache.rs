//! Precomputed index subsets per range code for one date axis.
//!
//! Built once per `DateAxis` (O(dates × codes)), then queried once per chart.
//! The cache is immutable after construction and records the `AxisId` it was
//! built for, so a holder can tell when a refresh invalidated it.

use crate::domain::{AxisId, DateAxis};
use crate::error::RangeError;
use crate::range::{RangeTable, ALL};
use chrono::NaiveDate;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeIndexCache {
    axis_id: AxisId,
    entries: BTreeMap<String, Vec<usize>>,
}

impl RangeIndexCache {
    /// Build entries for `codes` (plus `ALL`, always).
    ///
    /// A date passes the floor when it is on or after `min_valid_date`;
    /// placeholder dates (epoch sentinels, unparseable input) sit below it.
    /// Every entry only contains indices passing the floor.
    pub fn build(
        axis: &DateAxis,
        table: &RangeTable,
        codes: &[&str],
        min_valid_date: Option<NaiveDate>,
        now: NaiveDate,
    ) -> Result<Self, RangeError> {
        let dates = axis.dates();
        let passes_floor: Vec<bool> = dates
            .iter()
            .map(|d| min_valid_date.map_or(true, |floor| *d >= floor))
            .collect();

        let mut entries = BTreeMap::new();
        let floor_only: Vec<usize> = (0..dates.len()).filter(|&i| passes_floor[i]).collect();

        for &code in codes {
            if code == ALL || entries.contains_key(code) {
                continue;
            }
            let indices = match table.cutoff_for(code, now)? {
                None => floor_only.clone(),
                Some(cutoff) => (0..dates.len())
                    .filter(|&i| passes_floor[i] && dates[i] >= cutoff)
                    .collect(),
            };
            entries.insert(code.to_string(), indices);
        }
        entries.insert(ALL.to_string(), floor_only);

        tracing::debug!(
            axis = %axis.id(),
            dates = dates.len(),
            codes = entries.len(),
            "built range index cache"
        );

        Ok(Self {
            axis_id: axis.id(),
            entries,
        })
    }

    /// Build entries for every code in `table`.
    pub fn build_all(
        axis: &DateAxis,
        table: &RangeTable,
        min_valid_date: Option<NaiveDate>,
        now: NaiveDate,
    ) -> Result<Self, RangeError> {
        let codes: Vec<&str> = table.codes().collect();
        Self::build(axis, table, &codes, min_valid_date, now)
    }

    /// Indices for `code`, falling back to the `ALL` entry when absent.
    pub fn indices(&self, code: &str) -> &[usize] {
        self.entries
            .get(code)
            .or_else(|| self.entries.get(ALL))
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Whether this cache was built for `axis`.
    pub fn is_for(&self, axis: &DateAxis) -> bool {
        self.axis_id == axis.id()
    }
}
