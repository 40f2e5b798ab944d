//! SeriesFilter: trims a batch of series sharing one axis to a range.
//!
//! For the `ALL` range the batch is additionally auto-trimmed: leading dates
//! where every series is null or exactly zero are dropped, so a source that
//! starts decades after another does not render as a long flat run. The
//! min-valid-date floor is applied first, auto-trim second.

use crate::domain::{valid, DateAxis, Series, Trace};
use crate::error::RangeError;
use crate::range::{RangeTable, ALL};
use crate::range_cache::RangeIndexCache;
use chrono::NaiveDate;
use std::borrow::Cow;

#[derive(Debug, Clone)]
pub struct SeriesFilter {
    table: RangeTable,
    min_valid_date: Option<NaiveDate>,
    now: NaiveDate,
}

impl SeriesFilter {
    pub fn new(table: RangeTable, min_valid_date: Option<NaiveDate>, now: NaiveDate) -> Self {
        Self {
            table,
            min_valid_date,
            now,
        }
    }

    /// Trim `batch` to `code`.
    ///
    /// With a cache built for the batch's axis, the cached indices are used
    /// (unknown codes fall back to `ALL`). Without one, the code is resolved
    /// through the range table and an unknown code is an error.
    ///
    /// Series that are not aligned to the batch axis come back as empty
    /// traces; the rest of the batch is unaffected.
    pub fn apply(
        &self,
        batch: &[Series],
        code: &str,
        cache: Option<&RangeIndexCache>,
    ) -> Result<Vec<Trace>, RangeError> {
        let Some(first) = batch.first() else {
            return Ok(Vec::new());
        };
        let axis = &first.axis;

        let indices: Cow<'_, [usize]> = match cache {
            Some(c) if c.is_for(axis) => Cow::Borrowed(c.indices(code)),
            other => {
                if other.is_some() {
                    tracing::debug!(axis = %axis.id(), "range cache built for another axis, resolving directly");
                }
                Cow::Owned(self.resolve(axis, code)?)
            }
        };

        let members: Vec<&Series> = batch.iter().filter(|s| belongs(s, axis)).collect();
        let indices: &[usize] = if code == ALL {
            let start = auto_trim_start(&members, &indices).unwrap_or(0);
            &indices[start..]
        } else {
            &indices
        };

        Ok(batch
            .iter()
            .map(|s| {
                if belongs(s, axis) {
                    project(s, indices)
                } else {
                    tracing::debug!(series = %s.name, "series not aligned to batch axis");
                    Trace::empty(s.name.clone(), s.style.clone())
                }
            })
            .collect())
    }

    /// Indices for `code` computed without a cache.
    pub fn resolve(&self, axis: &DateAxis, code: &str) -> Result<Vec<usize>, RangeError> {
        let cutoff = self.table.cutoff_for(code, self.now)?;
        Ok(axis
            .dates()
            .iter()
            .enumerate()
            .filter(|(_, d)| self.min_valid_date.map_or(true, |floor| **d >= floor))
            .filter(|(_, d)| cutoff.map_or(true, |c| **d >= c))
            .map(|(i, _)| i)
            .collect())
    }
}

/// Position within `indices` of the first date where any series has a
/// non-null, non-zero value. `None` when no such date exists.
pub fn auto_trim_start(batch: &[&Series], indices: &[usize]) -> Option<usize> {
    indices.iter().position(|&i| {
        batch
            .iter()
            .any(|s| matches!(s.value_at(i), Some(v) if v != 0.0))
    })
}

fn belongs(series: &Series, axis: &DateAxis) -> bool {
    series.is_aligned() && series.axis == *axis
}

fn project(series: &Series, indices: &[usize]) -> Trace {
    let dates = series.axis.dates();
    Trace {
        x: indices.iter().map(|&i| dates[i]).collect(),
        y: indices.iter().map(|&i| valid(series.values[i])).collect(),
        name: series.name.clone(),
        style: series.style.clone(),
    }
}
