//! DateAxis: the shared, immutable date column of one snapshot.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Date format used by the upstream bundle.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Content fingerprint of a date axis.
///
/// Two axes with the same dates in the same order share an `AxisId`, so
/// caches keyed by it survive a refresh that re-sends identical dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AxisId(pub [u8; 32]);

impl AxisId {
    pub fn of(dates: &[NaiveDate]) -> Self {
        let mut hasher = blake3::Hasher::new();
        for date in dates {
            hasher.update(&date.to_string().into_bytes());
            hasher.update(b"\n");
        }
        Self(*hasher.finalize().as_bytes())
    }
}

impl fmt::Display for AxisId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0[..8] {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

/// Ordered date axis shared by every series of a snapshot.
///
/// Cloning is cheap (the dates live behind an `Arc`). Index `i` refers to the
/// same date in every series built on this axis.
#[derive(Debug, Clone)]
pub struct DateAxis {
    dates: Arc<[NaiveDate]>,
    id: AxisId,
}

impl DateAxis {
    pub fn new(dates: Vec<NaiveDate>) -> Self {
        let id = AxisId::of(&dates);
        Self {
            dates: dates.into(),
            id,
        }
    }

    /// Parse `YYYY-MM-DD` strings.
    ///
    /// Unparseable entries become `NaiveDate::MIN` so positions stay aligned
    /// with the value columns; the min-valid-date floor excludes them later.
    pub fn parse<S: AsRef<str>>(raw: &[S]) -> Self {
        let mut bad = 0usize;
        let dates = raw
            .iter()
            .map(|s| {
                NaiveDate::parse_from_str(s.as_ref().trim(), DATE_FORMAT).unwrap_or_else(|_| {
                    bad += 1;
                    NaiveDate::MIN
                })
            })
            .collect();
        if bad > 0 {
            tracing::debug!(bad, "date axis contains unparseable entries");
        }
        Self::new(dates)
    }

    pub fn id(&self) -> AxisId {
        self.id
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<NaiveDate> {
        self.dates.get(index).copied()
    }

    pub fn last(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }

    /// True when dates never decrease.
    pub fn is_sorted(&self) -> bool {
        self.dates.windows(2).all(|w| w[0] <= w[1])
    }
}

impl PartialEq for DateAxis {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for DateAxis {}
