//! Lag correlation search.
//!
//! For each candidate lag `k` the lead series at `i` is paired with the
//! target at `i + k`; a positive `k` means the lead moves first. The search
//! visits `min_lag..=max_lag` on a `step` grid and keeps the first strict
//! maximum, so ties resolve to the smallest lag.

use crate::domain::valid;
use crate::transforms::correlation::pearson_pairs;
use serde::{Deserialize, Serialize};

/// Bounds and granularity of a lag search, in observations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LagSearch {
    pub min_lag: i64,
    pub max_lag: i64,
    /// Grid spacing. Coarser grids trade resolution for speed; 0 reads as 1.
    pub step: usize,
}

impl Default for LagSearch {
    fn default() -> Self {
        Self {
            min_lag: 0,
            max_lag: 120,
            step: 5,
        }
    }
}

impl LagSearch {
    pub fn new(min_lag: i64, max_lag: i64, step: usize) -> Self {
        Self {
            min_lag,
            max_lag,
            step,
        }
    }

    /// Candidate lags in ascending order.
    pub fn lags(&self) -> impl Iterator<Item = i64> {
        let step = self.step.max(1) as i128;
        let min = self.min_lag as i128;
        let span = self.max_lag as i128 - min;
        let count = if span >= 0 { span / step + 1 } else { 0 };
        (0..count).map(move |j| (min + j * step) as i64)
    }

    /// The grid restricted to `lo..=hi`, still aligned on `min_lag`.
    ///
    /// An empty intersection yields a search with no candidates.
    pub fn clamped(&self, lo: i64, hi: i64) -> Self {
        let step = self.step.max(1) as i128;
        let min = self.min_lag as i128;
        let skip = (lo as i128 - min).max(0);
        let start = min + (skip + step - 1) / step * step;
        let end = (self.max_lag as i128).min(hi as i128);
        if start > end {
            return Self {
                min_lag: 1,
                max_lag: 0,
                step: self.step,
            };
        }
        Self {
            min_lag: start as i64,
            max_lag: end as i64,
            step: self.step,
        }
    }

    /// The grid limited to lags that can pair at least one index of `lead`
    /// with `target`.
    fn for_lengths(&self, lead: usize, target: usize) -> Self {
        let lo = -i64::try_from(lead).unwrap_or(i64::MAX);
        let hi = i64::try_from(target).unwrap_or(i64::MAX);
        self.clamped(lo, hi)
    }
}

/// Outcome of a lag search.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LagResult {
    pub lag: i64,
    pub correlation: f64,
    pub samples: usize,
}

impl LagResult {
    /// Result when no lag had at least two usable pairs.
    pub fn no_data() -> Self {
        Self {
            lag: 0,
            correlation: -1.0,
            samples: 0,
        }
    }

    pub fn is_no_data(&self) -> bool {
        self.samples == 0
    }
}

/// One evaluated lag of a correlogram.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LagPoint {
    pub lag: i64,
    pub correlation: f64,
    pub samples: usize,
}

/// Correlation of `lead[i]` with `target[i + lag]` over in-range,
/// both-valid indices.
pub fn correlation_at(lead: &[Option<f64>], target: &[Option<f64>], lag: i64) -> LagPoint {
    let n_lead = lead.len() as i64;
    let n_target = target.len() as i64;
    let lo = lag.saturating_neg().max(0);
    let hi = n_lead.min(n_target.saturating_sub(lag));

    let pairs = (lo..hi.max(lo)).filter_map(|i| {
        let x = valid(lead[i as usize])?;
        let y = valid(target[(i + lag) as usize])?;
        Some((x, y))
    });
    let (correlation, samples) = pearson_pairs(pairs);
    LagPoint {
        lag,
        correlation,
        samples,
    }
}

/// Every lag on the search grid with its correlation and pair count.
///
/// Grid lags that cannot pair any index are left out.
pub fn correlogram(lead: &[Option<f64>], target: &[Option<f64>], search: &LagSearch) -> Vec<LagPoint> {
    search
        .for_lengths(lead.len(), target.len())
        .lags()
        .map(|k| correlation_at(lead, target, k))
        .collect()
}

/// Lag on the search grid maximizing correlation.
///
/// Lags with fewer than two pairs are skipped. When none qualifies the
/// result is [`LagResult::no_data`].
pub fn find_optimal_lag(lead: &[Option<f64>], target: &[Option<f64>], search: &LagSearch) -> LagResult {
    let mut best: Option<LagPoint> = None;
    for k in search.for_lengths(lead.len(), target.len()).lags() {
        let point = correlation_at(lead, target, k);
        if point.samples < 2 {
            continue;
        }
        if best.map_or(true, |b| point.correlation > b.correlation) {
            best = Some(point);
        }
    }

    match best {
        Some(b) => LagResult {
            lag: b.lag,
            correlation: b.correlation,
            samples: b.samples,
        },
        None => {
            tracing::debug!(
                lead = lead.len(),
                target = target.len(),
                "lag search found no usable pairs"
            );
            LagResult::no_data()
        }
    }
}
