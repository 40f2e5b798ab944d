//! Dashboard: the engine's entry point for one refresh.
//!
//! A [`Snapshot`] and explicit parameters (range code, view mode, "now") go
//! in; traces, regime shading, signals and lag results come out. Derived
//! columns and range caches are memoized by input fingerprint, so repeated
//! queries against an unchanged snapshot reuse earlier work and a changed
//! snapshot never sees stale results.

use crate::config::EngineConfig;
use crate::domain::{DateAxis, Series, Trace};
use crate::error::{MacroLensError, RangeError};
use crate::filter::SeriesFilter;
use crate::lag::{correlogram, find_optimal_lag, LagPoint, LagResult, LagSearch};
use crate::memo::{Fingerprint, MemoStats, MemoTable};
use crate::range::ALL;
use crate::range_cache::RangeIndexCache;
use crate::regime::{self, RegimeSpan, RegimeSummary, ShadeRect};
use crate::registry::IndicatorRegistry;
use crate::signal::{
    aggregate_stance, classify_zscore, label_series, latest_signal, IndicatorSignal, Stance,
    ZScoreProfile,
};
use crate::snapshot::Snapshot;
use crate::transforms::{percentile_rank, rate_of_change_aligned, shift_series, zscore};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

const MEMO_CAPACITY: usize = 512;

/// How a series is presented before range filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    Raw,
    /// Rate-of-Change over the configured period.
    Roc,
    ZScore,
}

impl ViewMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ViewMode::Raw => "raw",
            ViewMode::Roc => "roc",
            ViewMode::ZScore => "zscore",
        }
    }
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ViewMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "raw" => Ok(ViewMode::Raw),
            "roc" => Ok(ViewMode::Roc),
            "zscore" | "z" => Ok(ViewMode::ZScore),
            other => Err(format!("unknown view mode '{other}' (expected raw, roc or zscore)")),
        }
    }
}

/// Regime shading for one indicator over one range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegimeView {
    pub key: String,
    pub spans: Vec<RegimeSpan>,
    pub shapes: Vec<ShadeRect>,
    pub summary: RegimeSummary,
}

/// Latest signal per classified indicator and the net stance across them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalBoard {
    pub signals: Vec<IndicatorSignal>,
    pub stance: Stance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DashboardStats {
    pub range_caches: MemoStats,
    pub derived: MemoStats,
    pub lags: MemoStats,
}

#[derive(Debug)]
pub struct Dashboard {
    config: EngineConfig,
    registry: IndicatorRegistry,
    range_caches: MemoTable<RangeIndexCache>,
    derived: MemoTable<Vec<Option<f64>>>,
    lags: MemoTable<LagResult>,
}

impl Dashboard {
    pub fn new(config: EngineConfig, registry: IndicatorRegistry) -> Self {
        Self {
            config,
            registry,
            range_caches: MemoTable::new("range_cache", MEMO_CAPACITY),
            derived: MemoTable::new("derived", MEMO_CAPACITY),
            lags: MemoTable::new("lag", MEMO_CAPACITY),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn registry(&self) -> &IndicatorRegistry {
        &self.registry
    }

    pub fn stats(&self) -> DashboardStats {
        DashboardStats {
            range_caches: self.range_caches.stats(),
            derived: self.derived.stats(),
            lags: self.lags.stats(),
        }
    }

    /// Range index cache for `axis` as of `now`, built on first use.
    pub fn range_cache(&mut self, axis: &DateAxis, now: NaiveDate) -> Result<Arc<RangeIndexCache>, RangeError> {
        let key = Fingerprint::builder("range_cache")
            .axis(axis.id())
            .i64(i64::from(now.num_days_from_ce()))
            .finish();
        let config = &self.config;
        self.range_caches.get_or_try_insert_with(key, || {
            RangeIndexCache::build_all(axis, &config.ranges, config.min_valid_date, now)
        })
    }

    /// `series` as presented under `view`, on the series' own axis.
    pub fn view_values(&mut self, series: &Series, view: ViewMode) -> Arc<Vec<Option<f64>>> {
        let period = self.config.roc_period;
        match view {
            ViewMode::Raw => Arc::new(series.values.clone()),
            ViewMode::Roc => {
                let key = Fingerprint::builder("roc")
                    .fingerprint(Fingerprint::of_series(series))
                    .u64(period as u64)
                    .finish();
                self.derived
                    .get_or_insert_with(key, || rate_of_change_aligned(&series.values, period))
            }
            ViewMode::ZScore => {
                let key = Fingerprint::builder("zscore")
                    .fingerprint(Fingerprint::of_series(series))
                    .finish();
                self.derived.get_or_insert_with(key, || zscore(&series.values))
            }
        }
    }

    /// Traces for `keys` trimmed to `range`.
    ///
    /// Keys missing from the snapshot render as empty traces; the rest of
    /// the chart is unaffected. A range code missing from the configured
    /// table is shown as `ALL`.
    pub fn chart(
        &mut self,
        snapshot: &Snapshot,
        keys: &[&str],
        range: &str,
        view: ViewMode,
        now: NaiveDate,
    ) -> Result<Vec<Trace>, MacroLensError> {
        let axis = snapshot.axis();
        let range = self.effective_range(range);
        let cache = self.range_cache(axis, now)?;

        let mut batch = Vec::with_capacity(keys.len());
        for &key in keys {
            match snapshot.series(key) {
                Some(series) => {
                    let values = self.view_values(series, view);
                    batch.push(Series {
                        name: series.name.clone(),
                        axis: axis.clone(),
                        values: values.to_vec(),
                        style: series.style.clone(),
                    });
                }
                None => {
                    tracing::warn!(series = %key, "series missing from snapshot, rendering empty");
                    batch.push(
                        Series::new(self.registry.display_name(key), axis.clone(), Vec::new())
                            .with_style(self.registry.style(key)),
                    );
                }
            }
        }

        let traces = self.filter(now).apply(&batch, range, Some(cache.as_ref()))?;
        tracing::debug!(range, view = %view, traces = traces.len(), "chart built");
        Ok(traces)
    }

    /// Regime shading for `key` over `range`.
    ///
    /// Labels come from the indicator's Z-score profile (or the default
    /// profile) applied to its Z-scores over the full history.
    pub fn regimes(
        &mut self,
        snapshot: &Snapshot,
        key: &str,
        range: &str,
        now: NaiveDate,
    ) -> Result<RegimeView, MacroLensError> {
        let series = lookup(snapshot, key)?;
        let profile = self.zscore_profile(key);
        let range = self.effective_range(range);
        let cache = self.range_cache(snapshot.axis(), now)?;

        let z = self.view_values(series, ViewMode::ZScore);
        let zseries = Series::new(series.name.clone(), snapshot.axis().clone(), z.to_vec());
        let trimmed = self
            .filter(now)
            .apply(std::slice::from_ref(&zseries), range, Some(cache.as_ref()))?;

        let (dates, zs) = trimmed
            .into_iter()
            .next()
            .map(|t| (t.x, t.y))
            .unwrap_or_default();
        let spans = regime::encode(&dates, &label_series(&zs, &profile));
        Ok(RegimeView {
            key: key.to_string(),
            shapes: regime::to_shapes(&spans),
            summary: regime::summarize(&spans),
            spans,
        })
    }

    /// Latest signal for every indicator that has an upstream signal or a
    /// threshold profile, plus the net stance.
    ///
    /// Upstream signals win. Otherwise the percentile profile is used, then
    /// the Z-score profile. Indicators with neither, or without data, are
    /// left out.
    pub fn signals(&mut self, snapshot: &Snapshot) -> SignalBoard {
        let keys: BTreeSet<String> = self
            .registry
            .classified_keys()
            .chain(snapshot.upstream_keys())
            .map(str::to_string)
            .collect();

        let mut signals = Vec::with_capacity(keys.len());
        for key in &keys {
            if let Some(signal) = self.signal_for(snapshot, key) {
                signals.push(signal);
            }
        }
        let stance = aggregate_stance(signals.iter().map(|s| s.state));
        tracing::debug!(signals = signals.len(), stance = %stance.state, "signals classified");
        SignalBoard { signals, stance }
    }

    fn signal_for(&mut self, snapshot: &Snapshot, key: &str) -> Option<IndicatorSignal> {
        if let Some(upstream) = snapshot.upstream_signal(key) {
            return Some(upstream.clone());
        }
        let series = snapshot.series(key)?;
        let spec = self.registry.get(key)?.clone();

        if let Some(profile) = spec.percentile {
            return latest_signal(key, series, &profile);
        }
        let profile = spec.zscore?;
        let (index, value) = series.latest()?;
        let z = self.view_values(series, ViewMode::ZScore);
        Some(IndicatorSignal {
            key: key.to_string(),
            state: classify_zscore(z.get(index).copied().flatten(), &profile),
            value: Some(value),
            percentile: percentile_rank(&series.values, value),
            date: series.axis.get(index),
        })
    }

    /// Lag at which `lead` best predicts `target`, both presented under
    /// `view`. `search` defaults to the configured lag search.
    pub fn optimal_lag(
        &mut self,
        snapshot: &Snapshot,
        lead: &str,
        target: &str,
        view: ViewMode,
        search: Option<LagSearch>,
    ) -> Result<LagResult, MacroLensError> {
        let search = search.unwrap_or(self.config.lag);
        let lead_series = lookup(snapshot, lead)?;
        let target_series = lookup(snapshot, target)?;

        let key = Fingerprint::builder("lag")
            .fingerprint(Fingerprint::of_series(lead_series))
            .fingerprint(Fingerprint::of_series(target_series))
            .str(view.as_str())
            .u64(self.config.roc_period as u64)
            .i64(search.min_lag)
            .i64(search.max_lag)
            .u64(search.step as u64)
            .finish();
        if let Some(hit) = self.lags.get(&key) {
            return Ok(*hit);
        }

        let x = self.view_values(lead_series, view);
        let y = self.view_values(target_series, view);
        let result = self.lags.get_or_insert_with(key, || find_optimal_lag(&x, &y, &search));
        tracing::debug!(lead, target, lag = result.lag, correlation = result.correlation, "lag search");
        Ok(*result)
    }

    /// Correlation at every lag of `search` (or the configured search).
    pub fn correlogram(
        &mut self,
        snapshot: &Snapshot,
        lead: &str,
        target: &str,
        view: ViewMode,
        search: Option<LagSearch>,
    ) -> Result<Vec<LagPoint>, MacroLensError> {
        let search = search.unwrap_or(self.config.lag);
        let x = self.view_values(lookup(snapshot, lead)?, view);
        let y = self.view_values(lookup(snapshot, target)?, view);
        Ok(correlogram(&x, &y, &search))
    }

    /// `key` shifted by `offset_days` calendar days, for overlaying a lead
    /// indicator on its target.
    pub fn shifted(&self, snapshot: &Snapshot, key: &str, offset_days: i64) -> Result<Trace, MacroLensError> {
        let series = lookup(snapshot, key)?;
        let points = shift_series(series.axis.dates(), &series.values, offset_days);
        Ok(Trace::from_points(series.name.clone(), series.style.clone(), &points))
    }

    fn filter(&self, now: NaiveDate) -> SeriesFilter {
        SeriesFilter::new(self.config.ranges.clone(), self.config.min_valid_date, now)
    }

    fn effective_range<'a>(&self, range: &'a str) -> &'a str {
        if self.config.ranges.contains(range) {
            range
        } else {
            tracing::warn!(range, "range code not configured, showing ALL");
            ALL
        }
    }

    fn zscore_profile(&self, key: &str) -> ZScoreProfile {
        self.registry
            .get(key)
            .and_then(|spec| spec.zscore)
            .unwrap_or_default()
    }
}

fn lookup<'a>(snapshot: &'a Snapshot, key: &str) -> Result<&'a Series, MacroLensError> {
    snapshot
        .series(key)
        .ok_or_else(|| MacroLensError::UnknownSeries { key: key.to_string() })
}
