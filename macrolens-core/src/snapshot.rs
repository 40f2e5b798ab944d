//! Dashboard snapshot: the immutable input of one refresh.
//!
//! The upstream bundle is JSON:
//!
//! ```json
//! {
//!   "dates": ["2024-01-05", "2024-01-12"],
//!   "series": { "gli_total": [101.2, null], "vix": [13.1, 12.8] },
//!   "signals": { "vix": { "latest": { "state": "bullish", "value": 12.8, "percentile": 18.0 } } }
//! }
//! ```
//!
//! Decoding is lenient: a series that is not an array is dropped, and
//! non-numeric entries become missing observations.

use crate::domain::{DateAxis, Series};
use crate::error::SnapshotError;
use crate::registry::IndicatorRegistry;
use crate::signal::{IndicatorSignal, SignalState};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SnapshotBundle {
    #[serde(default)]
    pub dates: Vec<String>,
    #[serde(default)]
    pub series: BTreeMap<String, Value>,
    #[serde(default)]
    pub signals: BTreeMap<String, UpstreamIndicator>,
}

/// Backend-precomputed signal for one indicator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamIndicator {
    pub latest: UpstreamLatest,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamLatest {
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub value: Option<f64>,
    #[serde(default)]
    pub percentile: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct Snapshot {
    axis: DateAxis,
    series: BTreeMap<String, Series>,
    upstream: BTreeMap<String, IndicatorSignal>,
}

impl Snapshot {
    pub fn new(axis: DateAxis) -> Self {
        Self {
            axis,
            series: BTreeMap::new(),
            upstream: BTreeMap::new(),
        }
    }

    /// Add a series under `key`. The series is rebound to the snapshot axis.
    pub fn with_series(mut self, key: impl Into<String>, mut series: Series) -> Self {
        series.axis = self.axis.clone();
        self.series.insert(key.into(), series);
        self
    }

    pub fn with_upstream_signal(mut self, signal: IndicatorSignal) -> Self {
        self.upstream.insert(signal.key.clone(), signal);
        self
    }

    pub fn from_json(json: &str, registry: &IndicatorRegistry) -> Result<Self, SnapshotError> {
        let bundle: SnapshotBundle = serde_json::from_str(json)?;
        Ok(Self::from_bundle(bundle, registry))
    }

    pub fn from_bundle(bundle: SnapshotBundle, registry: &IndicatorRegistry) -> Self {
        let axis = DateAxis::parse(&bundle.dates);
        if !axis.is_sorted() {
            tracing::warn!(axis = %axis.id(), "snapshot dates are not in ascending order");
        }

        let mut snapshot = Self::new(axis.clone());
        for (key, raw) in bundle.series {
            let Some(values) = decode_values(&key, raw) else {
                continue;
            };
            if values.len() != axis.len() {
                tracing::warn!(
                    series = %key,
                    values = values.len(),
                    dates = axis.len(),
                    "series length does not match date axis"
                );
            }
            let series = Series::new(registry.display_name(&key), axis.clone(), values)
                .with_style(registry.style(&key));
            snapshot.series.insert(key, series);
        }

        for (key, upstream) in bundle.signals {
            let latest = upstream.latest;
            let state = latest
                .state
                .as_deref()
                .map_or(SignalState::Neutral, SignalState::parse_lenient);
            snapshot.upstream.insert(
                key.clone(),
                IndicatorSignal {
                    key,
                    state,
                    value: latest.value,
                    percentile: latest.percentile,
                    date: None,
                },
            );
        }

        tracing::debug!(
            axis = %snapshot.axis.id(),
            dates = snapshot.axis.len(),
            series = snapshot.series.len(),
            signals = snapshot.upstream.len(),
            "decoded snapshot"
        );
        snapshot
    }

    pub fn axis(&self) -> &DateAxis {
        &self.axis
    }

    pub fn series(&self, key: &str) -> Option<&Series> {
        self.series.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.series.keys().map(|k| k.as_str())
    }

    pub fn upstream_signal(&self, key: &str) -> Option<&IndicatorSignal> {
        self.upstream.get(key)
    }

    pub fn upstream_keys(&self) -> impl Iterator<Item = &str> {
        self.upstream.keys().map(|k| k.as_str())
    }
}

fn decode_values(key: &str, raw: Value) -> Option<Vec<Option<f64>>> {
    match raw {
        Value::Array(items) => Some(items.iter().map(Value::as_f64).collect()),
        other => {
            tracing::warn!(series = %key, kind = value_kind(&other), "series is not an array, dropping");
            None
        }
    }
}

fn value_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const BUNDLE: &str = r#"{
        "dates": ["2024-01-05", "2024-01-12", "2024-01-19"],
        "series": {
            "gli_total": [100.0, null, 102.5],
            "vix": [13.0, "n/a", 12.0],
            "broken": {"oops": true}
        },
        "signals": {
            "vix": { "latest": { "state": "Bullish", "value": 12.0, "percentile": 15.0 } },
            "hy_spread": { "latest": { "value": 3.1 } }
        }
    }"#;

    #[test]
    fn decodes_bundle() {
        let snap = Snapshot::from_json(BUNDLE, &IndicatorRegistry::default_dashboard()).unwrap();
        assert_eq!(snap.axis().len(), 3);
        assert_eq!(snap.axis().get(0), NaiveDate::from_ymd_opt(2024, 1, 5));

        let gli = snap.series("gli_total").unwrap();
        assert_eq!(gli.values, vec![Some(100.0), None, Some(102.5)]);
        assert_eq!(gli.name, "Global Liquidity Index");
        assert_eq!(gli.style.color.as_deref(), Some("#00d4ff"));

        assert_eq!(snap.series("vix").unwrap().values[1], None);
        assert!(snap.series("broken").is_none());
    }

    #[test]
    fn decodes_upstream_signals() {
        let snap = Snapshot::from_json(BUNDLE, &IndicatorRegistry::default_dashboard()).unwrap();
        let vix = snap.upstream_signal("vix").unwrap();
        assert_eq!(vix.state, SignalState::Bullish);
        assert_eq!(vix.percentile, Some(15.0));
        assert_eq!(snap.upstream_signal("hy_spread").unwrap().state, SignalState::Neutral);
    }

    #[test]
    fn invalid_json_is_an_error() {
        assert!(Snapshot::from_json("{", &IndicatorRegistry::default()).is_err());
    }

    #[test]
    fn missing_sections_default_to_empty() {
        let snap = Snapshot::from_json(r#"{"dates": []}"#, &IndicatorRegistry::default()).unwrap();
        assert!(snap.axis().is_empty());
        assert_eq!(snap.keys().count(), 0);
    }

    #[test]
    fn builder_rebinds_series_to_axis() {
        let axis = DateAxis::parse(&["2024-01-01", "2024-01-02"]);
        let other = DateAxis::parse(&["2000-01-01", "2000-01-02"]);
        let snap = Snapshot::new(axis.clone()).with_series("x", Series::new("x", other, vec![None, None]));
        assert_eq!(snap.series("x").unwrap().axis, axis);
    }
}
