//! Indicator registry: display names, colors and threshold profiles.
//!
//! One static table keyed by indicator key. TOML files may override or add
//! entries; the built-in table covers the dashboard's standard indicators.

use crate::domain::SeriesStyle;
use crate::error::ConfigError;
use crate::signal::{PercentileProfile, ZScoreProfile};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSpec {
    pub display_name: String,
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percentile: Option<PercentileProfile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zscore: Option<ZScoreProfile>,
}

impl IndicatorSpec {
    fn new(display_name: &str, color: &str) -> Self {
        Self {
            display_name: display_name.to_string(),
            color: color.to_string(),
            percentile: None,
            zscore: None,
        }
    }

    fn with_percentile(mut self, profile: PercentileProfile) -> Self {
        self.percentile = Some(profile);
        self
    }

    fn with_zscore(mut self, bullish: f64, bearish: f64, invert_colors: bool) -> Self {
        self.zscore = Some(ZScoreProfile {
            bullish_threshold: bullish,
            bearish_threshold: bearish,
            invert_colors,
        });
        self
    }

    pub fn style(&self) -> SeriesStyle {
        SeriesStyle::colored(self.color.clone())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndicatorRegistry {
    #[serde(default)]
    pub indicators: BTreeMap<String, IndicatorSpec>,
}

impl IndicatorRegistry {
    /// Load overrides from a TOML file and merge them over the defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse overrides from a TOML string and merge them over the defaults.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let overrides: IndicatorRegistry = toml::from_str(content)?;
        for (key, spec) in &overrides.indicators {
            if let Some(p) = &spec.percentile {
                validate_percentile(key, p)?;
            }
        }
        let mut registry = Self::default_dashboard();
        registry.merge(overrides);
        Ok(registry)
    }

    /// Standard macro-liquidity and credit indicators.
    pub fn default_dashboard() -> Self {
        let mut indicators = BTreeMap::new();
        let mut add = |key: &str, spec: IndicatorSpec| {
            indicators.insert(key.to_string(), spec);
        };

        add(
            "gli_total",
            IndicatorSpec::new("Global Liquidity Index", "#00d4ff")
                .with_percentile(PercentileProfile::new(80.0, 20.0))
                .with_zscore(1.0, -1.0, false),
        );
        add(
            "fed_net_liquidity",
            IndicatorSpec::new("Fed Net Liquidity", "#3b82f6")
                .with_percentile(PercentileProfile::new(75.0, 25.0))
                .with_zscore(1.0, -1.0, false),
        );
        add(
            "m2_global",
            IndicatorSpec::new("Global M2", "#10b981")
                .with_percentile(PercentileProfile::new(75.0, 25.0))
                .with_zscore(1.0, -1.0, false),
        );
        add(
            "vix",
            IndicatorSpec::new("VIX", "#ef4444")
                .with_percentile(PercentileProfile::inverted(20.0, 80.0))
                .with_zscore(-1.0, 1.5, true),
        );
        add(
            "move",
            IndicatorSpec::new("MOVE Index", "#f97316")
                .with_percentile(PercentileProfile::inverted(20.0, 80.0))
                .with_zscore(-1.0, 1.5, true),
        );
        add(
            "hy_spread",
            IndicatorSpec::new("High Yield Spread", "#a855f7")
                .with_percentile(PercentileProfile::inverted(25.0, 75.0))
                .with_zscore(-1.0, 1.0, true),
        );
        add(
            "ig_spread",
            IndicatorSpec::new("Investment Grade Spread", "#8b5cf6")
                .with_percentile(PercentileProfile::inverted(25.0, 75.0))
                .with_zscore(-1.0, 1.0, true),
        );
        add(
            "dxy",
            IndicatorSpec::new("US Dollar Index", "#eab308")
                .with_percentile(PercentileProfile::inverted(25.0, 75.0)),
        );
        add(
            "tga",
            IndicatorSpec::new("Treasury General Account", "#64748b").with_zscore(-1.0, 1.0, true),
        );
        add(
            "rrp",
            IndicatorSpec::new("Reverse Repo Facility", "#94a3b8").with_zscore(-1.0, 1.0, true),
        );
        add("spx", IndicatorSpec::new("S&P 500", "#22c55e"));
        add("btc", IndicatorSpec::new("Bitcoin", "#f59e0b"));

        Self { indicators }
    }

    /// Replace or add entries from `other`.
    pub fn merge(&mut self, other: IndicatorRegistry) {
        self.indicators.extend(other.indicators);
    }

    pub fn get(&self, key: &str) -> Option<&IndicatorSpec> {
        self.indicators.get(key)
    }

    /// Display name, falling back to the key itself.
    pub fn display_name<'a>(&'a self, key: &'a str) -> &'a str {
        self.get(key).map_or(key, |s| s.display_name.as_str())
    }

    pub fn style(&self, key: &str) -> SeriesStyle {
        self.get(key).map(IndicatorSpec::style).unwrap_or_default()
    }

    /// Keys that carry any threshold profile, in key order.
    pub fn classified_keys(&self) -> impl Iterator<Item = &str> {
        self.indicators
            .iter()
            .filter(|(_, s)| s.percentile.is_some() || s.zscore.is_some())
            .map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.indicators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indicators.is_empty()
    }
}

fn validate_percentile(key: &str, p: &PercentileProfile) -> Result<(), ConfigError> {
    let in_range = |x: f64| (0.0..=100.0).contains(&x);
    if !in_range(p.bullish_pct) || !in_range(p.bearish_pct) {
        return Err(ConfigError::Invalid(format!(
            "indicator '{key}': percentile thresholds must be within 0..=100"
        )));
    }
    Ok(())
}
