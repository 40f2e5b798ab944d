//! Engine configuration, loadable from TOML.
//!
//! ```toml
//! default_range = "1Y"
//! min_valid_date = "1990-01-01"
//! roc_period = 12
//!
//! [lag]
//! min_lag = 0
//! max_lag = 90
//! step = 3
//!
//! [[ranges]]
//! code = "10Y"
//! span = { unit = "years", count = 10 }
//! ```
//!
//! Every section is optional. A `ranges` list replaces the default codes
//! (`ALL` is always kept).

use crate::error::ConfigError;
use crate::lag::LagSearch;
use crate::range::{RangeTable, ALL};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub ranges: RangeTable,
    /// Dates before this are placeholders and never shown.
    pub min_valid_date: Option<NaiveDate>,
    pub default_range: String,
    /// Observations between the two points of a Rate-of-Change.
    pub roc_period: usize,
    pub lag: LagSearch,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ranges: RangeTable::default(),
            // Epoch sentinels are 1970-01-01.
            min_valid_date: NaiveDate::from_ymd_opt(1970, 1, 2),
            default_range: ALL.to_string(),
            roc_period: 12,
            lag: LagSearch::default(),
        }
    }
}

impl EngineConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let mut config: EngineConfig = toml::from_str(content)?;
        // Re-run the table constructor so ALL is present after deserializing.
        config.ranges = RangeTable::new(config.ranges.defs().to_vec());
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.ranges.contains(&self.default_range) {
            return Err(ConfigError::Invalid(format!(
                "default_range '{}' is not a configured range code",
                self.default_range
            )));
        }
        if self.roc_period == 0 {
            return Err(ConfigError::Invalid("roc_period must be >= 1".into()));
        }
        if self.lag.min_lag > self.lag.max_lag {
            return Err(ConfigError::Invalid(format!(
                "lag.min_lag ({}) exceeds lag.max_lag ({})",
                self.lag.min_lag, self.lag.max_lag
            )));
        }
        if self.lag.step == 0 {
            tracing::warn!("lag.step = 0 is treated as 1");
        }
        Ok(())
    }
}
