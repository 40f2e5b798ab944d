//! Error taxonomy.
//!
//! The engine degrades instead of failing on bad data: transforms return
//! empty or neutral results. Errors are reserved for configuration bugs
//! (unknown range codes, unreadable config files) and unparseable bundles.

use thiserror::Error;

/// Range resolution errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RangeError {
    #[error("unknown range code '{code}'")]
    UnknownRange { code: String },
}

/// Configuration loading and validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Snapshot bundle decoding errors.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("failed to parse snapshot bundle: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Umbrella error for callers that drive the whole engine.
#[derive(Debug, Error)]
pub enum MacroLensError {
    #[error(transparent)]
    Range(#[from] RangeError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    #[error("unknown series '{key}'")]
    UnknownSeries { key: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_range_message_names_code() {
        let err = RangeError::UnknownRange { code: "7Y".into() };
        assert_eq!(err.to_string(), "unknown range code '7Y'");
    }

    #[test]
    fn range_error_converts_into_umbrella() {
        let err: MacroLensError = RangeError::UnknownRange { code: "X".into() }.into();
        assert!(matches!(err, MacroLensError::Range(_)));
    }
}
