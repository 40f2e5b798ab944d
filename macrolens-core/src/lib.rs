//! MacroLens Core: time-series signal and regime analytics for a
//! macro-liquidity dashboard.
//!
//! This crate contains:
//! - Range resolution and per-axis range index caching
//! - Range filtering with ALL-range auto-trim
//! - Stateless transforms (Rate-of-Change, Z-score, Pearson, shift, percentile)
//! - Regime encoding into shaded spans
//! - Lag correlation search
//! - Signal classification and net stance
//! - The `Dashboard` entry point with memoized derivations

pub mod config;
pub mod dashboard;
pub mod domain;
pub mod error;
pub mod filter;
pub mod lag;
pub mod memo;
pub mod range;
pub mod range_cache;
pub mod regime;
pub mod registry;
pub mod signal;
pub mod snapshot;
pub mod transforms;

pub use config::EngineConfig;
pub use dashboard::{Dashboard, RegimeView, SignalBoard, ViewMode};
pub use error::{ConfigError, MacroLensError, RangeError, SnapshotError};
pub use registry::IndicatorRegistry;
pub use snapshot::Snapshot;
