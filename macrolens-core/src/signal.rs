//! Signal classification and net stance.
//!
//! An indicator's latest reading is mapped to one of four states against a
//! threshold profile, either on its percentile rank or directly on its
//! Z-score. Inverted profiles are for indicators where low readings are
//! favorable (volatility, credit spreads).

use crate::domain::{valid, Series};
use crate::transforms::percentile_rank;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalState {
    Bullish,
    Bearish,
    Neutral,
    Warning,
}

impl SignalState {
    /// Bullish and bearish runs are shaded on charts; the others are not.
    pub fn is_renderable(self) -> bool {
        matches!(self, SignalState::Bullish | SignalState::Bearish)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SignalState::Bullish => "bullish",
            SignalState::Bearish => "bearish",
            SignalState::Neutral => "neutral",
            SignalState::Warning => "warning",
        }
    }

    /// Lenient parse for upstream labels. Unknown labels read as neutral.
    pub fn parse_lenient(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "bullish" | "bull" => SignalState::Bullish,
            "bearish" | "bear" => SignalState::Bearish,
            "warning" | "warn" => SignalState::Warning,
            "neutral" => SignalState::Neutral,
            other => {
                tracing::debug!(label = other, "unrecognized signal label, reading as neutral");
                SignalState::Neutral
            }
        }
    }
}

impl fmt::Display for SignalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Percentile bands for one indicator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PercentileProfile {
    pub bullish_pct: f64,
    pub bearish_pct: f64,
    #[serde(default)]
    pub invert: bool,
}

impl PercentileProfile {
    pub fn new(bullish_pct: f64, bearish_pct: f64) -> Self {
        Self {
            bullish_pct,
            bearish_pct,
            invert: false,
        }
    }

    pub fn inverted(bullish_pct: f64, bearish_pct: f64) -> Self {
        Self {
            bullish_pct,
            bearish_pct,
            invert: true,
        }
    }
}

impl Default for PercentileProfile {
    fn default() -> Self {
        Self::new(80.0, 20.0)
    }
}

/// Z-score bands for one indicator, used when percentiles are unavailable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZScoreProfile {
    pub bullish_threshold: f64,
    pub bearish_threshold: f64,
    #[serde(default)]
    pub invert_colors: bool,
}

impl Default for ZScoreProfile {
    fn default() -> Self {
        Self {
            bullish_threshold: 1.0,
            bearish_threshold: -1.0,
            invert_colors: false,
        }
    }
}

fn three_way(x: f64, bullish: f64, bearish: f64, invert: bool) -> SignalState {
    if invert {
        if x <= bullish {
            SignalState::Bullish
        } else if x >= bearish {
            SignalState::Bearish
        } else {
            SignalState::Neutral
        }
    } else if x >= bullish {
        SignalState::Bullish
    } else if x <= bearish {
        SignalState::Bearish
    } else {
        SignalState::Neutral
    }
}

/// Classify a reading by its percentile rank.
///
/// A missing or non-finite value or percentile is neutral.
pub fn classify(value: Option<f64>, percentile: Option<f64>, profile: &PercentileProfile) -> SignalState {
    match (valid(value), valid(percentile)) {
        (Some(_), Some(pct)) => three_way(pct, profile.bullish_pct, profile.bearish_pct, profile.invert),
        _ => SignalState::Neutral,
    }
}

/// Classify a Z-score directly.
pub fn classify_zscore(z: Option<f64>, profile: &ZScoreProfile) -> SignalState {
    match valid(z) {
        Some(z) => three_way(
            z,
            profile.bullish_threshold,
            profile.bearish_threshold,
            profile.invert_colors,
        ),
        None => SignalState::Neutral,
    }
}

/// Per-date labels from a Z-score series; missing points stay unlabeled.
pub fn label_series(zscores: &[Option<f64>], profile: &ZScoreProfile) -> Vec<Option<SignalState>> {
    zscores
        .iter()
        .map(|z| valid(*z).map(|z| classify_zscore(Some(z), profile)))
        .collect()
}

/// Net stance across indicators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stance {
    pub state: SignalState,
    pub bulls: usize,
    pub bears: usize,
    pub total: usize,
}

/// Bullish only when bulls lead bears by more than one, bearish likewise;
/// anything closer is neutral.
pub fn aggregate_stance<I>(states: I) -> Stance
where
    I: IntoIterator<Item = SignalState>,
{
    let (mut bulls, mut bears, mut total) = (0usize, 0usize, 0usize);
    for s in states {
        total += 1;
        match s {
            SignalState::Bullish => bulls += 1,
            SignalState::Bearish => bears += 1,
            SignalState::Neutral | SignalState::Warning => {}
        }
    }
    let state = if bulls > bears + 1 {
        SignalState::Bullish
    } else if bears > bulls + 1 {
        SignalState::Bearish
    } else {
        SignalState::Neutral
    };
    Stance {
        state,
        bulls,
        bears,
        total,
    }
}

/// Classified latest observation of one indicator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSignal {
    pub key: String,
    pub state: SignalState,
    pub value: Option<f64>,
    pub percentile: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
}

/// Classify the latest valid observation of `series` by its percentile rank
/// within the series' own history.
pub fn latest_signal(key: &str, series: &Series, profile: &PercentileProfile) -> Option<IndicatorSignal> {
    let (index, value) = series.latest()?;
    let percentile = percentile_rank(&series.values, value);
    Some(IndicatorSignal {
        key: key.to_string(),
        state: classify(Some(value), percentile, profile),
        value: Some(value),
        percentile,
        date: series.axis.get(index),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DateAxis;

    #[test]
    fn percentile_bands() {
        let p = PercentileProfile::new(80.0, 20.0);
        assert_eq!(classify(Some(1.0), Some(85.0), &p), SignalState::Bullish);
        assert_eq!(classify(Some(1.0), Some(80.0), &p), SignalState::Bullish);
        assert_eq!(classify(Some(1.0), Some(20.0), &p), SignalState::Bearish);
        assert_eq!(classify(Some(1.0), Some(50.0), &p), SignalState::Neutral);
    }

    #[test]
    fn inverted_percentile_bands() {
        // VIX: low percentile is bullish.
        let p = PercentileProfile::inverted(20.0, 80.0);
        assert_eq!(classify(Some(12.0), Some(10.0), &p), SignalState::Bullish);
        assert_eq!(classify(Some(35.0), Some(90.0), &p), SignalState::Bearish);
        assert_eq!(classify(Some(18.0), Some(50.0), &p), SignalState::Neutral);
    }

    #[test]
    fn missing_inputs_are_neutral() {
        let p = PercentileProfile::default();
        assert_eq!(classify(None, Some(99.0), &p), SignalState::Neutral);
        assert_eq!(classify(Some(1.0), None, &p), SignalState::Neutral);
        assert_eq!(classify(Some(f64::NAN), Some(99.0), &p), SignalState::Neutral);
    }

    #[test]
    fn zscore_bands_and_inversion() {
        let z = ZScoreProfile::default();
        assert_eq!(classify_zscore(Some(1.5), &z), SignalState::Bullish);
        assert_eq!(classify_zscore(Some(-1.0), &z), SignalState::Bearish);
        assert_eq!(classify_zscore(Some(0.2), &z), SignalState::Neutral);
        assert_eq!(classify_zscore(None, &z), SignalState::Neutral);

        let inv = ZScoreProfile {
            bullish_threshold: -1.0,
            bearish_threshold: 1.0,
            invert_colors: true,
        };
        assert_eq!(classify_zscore(Some(-2.0), &inv), SignalState::Bullish);
        assert_eq!(classify_zscore(Some(2.0), &inv), SignalState::Bearish);
    }

    #[test]
    fn stance_needs_margin_of_two() {
        use SignalState::*;
        assert_eq!(aggregate_stance([Bullish, Bullish, Bearish]).state, Neutral);
        assert_eq!(aggregate_stance([Bullish, Bullish, Bullish, Bearish]).state, Bullish);
        assert_eq!(aggregate_stance([Bearish, Bearish, Neutral, Warning]).state, Bearish);
        assert_eq!(aggregate_stance([]).state, Neutral);

        let s = aggregate_stance([Bullish, Warning, Neutral]);
        assert_eq!((s.bulls, s.bears, s.total), (1, 0, 3));
    }

    #[test]
    fn label_series_leaves_gaps_unlabeled() {
        let labels = label_series(&[Some(2.0), None, Some(-2.0), Some(0.0)], &ZScoreProfile::default());
        assert_eq!(
            labels,
            vec![
                Some(SignalState::Bullish),
                None,
                Some(SignalState::Bearish),
                Some(SignalState::Neutral)
            ]
        );
    }

    #[test]
    fn latest_signal_ranks_against_history() {
        let base = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let axis = DateAxis::new((0..5).map(|i| base + chrono::Duration::days(i)).collect());
        let series = Series::new(
            "gli",
            axis,
            vec![Some(1.0), Some(2.0), Some(3.0), Some(10.0), None],
        );
        let sig = latest_signal("gli", &series, &PercentileProfile::default()).unwrap();
        assert_eq!(sig.value, Some(10.0));
        assert_eq!(sig.percentile, Some(75.0));
        assert_eq!(sig.state, SignalState::Neutral);
        assert_eq!(sig.date, Some(base + chrono::Duration::days(3)));
    }

    #[test]
    fn lenient_labels() {
        assert_eq!(SignalState::parse_lenient(" Bullish "), SignalState::Bullish);
        assert_eq!(SignalState::parse_lenient("WARNING"), SignalState::Warning);
        assert_eq!(SignalState::parse_lenient("???"), SignalState::Neutral);
    }

    #[test]
    fn states_serialize_lowercase() {
        assert_eq!(serde_json::to_string(&SignalState::Bearish).unwrap(), "\"bearish\"");
    }
}
