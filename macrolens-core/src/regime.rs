//! Regime encoding: per-date labels to contiguous labeled spans.
//!
//! A single left-to-right scan closes a block whenever the label changes.
//! Only renderable labels (bullish, bearish) produce spans; neutral, warning
//! and unlabeled runs still occupy their dates but are not emitted. Spans are
//! therefore maximal, ordered, non-overlapping, and never adjacent with the
//! same label.

use crate::signal::SignalState;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A maximal run of one renderable label, inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegimeSpan {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub label: SignalState,
}

/// Background rectangle for the chart renderer, in paper y-coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShadeRect {
    pub x0: NaiveDate,
    pub x1: NaiveDate,
    pub y0: f64,
    pub y1: f64,
    pub label: SignalState,
}

pub fn encode(dates: &[NaiveDate], labels: &[Option<SignalState>]) -> Vec<RegimeSpan> {
    let n = labels.len();
    if dates.len() != n {
        tracing::debug!(dates = dates.len(), labels = n, "regime encode: length mismatch");
        return Vec::new();
    }
    if n == 0 {
        return Vec::new();
    }

    let mut spans = Vec::new();
    let mut current = labels[0];
    let mut block_start = 0usize;

    for i in 1..=n {
        if i < n && labels[i] == current {
            continue;
        }
        if let Some(label) = current.filter(|l| l.is_renderable()) {
            spans.push(RegimeSpan {
                start: dates[block_start],
                end: dates[i - 1],
                label,
            });
        }
        if i < n {
            current = labels[i];
            block_start = i;
        }
    }
    spans
}

pub fn to_shapes(spans: &[RegimeSpan]) -> Vec<ShadeRect> {
    spans
        .iter()
        .map(|s| ShadeRect {
            x0: s.start,
            x1: s.end,
            y0: 0.0,
            y1: 1.0,
            label: s.label,
        })
        .collect()
}

/// Distinct regime blocks per label, and the most recent one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegimeSummary {
    pub blocks: BTreeMap<String, usize>,
    pub latest: Option<RegimeSpan>,
}

pub fn summarize(spans: &[RegimeSpan]) -> RegimeSummary {
    let mut blocks = BTreeMap::new();
    for s in spans {
        *blocks.entry(s.label.as_str().to_string()).or_insert(0) += 1;
    }
    RegimeSummary {
        blocks,
        latest: spans.last().copied(),
    }
}
