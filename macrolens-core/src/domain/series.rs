//! Series types: raw aligned series and derived point lists.

use super::axis::DateAxis;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Presentation metadata carried through filtering untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeriesStyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub yaxis: Option<String>,
}

impl SeriesStyle {
    pub fn colored(color: impl Into<String>) -> Self {
        Self {
            color: Some(color.into()),
            ..Self::default()
        }
    }
}

/// A named value column aligned to a [`DateAxis`].
///
/// `None` means "no observation" and is never read as zero.
#[derive(Debug, Clone)]
pub struct Series {
    pub name: String,
    pub axis: DateAxis,
    pub values: Vec<Option<f64>>,
    pub style: SeriesStyle,
}

impl Series {
    pub fn new(name: impl Into<String>, axis: DateAxis, values: Vec<Option<f64>>) -> Self {
        Self {
            name: name.into(),
            axis,
            values,
            style: SeriesStyle::default(),
        }
    }

    pub fn with_style(mut self, style: SeriesStyle) -> Self {
        self.style = style;
        self
    }

    /// Whether the value column has exactly one entry per axis date.
    pub fn is_aligned(&self) -> bool {
        self.values.len() == self.axis.len()
    }

    /// Value at `index`, filtered through [`valid`].
    pub fn value_at(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied().and_then(valid)
    }

    /// Index and value of the last valid observation.
    pub fn latest(&self) -> Option<(usize, f64)> {
        self.values
            .iter()
            .enumerate()
            .rev()
            .find_map(|(i, v)| valid(*v).map(|x| (i, x)))
    }
}

/// A derived, gap-free sequence of dated values.
///
/// Transforms that skip points (ROC, date shift) produce this instead of a
/// `Series`: the output is shorter than the input and no longer shares the
/// snapshot axis.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Points {
    pub dates: Vec<NaiveDate>,
    pub values: Vec<f64>,
}

impl Points {
    pub fn with_capacity(n: usize) -> Self {
        Self {
            dates: Vec::with_capacity(n),
            values: Vec::with_capacity(n),
        }
    }

    pub fn push(&mut self, date: NaiveDate, value: f64) {
        self.dates.push(date);
        self.values.push(value);
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, f64)> + '_ {
        self.dates.iter().copied().zip(self.values.iter().copied())
    }
}

/// An observation is valid when present and finite.
#[inline]
pub fn valid(v: Option<f64>) -> Option<f64> {
    v.filter(|x| x.is_finite())
}
