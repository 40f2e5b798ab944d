//! Renderer contract: chart-ready trace objects.

use super::series::{Points, SeriesStyle};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One line for the chart component: `{x, y, name, style}`.
///
/// `y` keeps `None` gaps so the renderer can break the line there.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Trace {
    pub x: Vec<NaiveDate>,
    pub y: Vec<Option<f64>>,
    pub name: String,
    #[serde(default)]
    pub style: SeriesStyle,
}

impl Trace {
    pub fn empty(name: impl Into<String>, style: SeriesStyle) -> Self {
        Self {
            x: Vec::new(),
            y: Vec::new(),
            name: name.into(),
            style,
        }
    }

    pub fn from_points(name: impl Into<String>, style: SeriesStyle, points: &Points) -> Self {
        Self {
            x: points.dates.clone(),
            y: points.values.iter().map(|v| Some(*v)).collect(),
            name: name.into(),
            style,
        }
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }
}
