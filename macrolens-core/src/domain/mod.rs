//! Domain types for MacroLens

pub mod axis;
pub mod series;
pub mod trace;

pub use axis::{AxisId, DateAxis, DATE_FORMAT};
pub use series::{valid, Points, Series, SeriesStyle};
pub use trace::Trace;
