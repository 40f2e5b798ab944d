//! Range resolution: symbolic range codes to cutoff dates.
//!
//! A range code ("1M", "1Y", "ALL", ...) names a trailing window ending at
//! "now". Windows are measured in calendar months or years, never in fixed
//! day counts: the cutoff keeps the day-of-month of `now`, and when that day
//! does not exist in the target month the excess rolls into the following
//! month (Mar 31 minus one month lands on Mar 3, or Mar 2 in a leap year).

use crate::error::RangeError;
use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};

/// Code of the unbounded range.
pub const ALL: &str = "ALL";

/// Length of a trailing window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "unit", content = "count", rename_all = "snake_case")]
pub enum RangeSpan {
    Months(u32),
    Years(u32),
    All,
}

impl RangeSpan {
    /// First date inside the window ending at `now`, or `None` for `All`.
    pub fn cutoff(self, now: NaiveDate) -> Option<NaiveDate> {
        match self {
            RangeSpan::All => None,
            RangeSpan::Months(n) => Some(months_back(now, n)),
            RangeSpan::Years(n) => Some(months_back(now, n.saturating_mul(12))),
        }
    }
}

/// A named range code and its window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeDef {
    pub code: String,
    pub span: RangeSpan,
}

impl RangeDef {
    pub fn new(code: impl Into<String>, span: RangeSpan) -> Self {
        Self {
            code: code.into(),
            span,
        }
    }
}

/// The set of range codes the dashboard offers.
///
/// Defaults to 1M, 3M, 6M, 1Y, 2Y, 3Y, 5Y and ALL; configuration may replace
/// or extend it. Lookups are case-sensitive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RangeTable {
    defs: Vec<RangeDef>,
}

impl Default for RangeTable {
    fn default() -> Self {
        Self::new(vec![
            RangeDef::new("1M", RangeSpan::Months(1)),
            RangeDef::new("3M", RangeSpan::Months(3)),
            RangeDef::new("6M", RangeSpan::Months(6)),
            RangeDef::new("1Y", RangeSpan::Years(1)),
            RangeDef::new("2Y", RangeSpan::Years(2)),
            RangeDef::new("3Y", RangeSpan::Years(3)),
            RangeDef::new("5Y", RangeSpan::Years(5)),
            RangeDef::new(ALL, RangeSpan::All),
        ])
    }
}

impl RangeTable {
    /// Build a table. `ALL` is appended when missing, since filtering falls
    /// back to it.
    pub fn new(mut defs: Vec<RangeDef>) -> Self {
        if !defs.iter().any(|d| d.code == ALL) {
            defs.push(RangeDef::new(ALL, RangeSpan::All));
        }
        Self { defs }
    }

    pub fn span(&self, code: &str) -> Result<RangeSpan, RangeError> {
        self.defs
            .iter()
            .find(|d| d.code == code)
            .map(|d| d.span)
            .ok_or_else(|| RangeError::UnknownRange {
                code: code.to_string(),
            })
    }

    pub fn contains(&self, code: &str) -> bool {
        self.defs.iter().any(|d| d.code == code)
    }

    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.defs.iter().map(|d| d.code.as_str())
    }

    pub fn defs(&self) -> &[RangeDef] {
        &self.defs
    }

    /// Cutoff for `code` relative to `now`; `None` means no filtering.
    pub fn cutoff_for(&self, code: &str, now: NaiveDate) -> Result<Option<NaiveDate>, RangeError> {
        Ok(self.span(code)?.cutoff(now))
    }
}

/// Cutoff for one of the default range codes.
pub fn cutoff_for(code: &str, now: NaiveDate) -> Result<Option<NaiveDate>, RangeError> {
    RangeTable::default().cutoff_for(code, now)
}

/// Ascending indices of `dates` on or after `cutoff` (all indices for `None`).
pub fn indices_since(dates: &[NaiveDate], cutoff: Option<NaiveDate>) -> Vec<usize> {
    match cutoff {
        None => (0..dates.len()).collect(),
        Some(c) => dates
            .iter()
            .enumerate()
            .filter(|(_, d)| **d >= c)
            .map(|(i, _)| i)
            .collect(),
    }
}

/// Calendar rollback by whole months with day-of-month overflow.
///
/// The target month is computed first; the day-of-month is then added to its
/// first day, so days past the month's end spill into the next month.
/// Saturates to `NaiveDate::MIN` if the calendar range is exceeded.
pub fn months_back(date: NaiveDate, months: u32) -> NaiveDate {
    let total = i64::from(date.year()) * 12 + i64::from(date.month0()) - i64::from(months);
    let year = total.div_euclid(12);
    let month = total.rem_euclid(12) as u32 + 1;

    i32::try_from(year)
        .ok()
        .and_then(|y| NaiveDate::from_ymd_opt(y, month, 1))
        .and_then(|first| first.checked_add_days(Days::new(u64::from(date.day() - 1))))
        .unwrap_or(NaiveDate::MIN)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn all_has_no_cutoff() {
        assert_eq!(cutoff_for("ALL", d(2024, 6, 15)).unwrap(), None);
    }

    #[test]
    fn one_year_keeps_month_and_day() {
        assert_eq!(cutoff_for("1Y", d(2024, 6, 15)).unwrap(), Some(d(2023, 6, 15)));
        assert_eq!(cutoff_for("5Y", d(2024, 6, 15)).unwrap(), Some(d(2019, 6, 15)));
    }

    #[test]
    fn months_cross_year_boundary() {
        assert_eq!(cutoff_for("3M", d(2024, 2, 10)).unwrap(), Some(d(2023, 11, 10)));
        assert_eq!(cutoff_for("6M", d(2024, 1, 1)).unwrap(), Some(d(2023, 7, 1)));
    }

    #[test]
    fn month_end_overflows_into_next_month() {
        // Feb 31 does not exist: 2023 has 28 days in Feb -> Mar 3.
        assert_eq!(cutoff_for("1M", d(2023, 3, 31)).unwrap(), Some(d(2023, 3, 3)));
        // Leap year: Feb has 29 days -> Mar 2.
        assert_eq!(cutoff_for("1M", d(2024, 3, 31)).unwrap(), Some(d(2024, 3, 2)));
        // Apr 31 -> May 1.
        assert_eq!(months_back(d(2024, 5, 31), 1), d(2024, 5, 1));
    }

    #[test]
    fn leap_day_one_year_back() {
        assert_eq!(cutoff_for("1Y", d(2024, 2, 29)).unwrap(), Some(d(2023, 3, 1)));
    }

    #[test]
    fn unknown_code_is_an_error() {
        let err = cutoff_for("7Y", d(2024, 1, 1)).unwrap_err();
        assert_eq!(err, RangeError::UnknownRange { code: "7Y".into() });
        assert!(cutoff_for("1y", d(2024, 1, 1)).is_err());
    }

    #[test]
    fn custom_table_extends_codes() {
        let table = RangeTable::new(vec![RangeDef::new("10Y", RangeSpan::Years(10))]);
        assert_eq!(
            table.cutoff_for("10Y", d(2024, 1, 1)).unwrap(),
            Some(d(2014, 1, 1))
        );
        // ALL is always available.
        assert!(table.contains(ALL));
        assert!(table.cutoff_for("1M", d(2024, 1, 1)).is_err());
    }

    #[test]
    fn indices_since_cutoff() {
        let dates = vec![d(2024, 1, 1), d(2024, 1, 2), d(2024, 1, 3), d(2024, 1, 4)];
        assert_eq!(indices_since(&dates, Some(d(2024, 1, 3))), vec![2, 3]);
        assert_eq!(indices_since(&dates, None), vec![0, 1, 2, 3]);
        assert!(indices_since(&dates, Some(d(2025, 1, 1))).is_empty());
    }

    #[test]
    fn span_parses_from_tagged_table() {
        let def: RangeDef = toml::from_str(
            r#"
            code = "2Y"
            span = { unit = "years", count = 2 }
            "#,
        )
        .unwrap();
        assert_eq!(def, RangeDef::new("2Y", RangeSpan::Years(2)));

        let all: RangeDef = toml::from_str(r#"code = "MAX"
span = { unit = "all" }"#)
        .unwrap();
        assert_eq!(all.span, RangeSpan::All);
    }
}
