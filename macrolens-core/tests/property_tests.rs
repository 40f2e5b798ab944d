//! Property tests for engine invariants.
//!
//! Uses proptest to verify:
//! 1. ROC length and reference distance
//! 2. Z-score of a constant series is all zeros
//! 3. Pearson self-correlation and symmetry
//! 4. Regime spans are maximal and cover exactly the renderable dates
//! 5. Lag search recovers a known shift
//! 6. ALL-range auto-trim removes exactly a shared leading zero run

use chrono::{Duration, NaiveDate};
use macrolens_core::domain::{DateAxis, Series};
use macrolens_core::filter::SeriesFilter;
use macrolens_core::lag::{find_optimal_lag, LagSearch};
use macrolens_core::range::{RangeTable, ALL};
use macrolens_core::regime::encode;
use macrolens_core::signal::SignalState;
use macrolens_core::transforms::{pearson, rate_of_change, zscore};
use proptest::prelude::*;
use std::collections::BTreeSet;

// ── Strategies (proptest) ────────────────────────────────────────────

fn dates(n: usize) -> Vec<NaiveDate> {
    let base = NaiveDate::from_ymd_opt(2000, 1, 3).unwrap();
    (0..n).map(|i| base + Duration::days(i as i64)).collect()
}

fn arb_value() -> impl Strategy<Value = Option<f64>> {
    prop_oneof![
        1 => Just(None),
        1 => Just(Some(0.0)),
        6 => (-1000.0..1000.0_f64).prop_map(Some),
    ]
}

fn arb_values(max: usize) -> impl Strategy<Value = Vec<Option<f64>>> {
    prop::collection::vec(arb_value(), 0..max)
}

fn arb_label() -> impl Strategy<Value = Option<SignalState>> {
    prop_oneof![
        Just(None),
        Just(Some(SignalState::Bullish)),
        Just(Some(SignalState::Bearish)),
        Just(Some(SignalState::Neutral)),
        Just(Some(SignalState::Warning)),
    ]
}

fn wave(n: usize, phase: f64) -> Vec<Option<f64>> {
    (0..n)
        .map(|i| Some((i as f64 * 0.23 + phase).sin() * 5.0 + (i as f64 * 0.07).cos()))
        .collect()
}

// ── 1. ROC ───────────────────────────────────────────────────────────

proptest! {
    /// Output never exceeds N - p points, and each point equals the change
    /// against exactly p positions back.
    #[test]
    fn roc_references_period_back(values in arb_values(80), period in 1usize..10) {
        let d = dates(values.len());
        let roc = rate_of_change(&d, &values, period);
        prop_assert!(roc.len() <= values.len().saturating_sub(period));

        for (date, r) in roc.iter() {
            let i = d.iter().position(|x| *x == date).unwrap();
            prop_assert!(i >= period);
            let (curr, prev) = (values[i].unwrap(), values[i - period].unwrap());
            prop_assert!(prev != 0.0);
            prop_assert!(((curr / prev - 1.0) * 100.0 - r).abs() < 1e-9);
        }
    }
}

// ── 2. Z-score ───────────────────────────────────────────────────────

proptest! {
    #[test]
    fn zscore_of_constant_is_zero(c in -1e6..1e6_f64, n in 2usize..50) {
        let z = zscore(&vec![Some(c); n]);
        prop_assert!(z.iter().all(|v| *v == Some(0.0)));
    }

    #[test]
    fn zscore_keeps_gaps(values in arb_values(50)) {
        let z = zscore(&values);
        prop_assert_eq!(z.len(), values.len());
        for (a, b) in values.iter().zip(&z) {
            prop_assert_eq!(a.is_none(), b.is_none());
            if let Some(x) = b {
                prop_assert!(x.is_finite());
            }
        }
    }
}

// ── 3. Pearson ───────────────────────────────────────────────────────

proptest! {
    #[test]
    fn pearson_self_is_one(values in prop::collection::vec(-100.0..100.0_f64, 2..60)) {
        let xs: Vec<Option<f64>> = values.iter().copied().map(Some).collect();
        let spread = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max)
            - values.iter().cloned().fold(f64::INFINITY, f64::min);
        prop_assume!(spread > 1e-6);
        prop_assert!((pearson(&xs, &xs) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn pearson_is_symmetric_and_bounded(
        (xs, ys) in (2usize..60).prop_flat_map(|n| {
            (prop::collection::vec(arb_value(), n), prop::collection::vec(arb_value(), n))
        })
    ) {
        let a = pearson(&xs, &ys);
        let b = pearson(&ys, &xs);
        prop_assert!((a - b).abs() < 1e-12);
        prop_assert!((-1.0..=1.0).contains(&a));
    }
}

// ── 4. Regime encoding ───────────────────────────────────────────────

proptest! {
    #[test]
    fn spans_are_maximal_and_cover_renderable_dates(
        labels in prop::collection::vec(arb_label(), 0..80)
    ) {
        let d = dates(labels.len());
        let spans = encode(&d, &labels);

        for pair in spans.windows(2) {
            prop_assert!(pair[0].end < pair[1].start);
            // Touching spans with the same label would have been one block.
            let next_after_end = d.iter().position(|x| *x == pair[0].end).unwrap() + 1;
            let touching = d[next_after_end] == pair[1].start;
            prop_assert!(!(touching && pair[0].label == pair[1].label));
        }

        let covered: BTreeSet<NaiveDate> = spans
            .iter()
            .flat_map(|s| d.iter().copied().filter(move |x| *x >= s.start && *x <= s.end))
            .collect();
        let renderable: BTreeSet<NaiveDate> = d
            .iter()
            .zip(&labels)
            .filter(|(_, l)| l.map_or(false, |l| l.is_renderable()))
            .map(|(x, _)| *x)
            .collect();
        prop_assert_eq!(covered, renderable);

        for s in &spans {
            let lo = d.iter().position(|x| *x == s.start).unwrap();
            let hi = d.iter().position(|x| *x == s.end).unwrap();
            prop_assert!(labels[lo..=hi].iter().all(|l| *l == Some(s.label)));
        }
    }
}

// ── 5. Lag recovery ──────────────────────────────────────────────────

proptest! {
    #[test]
    fn lag_search_recovers_shift(k in 0usize..12, phase in 0.0..3.0_f64) {
        let k0 = (k * 5) as i64;
        let n = 240;
        let lead = wave(n, phase);
        let mut target = vec![None; n];
        for i in 0..n - k0 as usize {
            target[i + k0 as usize] = lead[i];
        }

        let result = find_optimal_lag(&lead, &target, &LagSearch::new(0, 60, 5));
        prop_assert_eq!(result.lag, k0);
        prop_assert!((result.correlation - 1.0).abs() < 1e-9);
    }
}

// ── 6. ALL auto-trim ─────────────────────────────────────────────────

proptest! {
    /// 50 shared leading zeros are trimmed whichever series ends the run.
    #[test]
    fn all_range_trims_shared_leading_zeros(
        which in 0usize..3,
        tail in prop::collection::vec(1.0..100.0_f64, 1..40),
    ) {
        let lead_in = 50;
        let n = lead_in + tail.len();
        let axis = DateAxis::new(dates(n));

        let batch: Vec<Series> = (0..3)
            .map(|s| {
                let values = (0..n)
                    .map(|i| {
                        if i < lead_in {
                            if s == 1 { None } else { Some(0.0) }
                        } else if s == which {
                            Some(tail[i - lead_in])
                        } else {
                            Some(0.0)
                        }
                    })
                    .collect();
                Series::new(format!("s{s}"), axis.clone(), values)
            })
            .collect();

        let now = *axis.dates().last().unwrap();
        let filter = SeriesFilter::new(RangeTable::default(), None, now);
        let traces = filter.apply(&batch, ALL, None).unwrap();
        for t in &traces {
            prop_assert_eq!(t.len(), tail.len());
            prop_assert_eq!(t.x[0], axis.dates()[lead_in]);
        }
    }
}
