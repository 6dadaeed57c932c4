// src/transform/mod.rs
//
// Pure, stateless derivations over clean monthly series. Lags are calendar
// lags: the comparator is looked up by exact date, never by row offset, so a
// gap in the series produces a missing result instead of a misaligned one.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

use crate::series::{shift_months, DerivedPoint, DerivedSeries, NamedSeries};

/// Percentage change vs. the observation `lag_months` calendar months back:
/// `(v[t] / v[t-lag] - 1) * 100`. Missing comparator or zero denominator
/// yields a missing value, never an error or an infinity.
/// `lag_months = 1` is month-over-month, `12` year-over-year.
pub fn pct_change(series: &NamedSeries, lag_months: u32) -> DerivedSeries {
    let index: HashMap<NaiveDate, f64> =
        series.points.iter().map(|p| (p.date, p.value)).collect();

    let points = series
        .points
        .iter()
        .map(|p| {
            let value = shift_months(p.date, -(lag_months as i32))
                .and_then(|prev| index.get(&prev).copied())
                .and_then(|prev| (prev != 0.0).then(|| (p.value / prev - 1.0) * 100.0));
            DerivedPoint { date: p.date, value }
        })
        .collect();

    DerivedSeries { name: series.name.clone(), points }
}

/// Absolute change vs. the observation `lag_months` calendar months back,
/// with the same exact-date lag rule as [`pct_change`].
pub fn abs_change(series: &NamedSeries, lag_months: u32) -> DerivedSeries {
    let index: HashMap<NaiveDate, f64> =
        series.points.iter().map(|p| (p.date, p.value)).collect();

    let points = series
        .points
        .iter()
        .map(|p| {
            let value = shift_months(p.date, -(lag_months as i32))
                .and_then(|prev| index.get(&prev).copied())
                .map(|prev| p.value - prev);
            DerivedPoint { date: p.date, value }
        })
        .collect();

    DerivedSeries { name: series.name.clone(), points }
}

/// Rescale so the observation at `anchor_date` reads 100. Rebasing is
/// advisory: if the anchor is absent, zero or non-finite the input comes back
/// unchanged. Ordering and point count are always preserved.
pub fn rebase_to_100(series: &NamedSeries, anchor_date: NaiveDate) -> NamedSeries {
    let Some(base) = series.value_at(anchor_date) else {
        return series.clone();
    };
    if base == 0.0 || !base.is_finite() {
        return series.clone();
    }

    let mut rebased = series.clone();
    for p in &mut rebased.points {
        p.value = p.value / base * 100.0;
    }
    rebased
}

/// Running cumulative % change over `[start, end]`, relative to the window's
/// first observation. One point per subsequent observation in the window; a
/// window of zero or one points, or a zero baseline, yields an empty curve.
pub fn cumulative_change(
    series: &NamedSeries,
    start: NaiveDate,
    end: NaiveDate,
) -> DerivedSeries {
    let window: Vec<_> = series
        .points
        .iter()
        .filter(|p| p.date >= start && p.date <= end)
        .collect();

    let name = series.name.clone();
    let Some((first, rest)) = window.split_first() else {
        return DerivedSeries { name, points: Vec::new() };
    };
    let base = first.value;
    if rest.is_empty() || base == 0.0 || !base.is_finite() {
        return DerivedSeries { name, points: Vec::new() };
    }

    let points = rest
        .iter()
        .map(|p| DerivedPoint {
            date: p.date,
            value: Some((p.value / base - 1.0) * 100.0),
        })
        .collect();

    DerivedSeries { name, points }
}

/// Several series merged on date, for cross-sector comparison tables.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MergedTable {
    /// One column per input series, in input order.
    pub columns: Vec<String>,
    pub rows: Vec<MergedRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergedRow {
    pub date: NaiveDate,
    /// One cell per column; a date absent from a series is a missing cell,
    /// never a dropped row or a zero.
    pub values: Vec<Option<f64>>,
}

/// Outer-join the inputs on date: one row per date present in any series,
/// rows ascending by date.
pub fn merge_on_date(series: &[&NamedSeries]) -> MergedTable {
    let columns: Vec<String> = series.iter().map(|s| s.name.clone()).collect();

    let mut by_date: BTreeMap<NaiveDate, Vec<Option<f64>>> = BTreeMap::new();
    for (col, s) in series.iter().enumerate() {
        for p in &s.points {
            by_date
                .entry(p.date)
                .or_insert_with(|| vec![None; series.len()])[col] = Some(p.value);
        }
    }

    let rows = by_date
        .into_iter()
        .map(|(date, values)| MergedRow { date, values })
        .collect();

    MergedTable { columns, rows }
}

/// Mean of the observations in `year` with month ≤ `max_month`: the
/// partial-year average used to compare e.g. Jan-Aug across years.
/// No matching observations yields `None`.
pub fn period_average(series: &NamedSeries, year: i32, max_month: u32) -> Option<f64> {
    let mut sum = 0.0;
    let mut n = 0usize;
    for p in &series.points {
        if p.date.year() == year && p.date.month() <= max_month {
            sum += p.value;
            n += 1;
        }
    }
    (n > 0).then(|| sum / n as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::SeriesPoint;

    fn d(y: i32, m: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, 1).unwrap()
    }

    fn series(name: &str, points: &[(i32, u32, f64)]) -> NamedSeries {
        NamedSeries::from_points(
            name,
            points
                .iter()
                .map(|&(y, m, v)| SeriesPoint { date: d(y, m), value: v })
                .collect(),
        )
    }

    #[test]
    fn mom_matches_the_worked_example() {
        let s = series("ipi", &[(2023, 1, 100.0), (2023, 2, 102.0), (2023, 3, 101.0)]);
        let mom = pct_change(&s, 1);

        assert_eq!(mom.points[0].value, None); // nothing before january
        let march = mom.points[2].value.unwrap();
        assert!((march - (101.0 / 102.0 - 1.0) * 100.0).abs() < 1e-9);
        assert!((march + 0.98).abs() < 0.01);
    }

    #[test]
    fn yoy_requires_an_exact_calendar_comparator() {
        // 2022-06 is missing, so 2023-06 must be missing too, not computed
        // from the nearest available row.
        let s = series(
            "ipi",
            &[(2022, 5, 100.0), (2022, 7, 100.0), (2023, 5, 110.0), (2023, 6, 120.0)],
        );
        let yoy = pct_change(&s, 12);

        let at = |date: NaiveDate| {
            yoy.points
                .iter()
                .find(|p| p.date == date)
                .expect("date present")
                .value
        };
        assert!((at(d(2023, 5)).unwrap() - 10.0).abs() < 1e-9);
        assert_eq!(at(d(2023, 6)), None);
    }

    #[test]
    fn zero_denominator_is_missing_not_infinite() {
        let s = series("x", &[(2023, 1, 0.0), (2023, 2, 5.0)]);
        let mom = pct_change(&s, 1);
        assert_eq!(mom.points[1].value, None);
    }

    #[test]
    fn abs_change_uses_the_same_lag_rule() {
        let s = series("puestos", &[(2023, 1, 1000.0), (2023, 2, 1010.0), (2023, 4, 1030.0)]);
        let diff = abs_change(&s, 1);
        assert_eq!(diff.points[1].value, Some(10.0));
        assert_eq!(diff.points[2].value, None); // march is a gap
    }

    #[test]
    fn rebase_scales_through_the_anchor() {
        let s = series("ipi", &[(2023, 4, 50.0), (2023, 5, 100.0), (2023, 6, 150.0)]);
        let r = rebase_to_100(&s, d(2023, 4));
        let values: Vec<_> = r.points.iter().map(|p| p.value).collect();
        assert_eq!(values, vec![100.0, 200.0, 300.0]);

        // ratios between any two points are preserved
        assert!((r.points[2].value / r.points[1].value - 150.0 / 100.0).abs() < 1e-12);
    }

    #[test]
    fn rebase_with_absent_anchor_is_identity() {
        let s = series("ipi", &[(2023, 4, 50.0), (2023, 5, 100.0)]);
        let r = rebase_to_100(&s, d(2020, 1));
        assert_eq!(r, s);
    }

    #[test]
    fn rebase_with_zero_anchor_is_identity() {
        let s = series("ipi", &[(2023, 4, 0.0), (2023, 5, 100.0)]);
        let r = rebase_to_100(&s, d(2023, 4));
        assert_eq!(r, s);
    }

    #[test]
    fn cumulative_change_runs_from_the_window_baseline() {
        let s = series(
            "ipi",
            &[(2022, 12, 80.0), (2023, 1, 100.0), (2023, 2, 110.0), (2023, 3, 90.0)],
        );
        let acc = cumulative_change(&s, d(2023, 1), d(2023, 3));
        assert_eq!(acc.points.len(), 2);
        assert_eq!(acc.points[0].value, Some(10.0));
        assert_eq!(acc.points[1].value, Some(-10.0));
    }

    #[test]
    fn degenerate_cumulative_windows_are_empty() {
        let s = series("ipi", &[(2023, 1, 100.0), (2023, 2, 110.0)]);
        assert!(cumulative_change(&s, d(2024, 1), d(2024, 6)).is_empty());
        assert!(cumulative_change(&s, d(2023, 1), d(2023, 1)).is_empty());

        let zero_base = series("ipi", &[(2023, 1, 0.0), (2023, 2, 110.0)]);
        assert!(cumulative_change(&zero_base, d(2023, 1), d(2023, 2)).is_empty());
    }

    #[test]
    fn merge_is_the_union_of_dates_with_missing_cells() {
        let a = series("a", &[(2023, 1, 1.0), (2023, 2, 2.0)]);
        let b = series("b", &[(2023, 2, 20.0), (2023, 3, 30.0)]);
        let merged = merge_on_date(&[&a, &b]);

        assert_eq!(merged.columns, vec!["a", "b"]);
        let dates: Vec<_> = merged.rows.iter().map(|r| r.date).collect();
        assert_eq!(dates, vec![d(2023, 1), d(2023, 2), d(2023, 3)]);

        assert_eq!(merged.rows[0].values, vec![Some(1.0), None]);
        assert_eq!(merged.rows[1].values, vec![Some(2.0), Some(20.0)]);
        assert_eq!(merged.rows[2].values, vec![None, Some(30.0)]);
    }

    #[test]
    fn period_average_restricts_year_and_month() {
        let s = series(
            "ipi",
            &[(2023, 1, 100.0), (2023, 2, 110.0), (2023, 9, 300.0), (2024, 1, 400.0)],
        );
        assert_eq!(period_average(&s, 2023, 8), Some(105.0));
        assert_eq!(period_average(&s, 2023, 12), Some(170.0));
        assert_eq!(period_average(&s, 2022, 8), None);
    }
}
