// src/series/mod.rs

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

/// Snap any date to the first day of its month. Monthly granularity is the
/// universal unit across every source this system ingests; day-of-month
/// information is never meaningful.
pub fn month_start(date: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year(), date.month(), 1).expect("first of month is always valid")
}

/// Shift a first-of-month date by a signed number of calendar months.
/// Returns `None` only if the result falls outside chrono's date range.
pub fn shift_months(date: NaiveDate, months: i32) -> Option<NaiveDate> {
    let total = date.year() * 12 + date.month0() as i32 + months;
    NaiveDate::from_ymd_opt(total.div_euclid(12), total.rem_euclid(12) as u32 + 1, 1)
}

/// One monthly observation. Clean series carry no missing-value placeholders;
/// an absent month is simply an absent point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// A labelled monthly series, sorted ascending by date with unique dates.
/// Gaps are permitted and never interpolated.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NamedSeries {
    pub name: String,
    pub points: Vec<SeriesPoint>,
}

impl NamedSeries {
    pub fn new(name: impl Into<String>) -> Self {
        NamedSeries {
            name: name.into(),
            points: Vec::new(),
        }
    }

    /// Build a series from unordered points, enforcing the invariant:
    /// stable sort ascending, then duplicate dates resolved last-write-wins.
    pub fn from_points(name: impl Into<String>, mut points: Vec<SeriesPoint>) -> Self {
        points.sort_by_key(|p| p.date);
        let mut deduped: Vec<SeriesPoint> = Vec::with_capacity(points.len());
        for p in points {
            match deduped.last_mut() {
                Some(last) if last.date == p.date => *last = p,
                _ => deduped.push(p),
            }
        }
        NamedSeries {
            name: name.into(),
            points: deduped,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Exact-date lookup.
    pub fn value_at(&self, date: NaiveDate) -> Option<f64> {
        self.points
            .binary_search_by_key(&date, |p| p.date)
            .ok()
            .map(|i| self.points[i].value)
    }

    pub fn last(&self) -> Option<&SeriesPoint> {
        self.points.last()
    }
}

/// A transform-output observation. `None` is the explicit "no result
/// applicable" state: no comparator at the lag, zero denominator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DerivedPoint {
    pub date: NaiveDate,
    pub value: Option<f64>,
}

/// Output shape of the transform engine. Same dates as its input series;
/// values may be missing where the transform does not apply.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DerivedSeries {
    pub name: String,
    pub points: Vec<DerivedPoint>,
}

impl DerivedSeries {
    /// Most recent non-missing observation. This is what KPI cards show.
    pub fn last_value(&self) -> Option<(NaiveDate, f64)> {
        self.points
            .iter()
            .rev()
            .find_map(|p| p.value.map(|v| (p.date, v)))
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
