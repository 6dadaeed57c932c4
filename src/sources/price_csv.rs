use chrono::NaiveDate;
use csv::ReaderBuilder;
use std::collections::BTreeMap;
use tracing::debug;

use super::{decode_bytes, SEPARATOR_CANDIDATES};
use crate::error::ParseError;
use crate::series::{month_start, NamedSeries, SeriesPoint};
use crate::sheet::number::parse_number;

/// Which named columns carry the period, the category code and the index
/// value in a price-index CSV release.
#[derive(Debug, Clone, Copy)]
pub struct PriceCsvSpec {
    pub period_col: &'static str,
    pub category_col: &'static str,
    pub value_col: &'static str,
}

/// Parse a price-index CSV into one series per category.
///
/// The delimiter is sniffed: the first candidate whose header row contains
/// all three configured columns (case-insensitive, trimmed) wins. Rows whose
/// period, category or value cannot be resolved are dropped silently; values
/// tolerate comma-decimal and thousands-separator conventions. Each category's
/// series comes back sorted and unique by date.
#[tracing::instrument(level = "debug", skip(bytes))]
pub fn parse_price_csv(
    bytes: &[u8],
    spec: &PriceCsvSpec,
) -> Result<BTreeMap<String, NamedSeries>, ParseError> {
    let text = decode_bytes(bytes);

    for &sep in SEPARATOR_CANDIDATES {
        let mut rdr = ReaderBuilder::new()
            .delimiter(sep)
            .has_headers(true)
            .flexible(true)
            .from_reader(text.as_bytes());

        let headers = match rdr.headers() {
            Ok(h) => h.clone(),
            Err(_) => continue,
        };
        let position = |want: &str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(want))
        };
        let (Some(period_idx), Some(category_idx), Some(value_idx)) = (
            position(spec.period_col),
            position(spec.category_col),
            position(spec.value_col),
        ) else {
            continue;
        };

        let mut grouped: BTreeMap<String, Vec<SeriesPoint>> = BTreeMap::new();
        let mut dropped = 0usize;

        for record in rdr.records() {
            let Ok(record) = record else {
                dropped += 1;
                continue;
            };
            let period = record.get(period_idx).and_then(parse_period);
            let category = record
                .get(category_idx)
                .map(slug)
                .filter(|s| !s.is_empty());
            let value = record.get(value_idx).and_then(parse_number);

            match (period, category, value) {
                (Some(date), Some(category), Some(value)) => grouped
                    .entry(category)
                    .or_default()
                    .push(SeriesPoint { date, value }),
                _ => dropped += 1,
            }
        }

        if dropped > 0 {
            debug!(dropped, "dropped unparseable price-index rows");
        }

        return Ok(grouped
            .into_iter()
            .map(|(category, points)| {
                let series = NamedSeries::from_points(category.clone(), points);
                (category, series)
            })
            .collect());
    }

    Err(ParseError::MissingColumn(format!(
        "{} / {} / {}",
        spec.period_col, spec.category_col, spec.value_col
    )))
}

/// Periods arrive as ISO dates; only the month matters.
fn parse_period(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .ok()
        .map(month_start)
}

/// Normalize a category code the way the upstream files need: trim,
/// lowercase, NBSP → space, dots stripped, spaces → underscores, doubled
/// underscores collapsed.
fn slug(raw: &str) -> String {
    let mut s = raw
        .trim()
        .to_lowercase()
        .replace('\u{a0}', " ")
        .replace('.', "")
        .replace(' ', "_");
    while s.contains("__") {
        s = s.replace("__", "_");
    }
    s
}
