use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

use super::{months::month_number, number::parse_number, RawTable};
use crate::error::ParseError;
use crate::series::{NamedSeries, SeriesPoint};
use chrono::NaiveDate;

/// Fixed offsets of the irregular header convention: the first `header_rows`
/// rows are titles and merged header cells, `year_col` holds a forward-filled
/// year label and `month_col` a Spanish month name.
#[derive(Debug, Clone, Copy)]
pub struct SheetLayout {
    pub header_rows: usize,
    pub year_col: usize,
    pub month_col: usize,
}

impl Default for SheetLayout {
    fn default() -> Self {
        SheetLayout {
            header_rows: 6,
            year_col: 1,
            month_col: 2,
        }
    }
}

/// The year column carries values like "2023", "2023.0" or stray label text;
/// the first four-digit run is the year.
static YEAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d{4})").expect("year regex parses"));

/// Extract one monthly series from a raw sheet grid.
///
/// The year column is forward-filled (the last non-blank cell carries down),
/// month names are resolved against the Spanish lexicon, and the value cell
/// is coerced to a number. Rows where any of the three cannot be resolved are
/// dropped; the output is sorted ascending with unique dates and may be empty.
///
/// Asking for a column beyond the table's width is a structural error, kept
/// distinct from a genuinely empty source so tests can tell the two apart.
#[tracing::instrument(level = "debug", skip(table, layout))]
pub fn extract_series(
    table: &RawTable,
    layout: &SheetLayout,
    value_col: usize,
    name: &str,
) -> Result<NamedSeries, ParseError> {
    if table.num_rows() == 0 {
        return Ok(NamedSeries::new(name));
    }

    let width = table.width();
    for col in [layout.year_col, layout.month_col, value_col] {
        if col >= width {
            return Err(ParseError::ColumnOutOfRange { col, width });
        }
    }

    let mut carried_year: Option<String> = None;
    let mut points = Vec::new();
    let mut dropped = 0usize;

    for row in layout.header_rows..table.num_rows() {
        let year_cell = table.cell(row, layout.year_col).unwrap_or("");
        if !year_cell.trim().is_empty() {
            carried_year = Some(year_cell.to_string());
        }

        let year = carried_year
            .as_deref()
            .and_then(|c| YEAR_RE.captures(c))
            .and_then(|caps| caps[1].parse::<i32>().ok());
        let month = table.cell(row, layout.month_col).and_then(month_number);
        let value = table.cell(row, value_col).and_then(parse_number);

        match (year, month, value) {
            (Some(y), Some(m), Some(v)) => {
                if let Some(date) = NaiveDate::from_ymd_opt(y, m, 1) {
                    points.push(SeriesPoint { date, value: v });
                } else {
                    dropped += 1;
                }
            }
            _ => dropped += 1,
        }
    }

    if dropped > 0 {
        debug!(name, dropped, kept = points.len(), "dropped unresolvable sheet rows");
    }

    Ok(NamedSeries::from_points(name, points))
}

/// Dashboard contract: one malformed column must not blank the whole page.
/// Structural errors are logged and collapse to an empty series.
pub fn extract_series_lenient(
    table: &RawTable,
    layout: &SheetLayout,
    value_col: usize,
    name: &str,
) -> NamedSeries {
    match extract_series(table, layout, value_col, name) {
        Ok(series) => series,
        Err(err) => {
            warn!(name, value_col, %err, "sheet extraction failed, returning empty series");
            NamedSeries::new(name)
        }
    }
}
