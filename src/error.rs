// src/error.rs

use thiserror::Error;

/// Typed failure modes of the extraction layer.
///
/// A table that parses cleanly but yields no surviving rows is *not* an error;
/// callers get `Ok` with an empty series. `ParseError` marks the structural
/// cases a test needs to tell apart from a genuinely empty source.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("requested column {col} is outside the table (width {width})")]
    ColumnOutOfRange { col: usize, width: usize },

    #[error("required column(s) `{0}` not found under any candidate delimiter")]
    MissingColumn(String),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}
