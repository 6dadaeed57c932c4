// src/sheet/mod.rs

pub mod blocks;
pub mod extract;
pub mod months;
pub mod number;

pub use blocks::{build_header_blocks, HeaderBlocks};
pub use extract::{extract_series, extract_series_lenient, SheetLayout};

/// An untyped 2-D grid of cells, as read verbatim from a spreadsheet or CSV
/// reader. No header interpretation is applied; rows may be ragged and an
/// out-of-range read is treated the same as an empty cell.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub cells: Vec<Vec<String>>,
}

impl RawTable {
    pub fn from_rows(cells: Vec<Vec<String>>) -> Self {
        RawTable { cells }
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&str> {
        self.cells.get(row).and_then(|r| r.get(col)).map(String::as_str)
    }

    pub fn row(&self, row: usize) -> Option<&[String]> {
        self.cells.get(row).map(Vec::as_slice)
    }

    pub fn num_rows(&self) -> usize {
        self.cells.len()
    }

    /// Widest row in the grid.
    pub fn width(&self) -> usize {
        self.cells.iter().map(Vec::len).max().unwrap_or(0)
    }
}
