use csv::ReaderBuilder;

use super::{decode_bytes, SEPARATOR_CANDIDATES};
use crate::error::ParseError;
use crate::sheet::RawTable;

/// Pick the candidate separator that occurs most often in the first
/// non-empty line; comma when nothing matches.
pub fn sniff_delimiter(text: &str) -> u8 {
    let first = text.lines().find(|l| !l.trim().is_empty()).unwrap_or("");
    let mut best = (b',', 0usize);
    for &cand in SEPARATOR_CANDIDATES {
        let count = first.matches(cand as char).count();
        if count > best.1 {
            best = (cand, count);
        }
    }
    best.0
}

/// The "generic spreadsheet/CSV reader" of the parsing contract: bytes in,
/// headerless 2-D grid out, no interpretation applied. Ragged rows are kept
/// ragged; `RawTable` treats short rows as trailing empty cells.
pub fn read_grid(bytes: &[u8]) -> Result<RawTable, ParseError> {
    let text = decode_bytes(bytes);
    let mut rdr = ReaderBuilder::new()
        .delimiter(sniff_delimiter(&text))
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut rows = Vec::new();
    for record in rdr.records() {
        let record = record?;
        rows.push(record.iter().map(|s| s.to_string()).collect());
    }
    Ok(RawTable::from_rows(rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sniffs_the_dominant_separator() {
        assert_eq!(sniff_delimiter("a;b;c\n1;2;3"), b';');
        assert_eq!(sniff_delimiter("a,b,c"), b',');
        assert_eq!(sniff_delimiter("a\tb\tc"), b'\t');
        assert_eq!(sniff_delimiter(""), b',');
    }

    #[test]
    fn reads_ragged_grids_verbatim() {
        let csv = "T\u{ed}tulo del cuadro;;\n;2023;Enero;100,0\n;;Febrero;102,0\n";
        let grid = read_grid(csv.as_bytes()).unwrap();
        assert_eq!(grid.num_rows(), 3);
        assert_eq!(grid.cell(1, 1), Some("2023"));
        assert_eq!(grid.cell(2, 2), Some("Febrero"));
        // short first row: out-of-range reads as absent
        assert_eq!(grid.cell(0, 3), None);
    }

    #[test]
    fn grid_feeds_straight_into_the_sheet_parser() {
        use crate::sheet::{extract_series, SheetLayout};

        let mut csv = String::new();
        for _ in 0..6 {
            csv.push_str("encabezado;;;\n");
        }
        csv.push_str(";2023;Enero;100,0\n");
        csv.push_str(";;Febrero;102,0\n");

        let grid = read_grid(csv.as_bytes()).unwrap();
        let series = extract_series(&grid, &SheetLayout::default(), 3, "ng").unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.points[1].value, 102.0);
    }
}
