/// Coerce a cell to a number, tolerating the separator conventions the
/// sources mix freely: comma decimals ("101,3"), European thousands
/// separators ("1.234,5"), non-breaking spaces and plain spaces as grouping.
///
/// Dots are only treated as thousands separators when a comma is present;
/// "101.3" stays 101.3. Non-numeric or non-finite input yields `None`.
pub fn parse_number(raw: &str) -> Option<f64> {
    let mut s: String = raw
        .trim()
        .chars()
        .filter(|c| *c != '\u{a0}' && *c != ' ')
        .collect();
    if s.is_empty() {
        return None;
    }
    if s.contains(',') {
        s = s.replace('.', "").replace(',', ".");
    }
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comma_decimal_conventions() {
        assert_eq!(parse_number("101,3"), Some(101.3));
        assert_eq!(parse_number("1.234,5"), Some(1234.5));
        assert_eq!(parse_number("1.234.567,89"), Some(1234567.89));
    }

    #[test]
    fn dot_decimal_is_left_alone() {
        assert_eq!(parse_number("101.3"), Some(101.3));
        assert_eq!(parse_number("-0.98"), Some(-0.98));
    }

    #[test]
    fn grouping_spaces_are_stripped() {
        assert_eq!(parse_number(" 1 234 "), Some(1234.0));
        assert_eq!(parse_number("1\u{a0}234,5"), Some(1234.5));
    }

    #[test]
    fn junk_yields_none() {
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("s/d"), None);
        assert_eq!(parse_number("///"), None);
        // f64's own parser accepts these; the series must not
        assert_eq!(parse_number("NaN"), None);
        assert_eq!(parse_number("inf"), None);
    }
}
