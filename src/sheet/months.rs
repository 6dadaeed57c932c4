use once_cell::sync::Lazy;
use std::collections::HashMap;

/// INDEC labels rows with full Spanish month names.
static MONTHS_ES: Lazy<HashMap<&'static str, u32>> = Lazy::new(|| {
    HashMap::from([
        ("enero", 1),
        ("febrero", 2),
        ("marzo", 3),
        ("abril", 4),
        ("mayo", 5),
        ("junio", 6),
        ("julio", 7),
        ("agosto", 8),
        ("septiembre", 9),
        ("octubre", 10),
        ("noviembre", 11),
        ("diciembre", 12),
    ])
});

/// Map a Spanish month name to 1..=12, case-insensitive and trimmed.
/// Names outside the lexicon yield `None`.
pub fn month_number(name: &str) -> Option<u32> {
    MONTHS_ES.get(name.trim().to_lowercase().as_str()).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lexicon_is_case_insensitive_and_trimmed() {
        assert_eq!(month_number("enero"), Some(1));
        assert_eq!(month_number("  Marzo "), Some(3));
        assert_eq!(month_number("DICIEMBRE"), Some(12));
    }

    #[test]
    fn unknown_names_yield_none() {
        assert_eq!(month_number("Período"), None);
        assert_eq!(month_number(""), None);
        assert_eq!(month_number("jan"), None);
    }
}
