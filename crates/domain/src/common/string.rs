//! String conversion utilities.

/// Reduces free text to a lower-cased run of alphabetic characters.
///
/// Digits, punctuation and whitespace are dropped, `ё` is folded into `е`, and
/// at most `limit` characters are kept. Lower-casing happens before filtering
/// and truncation, so the result is a fixed point:
/// `normalize_str(&normalize_str(x, n), n) == normalize_str(x, n)`.
///
/// # Examples
///
/// ```
/// use zavalinka_domain::common::normalize_str;
///
/// assert_eq!(normalize_str("Poets' Club #7", None), "poetsclub");
/// assert_eq!(normalize_str("Ёлка", None), "елка");
/// assert_eq!(normalize_str("abcdef", Some(3)), "abc");
/// assert_eq!(normalize_str("123", None), "");
/// ```
pub fn normalize_str(text: &str, limit: Option<usize>) -> String {
    let chars = text
        .chars()
        .flat_map(char::to_lowercase)
        .filter(|c| c.is_alphabetic())
        .map(|c| if c == 'ё' { 'е' } else { c });

    match limit {
        Some(limit) => chars.take(limit).collect(),
        None => chars.collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_drops_non_alphabetic() {
        assert_eq!(normalize_str("My Game 2024!", None), "mygame");
        assert_eq!(normalize_str("  ", None), "");
        assert_eq!(normalize_str("123", None), "");
    }

    #[test]
    fn test_normalize_handles_cyrillic() {
        assert_eq!(normalize_str("Весёлая Завалинка", None), "веселаязавалинка");
        assert_eq!(normalize_str("ЁЖИК", None), "ежик");
    }

    #[test]
    fn test_normalize_respects_limit_in_characters() {
        let long = "я".repeat(100);
        let normalized = normalize_str(&long, Some(64));
        assert_eq!(normalized.chars().count(), 64);
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let samples = [
            "Hello, World!",
            "ЁЁЁ ёжик 42",
            "İstanbul",
            "ß straße",
            "",
            "a1b2c3",
            &"Xy".repeat(80),
        ];
        for sample in samples {
            for limit in [None, Some(3), Some(64)] {
                let once = normalize_str(sample, limit);
                let twice = normalize_str(&once, limit);
                assert_eq!(once, twice, "not idempotent for {sample:?} / {limit:?}");
            }
        }
    }
}
