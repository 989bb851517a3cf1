/// Collapses every whitespace run (including non-breaking spaces) into a single
/// space and trims the ends.
pub fn normalize_whitespace(text: &str) -> String {
    text.replace('\u{a0}', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Splits text into lowercase terms made of ASCII letters and digits.
///
/// Everything else (punctuation, whitespace, non-ASCII symbols) separates
/// terms and is dropped. Documents and queries must both go through this
/// function so that their terms line up.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|term| !term.is_empty())
        .map(str::to_string)
        .collect()
}

/// Query terms in first-seen order with repeats removed.
pub fn unique_terms(tokens: &[String]) -> Vec<&str> {
    let mut seen = std::collections::HashSet::new();
    tokens
        .iter()
        .map(String::as_str)
        .filter(|term| seen.insert(*term))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whitespace_is_normalized() {
        let input = "  A  \t  lot\nof\u{a0}\u{a0}spacing ";
        assert_eq!(normalize_whitespace(input), "A lot of spacing");
    }

    #[test]
    fn tokenize_lowercases_and_splits_on_non_alphanumerics() {
        let tokens = tokenize("Hydraulic-Pump, model X42 (rev.3)!");
        assert_eq!(
            tokens,
            vec!["hydraulic", "pump", "model", "x42", "rev", "3"]
        );
    }

    #[test]
    fn tokenize_drops_non_ascii_symbols() {
        assert_eq!(tokenize("café → naïve"), vec!["caf", "na", "ve"]);
    }

    #[test]
    fn tokenize_empty_and_punctuation_only_inputs() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("  ?!... -- ").is_empty());
    }

    #[test]
    fn tokenize_is_deterministic_and_emits_lowercase_alphanumerics() {
        let text = "The QUICK brown fox, 2024 edition; jumps over #42.";
        let first = tokenize(text);
        assert_eq!(first, tokenize(text));
        assert!(first.iter().all(|term| {
            !term.is_empty()
                && term
                    .chars()
                    .all(|c| c.is_ascii_digit() || c.is_ascii_lowercase())
        }));
    }

    #[test]
    fn unique_terms_keeps_first_occurrence_order() {
        let tokens = tokenize("dogs cats dogs birds cats");
        assert_eq!(unique_terms(&tokens), vec!["dogs", "cats", "birds"]);
    }
}
