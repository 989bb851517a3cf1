pub const ELLIPSIS: &str = "…";

/// Builds a short excerpt of `text` around the earliest case-insensitive
/// occurrence of any of `terms`. `window` is measured in characters.
///
/// Without any occurrence the excerpt is the start of the text.
pub fn snippet<S: AsRef<str>>(text: &str, terms: &[S], window: usize) -> String {
    let chars = text.chars().collect::<Vec<_>>();

    let Some(match_at) = earliest_match(text, terms) else {
        if chars.len() > window {
            let mut head = chars[..window].iter().collect::<String>();
            head.push_str(ELLIPSIS);
            return head;
        }
        return text.to_string();
    };

    let half = window / 2;
    let start = match_at.saturating_sub(half);
    let end = (match_at + half).min(chars.len());

    let excerpt = chars[start..end].iter().collect::<String>();
    let mut rendered = String::with_capacity(excerpt.len() + 2 * ELLIPSIS.len());
    if start > 0 {
        rendered.push_str(ELLIPSIS);
    }
    rendered.push_str(excerpt.trim());
    if end < chars.len() {
        rendered.push_str(ELLIPSIS);
    }
    rendered
}

/// Character offset of the first occurrence of any term.
fn earliest_match<S: AsRef<str>>(text: &str, terms: &[S]) -> Option<usize> {
    let lowered = text.to_ascii_lowercase();

    let byte_offset = terms
        .iter()
        .map(|term| term.as_ref().to_ascii_lowercase())
        .filter(|term| !term.is_empty())
        .filter_map(|term| lowered.find(&term))
        .min()?;

    Some(lowered[..byte_offset].chars().count())
}
