//! Shared text utilities.

/// Truncate a string to approximately `max_bytes` without splitting a UTF-8
/// character boundary.
///
/// Returns a sub-slice of the original string. If the string is shorter than
/// `max_bytes`, the entire string is returned unchanged.
pub fn truncate_str(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Estimate the token cost of a text.
///
/// Uses the common `chars / 4` approximation, rounded up, so that any
/// non-empty text costs at least one unit.
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(4)
}

/// Collapse whitespace and lower-case a text for duplicate detection.
pub fn normalize(text: &str) -> String {
    text.split_whitespace()
        .map(|w| w.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ")
}

/// The first sentence of a text (up to `.`, `!`, `?` or a line break),
/// trimmed and capped at `max_bytes`.
pub fn first_sentence(text: &str, max_bytes: usize) -> String {
    let trimmed = text.trim();
    let end = trimmed
        .char_indices()
        .find(|(_, c)| matches!(c, '.' | '!' | '?' | '\n'))
        .map(|(i, c)| if c == '\n' { i } else { i + c.len_utf8() })
        .unwrap_or(trimmed.len());
    truncate_str(trimmed[..end].trim(), max_bytes).to_string()
}

/// Lower-cased alphanumeric words of at least `min_len` characters.
pub fn content_words(text: &str, min_len: usize) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(move |w| w.chars().count() >= min_len)
        .map(|w| w.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_ascii() {
        assert_eq!(truncate_str("hello world", 5), "hello");
    }

    #[test]
    fn truncate_no_op_when_short() {
        assert_eq!(truncate_str("hi", 10), "hi");
    }

    #[test]
    fn truncate_multibyte_boundary() {
        let s = "あのね";
        assert_eq!(truncate_str(s, 4), "あ");
        assert_eq!(truncate_str(s, 6), "あの");
    }

    #[test]
    fn estimate_tokens_rounds_up() {
        assert_eq!(estimate_tokens(""), 0);
        assert_eq!(estimate_tokens("abc"), 1);
        assert_eq!(estimate_tokens("abcd"), 1);
        assert_eq!(estimate_tokens("abcde"), 2);
    }

    #[test]
    fn normalize_collapses_case_and_whitespace() {
        assert_eq!(normalize("  Write   the\tDocs "), "write the docs");
    }

    #[test]
    fn first_sentence_stops_at_terminator() {
        assert_eq!(first_sentence("Use Postgres. It scales.", 100), "Use Postgres.");
        assert_eq!(first_sentence("Ship it\nthen measure", 100), "Ship it");
        assert_eq!(first_sentence("no terminator", 100), "no terminator");
        assert_eq!(first_sentence("abcdefgh", 3), "abc");
    }

    #[test]
    fn content_words_filters_short_words() {
        let words: Vec<_> = content_words("We use the Cache, always!", 4).collect();
        assert_eq!(words, vec!["cache", "always"]);
    }
}
