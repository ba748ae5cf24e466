//! Line-break trimming and the minimum-length policy for extracted content.

/// Strip leading and trailing `\n` / `\r`. Everything else is preserved.
pub fn normalize(text: &str) -> &str {
    text.trim_matches(|c| c == '\n' || c == '\r')
}

/// Replace every run of whitespace with one space and trim both ends.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Whether `text` holds at least `min_chars` characters.
pub fn meets_min_length(text: &str, min_chars: usize) -> bool {
    text.chars().nth(min_chars.saturating_sub(1)).is_some() || min_chars == 0
}
