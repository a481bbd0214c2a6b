/// Take the first `max_chars` characters and append an ellipsis.
///
/// The ellipsis is always appended, even when nothing was cut, so every
/// teaser reads as an excerpt.
pub fn truncate_with_ellipsis(s: &str, max_chars: usize) -> String {
    let mut truncated: String = s.chars().take(max_chars).collect();
    truncated.push_str("...");
    truncated
}

/// First `delimiter`-separated segment, trimmed; None when it is empty
pub fn first_segment(s: &str, delimiter: char) -> Option<&str> {
    s.split(delimiter)
        .next()
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
}

/// Format an optional string, returning a default if None
pub fn format_optional(value: &Option<String>, default: &str) -> String {
    value.as_deref().unwrap_or(default).to_string()
}
