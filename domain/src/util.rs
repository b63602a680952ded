//! Shared utility functions.

/// Take at most `max_chars` characters from `s`, for log lines and error
/// messages that embed upstream bodies.
pub fn preview(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((end, _)) => &s[..end],
        None => s,
    }
}
