//! Source reference extraction.
//!
//! References arrive three ways: inside streamed frames, from the follow-up
//! source query, or, when neither carries any, as redirector links embedded
//! in the answer text.

use crate::protocol::parser::{SourceReference, json_lines};
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

/// Redirector link wrapping the real target in its `u` parameter.
static INLINE_SOURCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://l\.meta\.ai/\?u=([^&\s]+)").unwrap());

/// First non-empty string among `keys`.
fn first_str<'a>(value: &'a Value, keys: &[&str]) -> &'a str {
    keys.iter()
        .filter_map(|key| value.get(*key).and_then(Value::as_str))
        .find(|s| !s.is_empty())
        .unwrap_or("")
}

/// Reference embedded in a streamed frame.
pub fn stream_reference(value: &Value) -> SourceReference {
    SourceReference::new(
        first_str(value, &["url"]),
        first_str(value, &["title"]),
        first_str(value, &["snippet"]),
    )
}

/// Reference returned by the source query, which uses looser field names.
pub fn query_reference(value: &Value) -> SourceReference {
    SourceReference::new(
        first_str(value, &["url", "link"]),
        first_str(value, &["title", "name"]),
        first_str(value, &["snippet", "description"]),
    )
}

/// Parse the body of the source query.
///
/// References live under `data.message.searchResults` or, in older
/// replies, `data.message.search_results`. The body is normally a single
/// JSON document; the first frame carrying `data` is used.
pub fn parse_source_query(body: &str) -> Vec<SourceReference> {
    let Some(frame) = json_lines(body).find(|frame| frame.get("data").is_some()) else {
        return Vec::new();
    };

    let Some(message) = frame.get("data").and_then(|d| d.get("message")) else {
        return Vec::new();
    };

    let results = ["searchResults", "search_results"]
        .iter()
        .filter_map(|key| message.get(*key))
        .find(|v| v.as_object().is_some_and(|m| !m.is_empty()));

    results
        .and_then(|r| r.get("references"))
        .and_then(Value::as_array)
        .map(|refs| refs.iter().map(query_reference).collect())
        .unwrap_or_default()
}

/// Extract redirector links from answer text, in left-to-right order.
///
/// The target is percent-decoded and its host becomes the label; a target
/// with no parseable host is its own label.
pub fn extract_inline_sources(text: &str) -> Vec<SourceReference> {
    INLINE_SOURCE
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|encoded| {
            let decoded =
                String::from_utf8_lossy(&urlencoding::decode_binary(encoded.as_str().as_bytes()))
                    .into_owned();
            let label = url::Url::parse(&decoded)
                .ok()
                .and_then(|u| u.host_str().map(str::to_string))
                .unwrap_or_else(|| decoded.clone());
            SourceReference::new(decoded, label, "")
        })
        .collect()
}
