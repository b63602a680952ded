//! Streaming response parser.
//!
//! The send-message reply is newline-delimited JSON. The server re-emits the
//! same logical message several times at increasing completeness, under one of
//! two envelope shapes:
//!
//! ```text
//! {"data":{"node":{"bot_response_message":{...}, "search_results":{...}}}}
//! {"data":{"xfb_abra_send_message":{"bot_response_message":{..., "search_results":{...}}}}}
//! ```
//!
//! The last frame whose `composed_text.content` is non-empty wins outright;
//! frames are never merged.

use crate::protocol::sources::{extract_inline_sources, stream_reference};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A source reference as reported by the service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceReference {
    pub url: String,
    pub label: String,
    pub description: String,
}

impl SourceReference {
    pub fn new(
        url: impl Into<String>,
        label: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            label: label.into(),
            description: description.into(),
        }
    }
}

/// Result of parsing one raw streamed payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedMessage {
    pub text: String,
    pub sources: Vec<SourceReference>,
    /// Handle for the follow-up source query (`fetch_id` on the wire).
    pub continuation_handle: Option<String>,
}

/// Iterate the parseable JSON frames of an NDJSON body.
///
/// Blank and malformed lines are skipped.
pub fn json_lines(body: &str) -> impl Iterator<Item = Value> + '_ {
    body.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| serde_json::from_str::<Value>(line).ok())
}

/// Non-empty JSON object, mirroring the service's "present and non-empty"
/// convention for optional envelope fields.
fn non_empty_object(value: &Value) -> Option<&Value> {
    value
        .as_object()
        .filter(|map| !map.is_empty())
        .map(|_| value)
}

fn bot_payload(frame: &Value) -> Option<&Value> {
    let data = frame.get("data")?;
    data.get("node")
        .and_then(|node| node.get("bot_response_message"))
        .and_then(non_empty_object)
        .or_else(|| {
            data.get("xfb_abra_send_message")
                .and_then(|msg| msg.get("bot_response_message"))
                .and_then(non_empty_object)
        })
}

fn search_references(frame: &Value) -> Option<&Vec<Value>> {
    let data = frame.get("data")?;
    let results = data
        .get("node")
        .and_then(|node| node.get("search_results"))
        .and_then(non_empty_object)
        .or_else(|| {
            data.get("xfb_abra_send_message")
                .and_then(|msg| msg.get("bot_response_message"))
                .and_then(|bot| bot.get("search_results"))
                .and_then(non_empty_object)
        })?;
    results.get("references")?.as_array()
}

fn content_parts(payload: &Value) -> Option<&Vec<Value>> {
    payload
        .get("composed_text")?
        .get("content")?
        .as_array()
        .filter(|parts| !parts.is_empty())
}

/// Parse a streamed send-message reply.
pub fn parse_response(body: &str) -> ParsedMessage {
    let mut last_valid: Option<Value> = None;
    let mut sources = Vec::new();
    let mut continuation_handle = None;

    for frame in json_lines(body) {
        if let Some(payload) = bot_payload(&frame) {
            if content_parts(payload).is_some() {
                last_valid = Some(payload.clone());
            }
            if let Some(handle) = payload
                .get("fetch_id")
                .and_then(Value::as_str)
                .filter(|h| !h.is_empty())
            {
                continuation_handle = Some(handle.to_string());
            }
        }

        if let Some(references) = search_references(&frame) {
            sources.extend(references.iter().map(stream_reference));
        }
    }

    let Some(payload) = last_valid else {
        return ParsedMessage::default();
    };

    let text = content_parts(&payload)
        .map(|parts| {
            parts
                .iter()
                .map(|part| part.get("text").and_then(Value::as_str).unwrap_or(""))
                .collect::<Vec<_>>()
                .join("\n")
        })
        .unwrap_or_default();

    if sources.is_empty() {
        sources = extract_inline_sources(&text);
    }

    ParsedMessage {
        text,
        sources,
        continuation_handle,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn node_frame(parts: &[&str], fetch_id: Option<&str>) -> String {
        let content: Vec<_> = parts.iter().map(|t| json!({ "text": t })).collect();
        let mut msg = json!({ "composed_text": { "content": content } });
        if let Some(id) = fetch_id {
            msg["fetch_id"] = json!(id);
        }
        json!({ "data": { "node": { "bot_response_message": msg } } }).to_string()
    }

    #[test]
    fn last_frame_with_content_wins() {
        let body = [
            node_frame(&["Partial "], None),
            node_frame(&["Full response text here."], Some("fetch_abc123")),
        ]
        .join("\n");

        let parsed = parse_response(&body);
        assert_eq!(parsed.text, "Full response text here.");
        assert_eq!(parsed.continuation_handle.as_deref(), Some("fetch_abc123"));
    }

    #[test]
    fn earlier_content_does_not_leak_past_empty_frames() {
        let body = [
            node_frame(&["first"], None),
            node_frame(&["second, longer"], None),
            node_frame(&[], Some("late-handle")),
            "not json at all".to_string(),
            String::new(),
        ]
        .join("\n");

        let parsed = parse_response(&body);
        assert_eq!(parsed.text, "second, longer");
        assert!(!parsed.text.contains("first"));
        assert_eq!(parsed.continuation_handle.as_deref(), Some("late-handle"));
    }

    #[test]
    fn structured_sources_collected() {
        let body = json!({
            "data": {
                "node": {
                    "bot_response_message": {
                        "composed_text": { "content": [{ "text": "Answer with sources" }] }
                    },
                    "search_results": {
                        "references": [
                            { "url": "https://example.com", "title": "Example", "snippet": "A test source" }
                        ]
                    }
                }
            }
        })
        .to_string();

        let parsed = parse_response(&body);
        assert_eq!(parsed.text, "Answer with sources");
        assert_eq!(
            parsed.sources,
            vec![SourceReference::new(
                "https://example.com",
                "Example",
                "A test source"
            )]
        );
    }

    #[test]
    fn sources_accumulate_across_frames_in_order() {
        let frame = |url: &str| {
            json!({
                "data": { "xfb_abra_send_message": { "bot_response_message": {
                    "composed_text": { "content": [{ "text": "t" }] },
                    "search_results": { "references": [{ "url": url }] }
                }}}
            })
            .to_string()
        };
        let body = format!("{}\n{}", frame("https://one"), frame("https://two"));

        let urls: Vec<_> = parse_response(&body)
            .sources
            .into_iter()
            .map(|s| s.url)
            .collect();
        assert_eq!(urls, vec!["https://one", "https://two"]);
    }

    #[test]
    fn alternate_envelope_shape() {
        let body = json!({
            "data": { "xfb_abra_send_message": { "bot_response_message": {
                "composed_text": { "content": [{ "text": "Alt format response" }] }
            }}}
        })
        .to_string();
        assert_eq!(parse_response(&body).text, "Alt format response");
    }

    #[test]
    fn empty_node_falls_back_to_alternate_shape() {
        let body = json!({
            "data": {
                "node": { "bot_response_message": null },
                "xfb_abra_send_message": { "bot_response_message": {
                    "composed_text": { "content": [{ "text": "from fallback" }] }
                }}
            }
        })
        .to_string();
        assert_eq!(parse_response(&body).text, "from fallback");
    }

    #[test]
    fn empty_body() {
        let parsed = parse_response("");
        assert_eq!(parsed, ParsedMessage::default());
        assert!(parsed.continuation_handle.is_none());
    }

    #[test]
    fn handle_without_content_yields_nothing() {
        let parsed = parse_response(&node_frame(&[], Some("orphan")));
        assert_eq!(parsed, ParsedMessage::default());
    }

    #[test]
    fn multipart_content_joined_with_newlines() {
        let body = node_frame(&["Part one.", "Part two.", "Part three."], None);
        assert_eq!(parse_response(&body).text, "Part one.\nPart two.\nPart three.");
    }

    #[test]
    fn inline_sources_used_when_no_structured_sources() {
        let body = node_frame(
            &["See https://l.meta.ai/?u=https%3A%2F%2Fexample.com%2Fpage1 for details"],
            None,
        );
        let parsed = parse_response(&body);
        assert_eq!(parsed.sources.len(), 1);
        assert_eq!(parsed.sources[0].url, "https://example.com/page1");
        assert_eq!(parsed.sources[0].label, "example.com");
    }

    #[test]
    fn json_lines_skips_garbage() {
        let frames: Vec<_> = json_lines("{\"a\":1}\n\n  \n{oops\n {\"b\":2} ").collect();
        assert_eq!(frames, vec![json!({"a": 1}), json!({"b": 2})]);
    }
}
