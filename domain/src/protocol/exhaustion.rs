//! Session exhaustion detection.
//!
//! An exhausted session gets a short, malformed reply instead of a streamed
//! answer, so the check runs on the raw body before any parsing. The
//! threshold and markers were observed empirically and are configurable.

use serde::{Deserialize, Serialize};

/// Bodies at or above this size are never treated as exhausted.
pub const DEFAULT_EXHAUSTION_THRESHOLD: usize = 1000;

/// Reply when the server no longer accepts the session's variables.
pub const MISSING_VARIABLE_MARKER: &str = "missing_required_variable_value";

/// Reply when the server returns no bot message at all.
pub const NULL_BOT_RESPONSE_MARKER: &str = "\"bot_response_message\":null";

/// Threshold-plus-markers exhaustion predicate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExhaustionPolicy {
    /// Maximum body length (bytes, exclusive) for an exhausted reply.
    pub threshold: usize,
    /// Any of these substrings marks a short body as exhausted.
    pub markers: Vec<String>,
}

impl Default for ExhaustionPolicy {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_EXHAUSTION_THRESHOLD,
            markers: vec![
                MISSING_VARIABLE_MARKER.to_string(),
                NULL_BOT_RESPONSE_MARKER.to_string(),
            ],
        }
    }
}

impl ExhaustionPolicy {
    /// True iff the body is shorter than the threshold and contains a marker.
    pub fn is_exhausted(&self, body: &str) -> bool {
        body.len() < self.threshold && self.markers.iter().any(|m| body.contains(m.as_str()))
    }
}

/// Exhaustion check with the default threshold and markers.
pub fn is_session_exhausted(body: &str) -> bool {
    body.len() < DEFAULT_EXHAUSTION_THRESHOLD
        && (body.contains(MISSING_VARIABLE_MARKER) || body.contains(NULL_BOT_RESPONSE_MARKER))
}
