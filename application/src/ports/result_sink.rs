//! Port for persisting request outcomes.
//!
//! Every prompt handled by the front door or the batch runner produces one
//! [`RequestRecord`], success or failure, for later analysis of success
//! rates, latencies and failure modes.
//!
//! This is separate from `tracing` diagnostics: tracing is for humans, the
//! sink is a machine-readable ledger.

use abra_domain::PromptOutcome;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One persisted request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestRecord {
    /// 8 lowercase hex characters.
    pub id: String,
    /// RFC 3339 UTC timestamp.
    pub timestamp: String,
    /// Unix epoch milliseconds.
    pub timestamp_unix: i64,
    pub duration_ms: u64,
    pub retried: bool,
    pub prompt: String,
    pub country: String,
    pub status_code: u16,
    pub success: bool,
    pub text_length: usize,
    pub source_count: usize,
    pub model: Option<String>,
    pub result: serde_json::Value,
}

impl RequestRecord {
    /// Create a record stamped with the current time.
    ///
    /// Derived fields (`success`, lengths, model) come from the outcome.
    pub fn new(prompt: impl Into<String>, country: impl Into<String>, outcome: &PromptOutcome) -> Self {
        let now = chrono::Utc::now();
        Self {
            id: format!("{:08x}", rand::random::<u32>()),
            timestamp: now.to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            timestamp_unix: now.timestamp_millis(),
            duration_ms: 0,
            retried: false,
            prompt: prompt.into(),
            country: country.into(),
            status_code: if outcome.is_success() { 200 } else { 502 },
            success: outcome.is_success(),
            text_length: outcome.text_length(),
            source_count: outcome.source_count(),
            model: outcome.model().map(str::to_string),
            result: serde_json::to_value(outcome).unwrap_or(serde_json::Value::Null),
        }
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration_ms = duration.as_millis() as u64;
        self
    }

    pub fn with_retried(mut self, retried: bool) -> Self {
        self.retried = retried;
        self
    }

    pub fn with_status_code(mut self, status_code: u16) -> Self {
        self.status_code = status_code;
        self
    }
}

/// Port for persisting request records.
///
/// `record` is synchronous and non-fallible; a sink that cannot write logs
/// the problem and carries on.
pub trait ResultSink: Send + Sync {
    fn record(&self, record: RequestRecord);
}

/// No-op implementation for tests and when persistence is disabled.
pub struct NoResultSink;

impl ResultSink for NoResultSink {
    fn record(&self, _record: RequestRecord) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use abra_domain::{SourceReference, StructuredResult};

    #[test]
    fn test_record_from_success() {
        let outcome: PromptOutcome = StructuredResult::build(
            "  héllo  ",
            &[SourceReference::new("https://a.example", "a", "")],
        )
        .into();
        let record = RequestRecord::new("prompt", "US", &outcome)
            .with_duration(Duration::from_millis(1500))
            .with_retried(true);

        assert_eq!(record.id.len(), 8);
        assert!(record.id.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(record.status_code, 200);
        assert!(record.success);
        assert_eq!(record.text_length, 5);
        assert_eq!(record.source_count, 1);
        assert_eq!(record.model.as_deref(), Some("meta-ai"));
        assert_eq!(record.duration_ms, 1500);
        assert!(record.retried);
        assert_eq!(record.result["result"]["text"], "héllo");
        assert!(record.timestamp.ends_with('Z'));
    }

    #[test]
    fn test_record_from_failure() {
        let outcome = PromptOutcome::failure("boom");
        let record = RequestRecord::new("prompt", "DE", &outcome);

        assert_eq!(record.status_code, 502);
        assert!(!record.success);
        assert_eq!(record.text_length, 0);
        assert_eq!(record.model, None);
        assert_eq!(record.result["error"], "boom");
        assert_eq!(record.result["success"], false);
    }
}
