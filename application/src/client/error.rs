//! Session client errors

use crate::ports::transport::TransportError;
use thiserror::Error;

/// Result type alias for session client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors raised while acquiring a session or sending a prompt
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Cookie extraction failed: {0}")]
    CookieExtractionFailed(String),

    #[error("Got 403 with challenge page but could not solve it: {0}")]
    ChallengeUnsolvable(String),

    #[error("Token acquisition failed: {0}")]
    TokenAcquisitionFailed(String),

    #[error("Session exhausted even after refresh")]
    SessionExhausted,

    #[error("Send message failed: {status} {body}")]
    MessageSendFailed { status: u16, body: String },

    #[error("Fetch sources failed: {0}")]
    SourceFetchFailed(String),

    #[error("{0}")]
    LowQualityResponse(String),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Substrings that mark an error message as a session/auth failure.
const SESSION_FAILURE_VOCABULARY: &[&str] = &[
    "access token",
    "LSD token",
    "401",
    "403",
    "session",
    "exhausted",
];

impl ClientError {
    /// Whether the slot that produced this error should be taken out of
    /// rotation and re-acquired.
    pub fn is_session_failure(&self) -> bool {
        match self {
            ClientError::CookieExtractionFailed(_)
            | ClientError::ChallengeUnsolvable(_)
            | ClientError::TokenAcquisitionFailed(_)
            | ClientError::SessionExhausted => true,
            ClientError::MessageSendFailed { status, .. } if matches!(status, 401 | 403) => true,
            // The message echoes upstream answer text
            ClientError::LowQualityResponse(_) => false,
            other => {
                let msg = other.to_string();
                SESSION_FAILURE_VOCABULARY.iter().any(|kw| msg.contains(kw))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acquisition_errors_are_session_failures() {
        assert!(ClientError::CookieExtractionFailed("x".into()).is_session_failure());
        assert!(ClientError::ChallengeUnsolvable("x".into()).is_session_failure());
        assert!(ClientError::TokenAcquisitionFailed("x".into()).is_session_failure());
        assert!(ClientError::SessionExhausted.is_session_failure());
    }

    #[test]
    fn test_auth_statuses_are_session_failures() {
        let err = ClientError::MessageSendFailed {
            status: 401,
            body: String::new(),
        };
        assert!(err.is_session_failure());

        let err = ClientError::MessageSendFailed {
            status: 500,
            body: "internal".into(),
        };
        assert!(!err.is_session_failure());
    }

    #[test]
    fn test_vocabulary_match() {
        let err = ClientError::MessageSendFailed {
            status: 400,
            body: "invalid session".into(),
        };
        assert!(err.is_session_failure());

        let err = ClientError::Transport(TransportError::Connection("HTTP 403 from proxy".into()));
        assert!(err.is_session_failure());

        let err = ClientError::Transport(TransportError::Timeout);
        assert!(!err.is_session_failure());
    }

    #[test]
    fn test_vocabulary_match_is_case_sensitive() {
        let err = ClientError::SourceFetchFailed("Session expired".into());
        assert!(!err.is_session_failure());

        let err = ClientError::SourceFetchFailed("missing LSD token".into());
        assert!(err.is_session_failure());
    }

    #[test]
    fn test_quality_rejection_is_not_session_failure() {
        let err = ClientError::LowQualityResponse("session exhausted text from the answer".into());
        assert!(!err.is_session_failure());
    }
}
