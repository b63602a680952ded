//! Domain error types

use thiserror::Error;

/// Domain-level errors raised while interpreting upstream payloads.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error(
        "Failed to extract LSD token from landing page. Bot detection likely triggered. Try with a proxy."
    )]
    MissingLsdToken,

    #[error("Failed to parse access token response: {0}")]
    NoTokenData(String),

    #[error("Failed to extract access token: missing `{path}`. Response: {preview}")]
    TokenPathMissing { path: &'static str, preview: String },

    #[error("Empty response from Meta AI")]
    EmptyResponse,

    #[error("Low-quality response ({length} chars, no sources): {preview}")]
    LowQuality { length: usize, preview: String },
}

impl DomainError {
    /// Check if this error comes from the caller-side quality gate
    pub fn is_quality_rejection(&self) -> bool {
        matches!(
            self,
            DomainError::EmptyResponse | DomainError::LowQuality { .. }
        )
    }
}
