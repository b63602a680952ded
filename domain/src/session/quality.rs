//! Quality gate for finished answers.
//!
//! The session client never rejects an answer on quality grounds. Callers
//! that can afford another attempt (with a fresh identity or proxy) run this
//! check and retry on rejection.

use crate::core::error::DomainError;
use crate::session::result::StructuredResult;
use crate::util::preview;

/// Answers shorter than this with no sources are rejected.
pub const MIN_UNSOURCED_CHARS: usize = 200;

/// Reject empty answers and short answers without sources.
pub fn check_quality(result: &StructuredResult) -> Result<(), DomainError> {
    let text = result.text();
    if text.trim().is_empty() {
        return Err(DomainError::EmptyResponse);
    }

    let length = text.chars().count();
    if length < MIN_UNSOURCED_CHARS && result.sources().is_empty() {
        return Err(DomainError::LowQuality {
            length,
            preview: preview(text, 100).to_string(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::parser::SourceReference;

    #[test]
    fn empty_text_rejected() {
        let result = StructuredResult::build("   ", &[]);
        assert_eq!(check_quality(&result), Err(DomainError::EmptyResponse));
    }

    #[test]
    fn short_unsourced_text_rejected() {
        let result = StructuredResult::build("I can't help with that.", &[]);
        let err = check_quality(&result).unwrap_err();
        assert!(matches!(err, DomainError::LowQuality { length: 23, .. }));
    }

    #[test]
    fn short_sourced_text_accepted() {
        let sources = vec![SourceReference::new("https://a.com", "a.com", "")];
        let result = StructuredResult::build("Short but cited.", &sources);
        assert!(check_quality(&result).is_ok());
    }

    #[test]
    fn long_unsourced_text_accepted() {
        let result = StructuredResult::build(&"word ".repeat(60), &[]);
        assert!(check_quality(&result).is_ok());
    }
}
