//! Caller-facing result shapes.
//!
//! [`StructuredResult`] is the normalized success payload built once per
//! request. [`PromptOutcome`] is what crosses the caller boundary: either that
//! payload, or `{"success": false, "error": "..."}`. Raw errors never leave
//! the boundary.

use crate::protocol::parser::SourceReference;
use serde::{Deserialize, Serialize};

/// Model label reported for every answer.
pub const MODEL_NAME: &str = "meta-ai";

/// A source reference with its position in the answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub position: usize,
    pub url: String,
    pub label: String,
    pub description: String,
}

/// Body of a successful result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultBody {
    pub text: String,
    pub sources: Vec<Source>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub markdown: Option<String>,
    #[serde(default)]
    pub search_queries: Vec<String>,
    #[serde(default)]
    pub shopping_cards: Vec<serde_json::Value>,
    pub model: String,
}

/// Normalized answer for one prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredResult {
    pub success: bool,
    pub result: ResultBody,
}

impl StructuredResult {
    /// Build the result from parsed text and raw sources.
    ///
    /// Positions are assigned `0..n-1` in input order and `success` is
    /// always true.
    pub fn build(text: &str, sources: &[SourceReference]) -> Self {
        let clean = text.trim().to_string();
        let sources = sources
            .iter()
            .enumerate()
            .map(|(position, src)| Source {
                position,
                url: src.url.clone(),
                label: src.label.clone(),
                description: src.description.clone(),
            })
            .collect();

        Self {
            success: true,
            result: ResultBody {
                markdown: Some(clean.clone()),
                html: Some(String::new()),
                text: clean,
                sources,
                search_queries: Vec::new(),
                shopping_cards: Vec::new(),
                model: MODEL_NAME.to_string(),
            },
        }
    }

    /// Drop the optional `html` and `markdown` renderings.
    pub fn without_markup(mut self) -> Self {
        self.result.html = None;
        self.result.markdown = None;
        self
    }

    pub fn text(&self) -> &str {
        &self.result.text
    }

    pub fn sources(&self) -> &[Source] {
        &self.result.sources
    }
}

/// Failure payload surfaced at the caller boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureBody {
    pub success: bool,
    pub error: String,
}

/// Outcome of a prompt as seen by callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PromptOutcome {
    Success(StructuredResult),
    Failure(FailureBody),
}

impl PromptOutcome {
    pub fn failure(error: impl Into<String>) -> Self {
        PromptOutcome::Failure(FailureBody {
            success: false,
            error: error.into(),
        })
    }

    pub fn is_success(&self) -> bool {
        matches!(self, PromptOutcome::Success(_))
    }

    pub fn text_length(&self) -> usize {
        match self {
            PromptOutcome::Success(r) => r.result.text.chars().count(),
            PromptOutcome::Failure(_) => 0,
        }
    }

    pub fn source_count(&self) -> usize {
        match self {
            PromptOutcome::Success(r) => r.result.sources.len(),
            PromptOutcome::Failure(_) => 0,
        }
    }

    pub fn model(&self) -> Option<&str> {
        match self {
            PromptOutcome::Success(r) => Some(&r.result.model),
            PromptOutcome::Failure(_) => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            PromptOutcome::Success(_) => None,
            PromptOutcome::Failure(f) => Some(&f.error),
        }
    }
}

impl From<StructuredResult> for PromptOutcome {
    fn from(result: StructuredResult) -> Self {
        PromptOutcome::Success(result)
    }
}
