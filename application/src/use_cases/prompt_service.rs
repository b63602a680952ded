//! Prompt front door.
//!
//! Runs one prompt through the pool with a single pool-level retry, shapes
//! the answer for the caller and records the outcome. Raw errors never cross
//! this boundary; callers always get a [`PromptOutcome`].

use crate::ports::result_sink::{NoResultSink, RequestRecord, ResultSink};
use crate::use_cases::pool::{ClientPool, PoolError, PooledSession};
use abra_domain::util::preview;
use abra_domain::{PromptOutcome, StructuredResult};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

pub const DEFAULT_COUNTRY: &str = "US";

/// A caller's prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptRequest {
    pub prompt: String,
    #[serde(default = "default_country")]
    pub country: String,
    /// Keep the `html` and `markdown` renderings in the answer.
    #[serde(default)]
    pub include_markdown: bool,
}

fn default_country() -> String {
    DEFAULT_COUNTRY.to_string()
}

impl PromptRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            country: default_country(),
            include_markdown: false,
        }
    }

    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country = country.into();
        self
    }

    pub fn with_markdown(mut self, include: bool) -> Self {
        self.include_markdown = include;
        self
    }
}

/// HTTP-style status plus the caller-facing body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PromptResponse {
    pub status_code: u16,
    pub body: PromptOutcome,
}

pub struct PromptService<C: PooledSession> {
    pool: Arc<ClientPool<C>>,
    sink: Arc<dyn ResultSink>,
}

impl<C: PooledSession> PromptService<C> {
    pub fn new(pool: Arc<ClientPool<C>>) -> Self {
        Self {
            pool,
            sink: Arc::new(NoResultSink),
        }
    }

    pub fn with_sink(mut self, sink: Arc<dyn ResultSink>) -> Self {
        self.sink = sink;
        self
    }

    pub async fn handle(&self, request: PromptRequest) -> PromptResponse {
        if request.prompt.is_empty() {
            return PromptResponse {
                status_code: 400,
                body: PromptOutcome::failure("prompt is required"),
            };
        }

        let started = Instant::now();
        info!(
            "Received prompt: \"{}...\" (country={})",
            preview(&request.prompt, 50),
            request.country
        );

        let mut retried = false;
        let result = match self.run(&request.prompt).await {
            Ok(result) => Ok(result),
            Err(e) => {
                // A second execute may land on a different healthy client
                warn!("First attempt failed: {}", e);
                retried = true;
                self.run(&request.prompt).await
            }
        };

        let (status_code, body) = match result {
            Ok(result) => {
                let result = if request.include_markdown {
                    result
                } else {
                    result.without_markup()
                };
                (200, PromptOutcome::from(result))
            }
            Err(e) => {
                warn!("Prompt failed: {}", e);
                (502, PromptOutcome::failure(e.to_string()))
            }
        };

        self.sink.record(
            RequestRecord::new(&request.prompt, &request.country, &body)
                .with_duration(started.elapsed())
                .with_retried(retried)
                .with_status_code(status_code),
        );

        PromptResponse { status_code, body }
    }

    async fn run(&self, prompt: &str) -> Result<StructuredResult, PoolError> {
        let prompt = prompt.to_string();
        self.pool
            .execute(move |client| async move { client.send_prompt(&prompt).await })
            .await
    }
}
