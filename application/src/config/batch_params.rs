//! Batch harness parameters.

use serde::{Deserialize, Serialize};

pub const DEFAULT_BATCH_PROMPT: &str = "What do you know about Tesla's latest updates?";

/// Parameters for [`BatchRunner`](crate::use_cases::batch_runner::BatchRunner).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchParams {
    /// Number of independent requests.
    pub total: usize,
    /// Requests in flight at once.
    pub parallel: usize,
    /// Extra attempts per request after the first.
    pub max_retries: usize,
    /// Country recorded with each request.
    pub country: String,
}

impl Default for BatchParams {
    fn default() -> Self {
        Self {
            total: 1000,
            parallel: 15,
            max_retries: 2,
            country: "US".to_string(),
        }
    }
}

impl BatchParams {
    pub fn with_total(mut self, total: usize) -> Self {
        self.total = total;
        self
    }

    pub fn with_parallel(mut self, parallel: usize) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country = country.into();
        self
    }
}
