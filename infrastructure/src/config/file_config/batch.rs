//! Batch harness configuration from TOML (`[batch]` section)

use abra_application::{BatchParams, DEFAULT_BATCH_PROMPT};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileBatchConfig {
    /// Prompt sent by every request
    pub prompt: String,
    pub total: usize,
    pub parallel: usize,
    pub max_retries: usize,
    /// Country used for proxy sessions and recorded with each result
    pub country: String,
}

impl Default for FileBatchConfig {
    fn default() -> Self {
        let params = BatchParams::default();
        Self {
            prompt: DEFAULT_BATCH_PROMPT.to_string(),
            total: params.total,
            parallel: params.parallel,
            max_retries: params.max_retries,
            country: params.country,
        }
    }
}

impl FileBatchConfig {
    pub fn to_batch_params(&self) -> BatchParams {
        BatchParams::default()
            .with_total(self.total)
            .with_parallel(self.parallel)
            .with_max_retries(self.max_retries)
            .with_country(self.country.clone())
    }
}
