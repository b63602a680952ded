//! Pool configuration from TOML (`[pool]` section)

use abra_application::PoolParams;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Raw pool configuration from TOML
///
/// Durations are plain integers so the section stays readable and can be
/// overridden from the environment (`ABRA_POOL__SIZE=4`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilePoolConfig {
    /// Number of session clients
    pub size: usize,
    /// Default acquire deadline in milliseconds
    pub queue_timeout_ms: u64,
    /// Clients initialized concurrently during warmup
    pub warmup_batch_size: usize,
    /// Pause between warmup batches in seconds
    pub stagger_delay_secs: u64,
    /// Interval between health checks in seconds
    pub health_check_interval_secs: u64,
    /// Age after which an idle session is refreshed, in seconds
    pub session_max_age_secs: u64,
    /// Sleep between acquire polls in milliseconds
    pub poll_interval_ms: u64,
}

impl Default for FilePoolConfig {
    fn default() -> Self {
        let params = PoolParams::default();
        Self {
            size: params.size,
            queue_timeout_ms: params.queue_timeout.as_millis() as u64,
            warmup_batch_size: params.warmup_batch_size,
            stagger_delay_secs: params.stagger_delay.as_secs(),
            health_check_interval_secs: params.health_check_interval.as_secs(),
            session_max_age_secs: params.session_max_age.as_secs(),
            poll_interval_ms: params.poll_interval.as_millis() as u64,
        }
    }
}

impl FilePoolConfig {
    pub fn to_pool_params(&self) -> PoolParams {
        PoolParams::default()
            .with_size(self.size)
            .with_queue_timeout(Duration::from_millis(self.queue_timeout_ms))
            .with_warmup_batch_size(self.warmup_batch_size)
            .with_stagger_delay(Duration::from_secs(self.stagger_delay_secs))
            .with_health_check_interval(Duration::from_secs(self.health_check_interval_secs))
            .with_session_max_age(Duration::from_secs(self.session_max_age_secs))
            .with_poll_interval(Duration::from_millis(self.poll_interval_ms))
    }
}
