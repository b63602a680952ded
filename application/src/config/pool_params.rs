//! Pool parameters: warmup, queueing and maintenance timing.
//!
//! [`PoolParams`] groups the static parameters that control
//! [`ClientPool`](crate::use_cases::pool::ClientPool). Defaults match the
//! values the service tolerates in practice.

use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolParams {
    /// Number of slots (session clients).
    pub size: usize,
    /// Default bound on how long `acquire` waits for a free slot.
    pub queue_timeout: Duration,
    /// Slots initialized concurrently per warmup batch.
    pub warmup_batch_size: usize,
    /// Pause between warmup batches.
    pub stagger_delay: Duration,
    /// Period of the background health check.
    pub health_check_interval: Duration,
    /// Idle sessions older than this are proactively replaced.
    pub session_max_age: Duration,
    /// How often a waiting `acquire` re-scans the slots.
    pub poll_interval: Duration,
}

impl Default for PoolParams {
    fn default() -> Self {
        Self {
            size: 15,
            queue_timeout: Duration::from_secs(120),
            warmup_batch_size: 2,
            stagger_delay: Duration::from_secs(5),
            health_check_interval: Duration::from_secs(60),
            session_max_age: Duration::from_secs(10 * 60),
            poll_interval: Duration::from_millis(100),
        }
    }
}

impl PoolParams {
    // ==================== Builder Methods ====================

    pub fn with_size(mut self, size: usize) -> Self {
        self.size = size;
        self
    }

    pub fn with_queue_timeout(mut self, timeout: Duration) -> Self {
        self.queue_timeout = timeout;
        self
    }

    pub fn with_warmup_batch_size(mut self, size: usize) -> Self {
        self.warmup_batch_size = size;
        self
    }

    pub fn with_stagger_delay(mut self, delay: Duration) -> Self {
        self.stagger_delay = delay;
        self
    }

    pub fn with_health_check_interval(mut self, interval: Duration) -> Self {
        self.health_check_interval = interval;
        self
    }

    pub fn with_session_max_age(mut self, age: Duration) -> Self {
        self.session_max_age = age;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let params = PoolParams::default();
        assert_eq!(params.size, 15);
        assert_eq!(params.queue_timeout, Duration::from_secs(120));
        assert_eq!(params.warmup_batch_size, 2);
        assert_eq!(params.stagger_delay, Duration::from_secs(5));
        assert_eq!(params.health_check_interval, Duration::from_secs(60));
        assert_eq!(params.session_max_age, Duration::from_secs(600));
        assert_eq!(params.poll_interval, Duration::from_millis(100));
    }

    #[test]
    fn test_builders() {
        let params = PoolParams::default()
            .with_size(3)
            .with_queue_timeout(Duration::from_secs(1))
            .with_stagger_delay(Duration::ZERO);
        assert_eq!(params.size, 3);
        assert_eq!(params.queue_timeout, Duration::from_secs(1));
        assert_eq!(params.stagger_delay, Duration::ZERO);
    }
}
