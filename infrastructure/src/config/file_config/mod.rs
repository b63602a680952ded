//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! Each section converts into the application or domain type it configures.

mod batch;
mod client;
mod output;
mod pool;
mod protocol;

pub use batch::FileBatchConfig;
pub use client::FileClientConfig;
pub use output::{FileOutputConfig, FileOutputFormat};
pub use pool::FilePoolConfig;
pub use protocol::FileProtocolConfig;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// HTTP client settings
    pub client: FileClientConfig,
    /// Pool sizing and maintenance timing
    pub pool: FilePoolConfig,
    /// Session exhaustion detection
    pub protocol: FileProtocolConfig,
    /// Batch harness defaults
    pub batch: FileBatchConfig,
    /// Output settings
    pub output: FileOutputConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The value is accepted but probably not what was meant
    Warning,
    /// The value cannot work; the command should not start
    Error,
}

/// A single problem found by [`FileConfig::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigIssue {
    pub severity: Severity,
    /// Dotted key path, e.g. `pool.size`
    pub field: String,
    pub message: String,
}

impl ConfigIssue {
    fn error(field: &str, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            field: field.to_string(),
            message: message.into(),
        }
    }

    fn warning(field: &str, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl FileConfig {
    /// Validate the entire configuration, returning all detected issues.
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();

        let zero_checks = [
            ("pool.size", self.pool.size as u64),
            ("pool.warmup_batch_size", self.pool.warmup_batch_size as u64),
            ("pool.queue_timeout_ms", self.pool.queue_timeout_ms),
            ("pool.poll_interval_ms", self.pool.poll_interval_ms),
            (
                "pool.health_check_interval_secs",
                self.pool.health_check_interval_secs,
            ),
            ("client.request_timeout_secs", self.client.request_timeout_secs),
            ("batch.parallel", self.batch.parallel as u64),
        ];
        for (field, value) in zero_checks {
            if value == 0 {
                issues.push(ConfigIssue::error(field, "must be greater than 0"));
            }
        }

        if self.pool.warmup_batch_size > self.pool.size && self.pool.size > 0 {
            issues.push(ConfigIssue::warning(
                "pool.warmup_batch_size",
                format!(
                    "larger than pool.size ({}), the whole pool warms up at once",
                    self.pool.size
                ),
            ));
        }

        if let Some(proxy) = &self.client.proxy
            && let Err(e) = url::Url::parse(proxy)
        {
            issues.push(ConfigIssue::error(
                "client.proxy",
                format!("not a valid URL: {}", e),
            ));
        }

        if self.protocol.exhaustion_markers.is_empty() {
            issues.push(ConfigIssue::warning(
                "protocol.exhaustion_markers",
                "empty, exhausted sessions will never be detected",
            ));
        }

        if self.batch.prompt.trim().is_empty() {
            issues.push(ConfigIssue::warning("batch.prompt", "is empty"));
        }

        issues
    }

    /// True when [`validate`](Self::validate) found at least one error.
    pub fn has_errors(issues: &[ConfigIssue]) -> bool {
        issues.iter().any(|i| i.severity == Severity::Error)
    }
}
