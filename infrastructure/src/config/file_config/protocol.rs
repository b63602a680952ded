//! Upstream protocol tuning from TOML (`[protocol]` section)

use abra_domain::ExhaustionPolicy;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileProtocolConfig {
    /// Replies at or above this many bytes are never treated as exhausted
    pub exhaustion_threshold: usize,
    /// Substrings that mark a short reply as an exhausted session
    pub exhaustion_markers: Vec<String>,
}

impl Default for FileProtocolConfig {
    fn default() -> Self {
        let policy = ExhaustionPolicy::default();
        Self {
            exhaustion_threshold: policy.threshold,
            exhaustion_markers: policy.markers,
        }
    }
}

impl FileProtocolConfig {
    pub fn to_exhaustion_policy(&self) -> ExhaustionPolicy {
        ExhaustionPolicy {
            threshold: self.exhaustion_threshold,
            markers: self.exhaustion_markers.clone(),
        }
    }
}
