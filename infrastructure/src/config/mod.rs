//! Configuration file loading for abra-pool
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `ABRA_` environment variables (`ABRA_POOL__SIZE=4`)
//! 2. `--config <path>` specified file
//! 3. Project root: `./abra-pool.toml` or `./.abra-pool.toml`
//! 4. XDG config: `$XDG_CONFIG_HOME/abra-pool/config.toml`
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    ConfigIssue, FileBatchConfig, FileClientConfig, FileConfig, FileOutputConfig,
    FileOutputFormat, FilePoolConfig, FileProtocolConfig, Severity,
};
pub use loader::{ConfigError, ConfigLoader};
