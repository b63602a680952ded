//! Infrastructure layer for abra-pool
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer, including configuration file loading.

pub mod config;
pub mod logging;
pub mod transport;

// Re-export commonly used types
pub use config::{
    ConfigError, ConfigIssue, ConfigLoader, FileBatchConfig, FileClientConfig, FileConfig,
    FileOutputConfig, FileOutputFormat, FilePoolConfig, FileProtocolConfig, Severity,
};
pub use logging::JsonlResultSink;
pub use transport::{
    DEFAULT_REQUEST_TIMEOUT, ReqwestTransport, ReqwestTransportFactory, make_session_proxy,
    redact_proxy,
};
