//! Application layer for abra-pool
//!
//! This crate contains the session client, the pool manager, use cases, port
//! definitions and application configuration. It depends only on the domain
//! layer.

pub mod client;
pub mod config;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use client::{ClientError, CredentialAcquirer, SessionClient};
pub use config::{BatchParams, DEFAULT_BATCH_PROMPT, PoolParams};
pub use ports::{
    result_sink::{NoResultSink, RequestRecord, ResultSink},
    transport::{
        HttpMethod, HttpRequest, HttpResponse, HttpTransport, TransportError, TransportFactory,
    },
};
pub use use_cases::batch_runner::{BatchRunner, BatchSummary};
pub use use_cases::pool::{ClientPool, HealthReport, PoolError, PoolLease, PoolStats, PooledSession};
pub use use_cases::prompt_service::{DEFAULT_COUNTRY, PromptRequest, PromptResponse, PromptService};
