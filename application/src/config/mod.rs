//! Application-level configuration.
//!
//! This module provides configuration types that control how use cases behave:
//!
//! - [`PoolParams`]: pool size, warmup batching, queue timeout, maintenance timing
//! - [`BatchParams`]: batch harness volume, parallelism and retries

pub mod batch_params;
pub mod pool_params;

pub use batch_params::{BatchParams, DEFAULT_BATCH_PROMPT};
pub use pool_params::PoolParams;
