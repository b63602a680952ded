//! Use cases
//!
//! - [`pool`]: warmed session pool with acquire/release, execute and health checks
//! - [`prompt_service`]: pooled prompt front door with retry and result recording
//! - [`batch_runner`]: bounded-parallel batch harness over fresh clients

pub mod batch_runner;
pub mod pool;
pub mod prompt_service;
