//! Upstream wire protocol.
//!
//! Pure functions over request/response bodies. Nothing here performs I/O:
//!
//! - [`extract`]: landing-page credential extraction (pluggable strategy)
//! - [`challenge`]: bot-detection challenge recognition
//! - [`graphql`]: persisted operations, variables and token parsing
//! - [`parser`]: streamed NDJSON reply parsing
//! - [`sources`]: structured, queried and inline source references
//! - [`exhaustion`]: exhausted-session predicate
//! - [`threading`]: offline threading id generation

pub mod challenge;
pub mod exhaustion;
pub mod extract;
pub mod graphql;
pub mod parser;
pub mod sources;
pub mod threading;
