//! Domain layer for abra-pool
//!
//! This crate contains the wire protocol, session value types and the pool
//! slot state machine. It performs no I/O and has no dependencies on
//! infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Session
//!
//! A session is the pair (anti-bot cookie set, temporary access token). It is
//! acquired from the landing page and the token mutation, then used until the
//! service exhausts it.
//!
//! ## Slot
//!
//! A slot pairs one session client with pool-visible flags (`ready`, `busy`,
//! `initializing`, session age). [`SlotState`] owns the transitions.

pub mod core;
pub mod pool;
pub mod protocol;
pub mod session;
pub mod util;

// Re-export commonly used types
pub use core::{
    error::DomainError,
    identity::{USER_AGENTS, user_agent_for},
};
pub use pool::slot::{SlotPhase, SlotState};
pub use protocol::{
    challenge::{CHALLENGE_MARKER, challenge_path, is_challenge},
    exhaustion::{ExhaustionPolicy, is_session_exhausted},
    extract::{CredentialExtractor, DelimiterExtractor, Delimiters, extract_value},
    graphql::{Operation, parse_access_token},
    parser::{ParsedMessage, SourceReference, parse_response},
    sources::{extract_inline_sources, parse_source_query},
    threading::generate_offline_threading_id,
};
pub use session::{
    credentials::{AccessToken, Credentials},
    quality::{MIN_UNSOURCED_CHARS, check_quality},
    result::{FailureBody, MODEL_NAME, PromptOutcome, ResultBody, Source, StructuredResult},
};
