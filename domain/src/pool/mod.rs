//! Pool domain: per-slot lifecycle rules.

pub mod slot;
