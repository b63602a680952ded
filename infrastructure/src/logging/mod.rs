//! Result persistence: one JSON line per request.
//!
//! Provides [`JsonlResultSink`], an append-only JSONL writer that implements
//! the [`ResultSink`](abra_application::ResultSink) port.

mod jsonl_sink;

pub use jsonl_sink::JsonlResultSink;
