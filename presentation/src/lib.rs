//! Presentation layer for abra-pool
//!
//! This crate contains the CLI definition and the console output
//! formatter.

pub mod cli;
pub mod output;

// Re-export commonly used types
pub use cli::commands::{Cli, Command, OutputFormat};
pub use output::console::ConsoleFormatter;
