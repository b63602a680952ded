//! CLI command definitions

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Output format for command results
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty-printed JSON, exactly what a caller of the service receives
    Json,
    /// Colored human-readable summary
    Text,
}

/// CLI arguments for abra-pool
#[derive(Parser, Debug)]
#[command(name = "abra-pool")]
#[command(author, version, about = "Pooled, self-healing meta.ai client")]
#[command(long_about = r#"
abra-pool talks to meta.ai through anonymous sessions. A pool of clients is
warmed up ahead of time, prompts borrow a ready client, and failed or aging
sessions are replaced in the background.

Configuration is merged from (highest priority first):
1. ABRA_<SECTION>__<KEY>   Environment (e.g. ABRA_POOL__SIZE=4)
2. --config <path>          Explicit config file
3. ./abra-pool.toml         Project-level config
4. ~/.config/abra-pool/config.toml   Global config

Example:
  abra-pool ask "What happened in Lisbon today?"
  abra-pool pool --pool-size 4 "First question" "Second question"
  abra-pool batch --total 100 --parallel 10
"#)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Output format (defaults to [output] format in config, then json)
    #[arg(short, long, value_enum, global = true)]
    pub output: Option<OutputFormat>,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long, global = true)]
    pub no_config: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Send one prompt through a single fresh client
    Ask {
        prompt: String,

        /// Proxy URL for this request (overrides [client] proxy)
        #[arg(long, value_name = "URL")]
        proxy: Option<String>,

        /// Keep the html and markdown renderings in the answer
        #[arg(long)]
        markdown: bool,
    },

    /// Warm up a pool and serve every prompt through it concurrently
    Pool {
        #[arg(required = true)]
        prompts: Vec<String>,

        /// Number of pooled clients (overrides [pool] size)
        #[arg(long, value_name = "N")]
        pool_size: Option<usize>,

        /// Country recorded with each request
        #[arg(long, default_value = "US")]
        country: String,

        /// Keep the html and markdown renderings in the answers
        #[arg(long)]
        markdown: bool,
    },

    /// Fire many independent requests and report the success rate
    Batch {
        /// Prompt to send (overrides [batch] prompt)
        #[arg(long)]
        prompt: Option<String>,

        /// Number of requests
        #[arg(long, value_name = "N")]
        total: Option<usize>,

        /// Requests in flight at once
        #[arg(long, value_name = "N")]
        parallel: Option<usize>,

        /// Extra attempts per request
        #[arg(long, value_name = "N")]
        max_retries: Option<usize>,
    },

    /// Show configuration sources and the effective configuration
    ShowConfig,
}
