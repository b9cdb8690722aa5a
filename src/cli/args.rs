use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Validate host security policies and keep their status in sync"
)]
pub struct Args {
    /// Path to configuration file (TOML)
    #[arg(long = "config", value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Validate policy manifests and print their status without writing anything
    Check {
        /// Policy manifests (YAML)
        #[arg(required = true, value_name = "FILE")]
        files: Vec<PathBuf>,
    },

    /// Watch a manifest directory and keep every policy's status in sync
    Run(RunArgs),
}

#[derive(clap::Args, Debug, Default, Clone)]
pub struct RunArgs {
    /// Directory holding policy manifests
    #[arg(long = "dir", value_name = "DIR")]
    pub dir: Option<PathBuf>,

    /// Maximum number of concurrent reconciliations
    #[arg(long = "workers")]
    pub workers: Option<usize>,

    /// Interval between directory scans, in milliseconds
    #[arg(long = "poll-interval-ms")]
    pub poll_interval_ms: Option<u64>,

    /// Delay before retrying a failed reconciliation, in milliseconds
    #[arg(long = "retry-backoff-ms")]
    pub retry_backoff_ms: Option<u64>,

    /// Delete policies that fail validation instead of only flagging them
    #[arg(long = "delete-invalid")]
    pub delete_invalid: bool,
}
