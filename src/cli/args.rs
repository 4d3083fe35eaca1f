//! CLI argument definitions using clap
//!
//! Commands:
//! - ccr-cutover cutover --config <path> [--dry-run] [--yes]
//! - ccr-cutover bootstrap --config <path> [--dry-run]
//! - ccr-cutover status --config <path>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Promote cross-cluster replication followers and bootstrap follow
/// relationships
#[derive(Parser, Debug)]
#[command(name = "ccr-cutover")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Promote every caught-up follower index to a writable index
    Cutover {
        /// Path to configuration file
        #[arg(long, default_value = "./ccr.json")]
        config: PathBuf,

        /// Discover and validate only; change nothing
        #[arg(long)]
        dry_run: bool,

        /// Do not prompt for confirmation
        #[arg(long)]
        yes: bool,
    },

    /// Follow every open leader index that is not followed yet
    Bootstrap {
        /// Path to configuration file
        #[arg(long, default_value = "./ccr.json")]
        config: PathBuf,

        /// Report the plan only
        #[arg(long)]
        dry_run: bool,
    },

    /// Report follower checkpoint parity without changing anything
    Status {
        /// Path to configuration file
        #[arg(long, default_value = "./ccr.json")]
        config: PathBuf,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
