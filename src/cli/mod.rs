//! CLI module for ccr-cutover
//!
//! Provides command-line interface for:
//! - cutover: promote caught-up follower indices
//! - bootstrap: establish missing follow relationships
//! - status: read-only checkpoint parity report

mod args;
mod commands;
mod config;
mod errors;

pub use args::{Cli, Command};
pub use commands::{
    bootstrap, cutover, execute_bootstrap, execute_cutover, execute_status, run, run_command,
    status,
};
pub use config::{ClusterConfig, Config, InventoryRetryConfig, PromotionRetryConfig};
pub use errors::{CliError, CliErrorCode, CliResult};
