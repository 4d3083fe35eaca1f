//! ccr-cutover CLI entry point
//!
//! Parses arguments, dispatches to the CLI module and maps the run status
//! onto the process exit code. Errors are printed to stderr and exit 1.

use ccr_cutover::cli;

fn main() {
    match cli::run() {
        Ok(status) => std::process::exit(status.exit_code()),
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    }
}
