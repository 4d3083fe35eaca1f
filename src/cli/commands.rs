//! CLI command implementations
//!
//! Each command loads the configuration, builds the HTTP clients, then runs
//! its async body on a dedicated tokio runtime. The async bodies are public
//! and generic over the index service so they can run against any cluster
//! model.

use std::path::Path;

use uuid::Uuid;

use crate::client::{HttpIndexService, IndexService};
use crate::cutover::{AssumeYes, Confirm, CutoverOrchestrator, StdinConfirmer};
use crate::observability::{json_list, log_event, Event};
use crate::reconcile::ReconciliationEngine;
use crate::status::RunStatus;

use super::args::Command;
use super::config::Config;
use super::errors::{CliError, CliResult};

/// Parse arguments and run the selected command.
pub fn run() -> CliResult<RunStatus> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<RunStatus> {
    match cmd {
        Command::Cutover {
            config,
            dry_run,
            yes,
        } => cutover(&config, dry_run, yes),
        Command::Bootstrap { config, dry_run } => bootstrap(&config, dry_run),
        Command::Status { config } => status(&config),
    }
}

/// Promote caught-up followers on the follower cluster.
pub fn cutover(config_path: &Path, dry_run: bool, yes: bool) -> CliResult<RunStatus> {
    let config = load(config_path, "cutover")?.with_overrides(dry_run, yes);
    let follower = HttpIndexService::new(config.follower.target(), config.request_timeout())?;
    let confirmer: Box<dyn Confirm> = if config.assume_yes {
        Box::new(AssumeYes)
    } else {
        Box::new(StdinConfirmer)
    };

    let rt = runtime()?;
    track("cutover", || {
        rt.block_on(execute_cutover(&follower, confirmer.as_ref(), &config))
    })
}

/// Follow every open leader index that is not followed yet.
pub fn bootstrap(config_path: &Path, dry_run: bool) -> CliResult<RunStatus> {
    let config = load(config_path, "bootstrap")?.with_overrides(dry_run, false);
    let (leader_config, _) = config.require_bootstrap()?;
    let leader = HttpIndexService::new(leader_config.target(), config.request_timeout())?;
    let follower = HttpIndexService::new(config.follower.target(), config.request_timeout())?;

    let rt = runtime()?;
    track("bootstrap", || {
        rt.block_on(execute_bootstrap(&leader, &follower, &config))
    })
}

/// Read-only parity report.
pub fn status(config_path: &Path) -> CliResult<RunStatus> {
    let config = load(config_path, "status")?;
    let follower = HttpIndexService::new(config.follower.target(), config.request_timeout())?;

    let rt = runtime()?;
    track("status", || rt.block_on(execute_status(&follower)))
}

pub async fn execute_cutover<S, C>(
    follower: &S,
    confirmer: &C,
    config: &Config,
) -> CliResult<RunStatus>
where
    S: IndexService + ?Sized,
    C: Confirm + ?Sized,
{
    let orchestrator = CutoverOrchestrator::new(follower, confirmer, config.cutover_settings());
    let report = orchestrator.run().await?;
    Ok(report.status())
}

pub async fn execute_bootstrap<L, F>(leader: &L, follower: &F, config: &Config) -> CliResult<RunStatus>
where
    L: IndexService + ?Sized,
    F: IndexService + ?Sized,
{
    let (_, rc_name) = config.require_bootstrap()?;
    let engine = ReconciliationEngine::new(leader, follower, config.reconcile_settings(rc_name));
    let report = engine.run().await?;
    Ok(report.status())
}

pub async fn execute_status<S: IndexService + ?Sized>(follower: &S) -> CliResult<RunStatus> {
    let orchestrator = CutoverOrchestrator::new(follower, &AssumeYes, Default::default());
    let (discovered, validation) = orchestrator.survey().await?;
    log_event(
        Event::ValidationComplete,
        &[
            ("discovered", &discovered.len().to_string()),
            ("caught_up", &json_list(&validation.caught_up)),
            ("lagging", &json_list(&validation.lagging)),
            ("dropped", &json_list(&validation.dropped)),
            ("fetch_failed", &json_list(&validation.fetch_failed)),
        ],
    );
    if !validation.fetch_failed.is_empty() {
        Ok(RunStatus::PartialFailure)
    } else if validation.caught_up.is_empty() {
        Ok(RunStatus::NothingToDo)
    } else {
        Ok(RunStatus::Completed)
    }
}

fn load(config_path: &Path, command: &str) -> CliResult<Config> {
    let config = Config::load(config_path)?;
    log_event(
        Event::ConfigLoaded,
        &[
            ("command", command),
            ("path", &config_path.display().to_string()),
            ("follower", config.follower.target().url()),
            ("dry_run", if config.dry_run { "true" } else { "false" }),
        ],
    );
    Ok(config)
}

fn runtime() -> CliResult<tokio::runtime::Runtime> {
    tokio::runtime::Runtime::new()
        .map_err(|e| CliError::io_error(format!("Failed to create tokio runtime: {}", e)))
}

/// Bracket a command body with run start and end events under one run id.
fn track<F>(command: &str, body: F) -> CliResult<RunStatus>
where
    F: FnOnce() -> CliResult<RunStatus>,
{
    let run_id = Uuid::new_v4().to_string();
    log_event(
        Event::RunStart,
        &[("run_id", &run_id), ("command", command)],
    );
    match body() {
        Ok(status) => {
            log_event(
                Event::RunComplete,
                &[
                    ("run_id", &run_id),
                    ("command", command),
                    ("status", status.as_str()),
                    ("exit_code", &status.exit_code().to_string()),
                ],
            );
            Ok(status)
        }
        Err(e) => {
            log_event(
                Event::RunFailed,
                &[
                    ("run_id", &run_id),
                    ("command", command),
                    ("code", e.code_str()),
                    ("error", e.message()),
                ],
            );
            Err(e)
        }
    }
}
