//! `warden start` — write configuration and bring the agent into the cluster.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Args;
use tracing::{error, info};
use warden_common::{Config, Role};

use crate::app::AppContext;
use crate::application::ports::ProgressReporter;
use crate::application::services::NodeRunner;
use crate::application::timeout::Timeout;
use crate::commands::ConfigArgs;
use crate::domain::{WardenError, validate_start_config};
use crate::infra::process::is_running_process;

/// Arguments for the start command.
#[derive(Args)]
pub struct StartArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Upstream DNS server for the agent; may be repeated
    #[arg(long = "recursor", value_name = "ADDR")]
    pub recursors: Vec<String>,
}

/// Run `warden start`.
///
/// A failed start is followed by a full stop so no half-configured agent is
/// left behind.
///
/// # Errors
///
/// Returns the precondition or start error.
pub fn run(args: &StartArgs, app: &AppContext) -> Result<()> {
    let config = app.load_config(&args.config.config_file)?;
    preflight(&config)?;

    let node = app.node_runner(&config, args.recursors.clone());
    let timeout = Timeout::after(
        Arc::clone(&app.clock),
        Duration::from_secs(config.supervisor.timeout_in_seconds),
    )?;
    start_node(node.as_ref(), &config, &timeout, &app.terminal_reporter())
}

/// Start `node`, stopping it again when the start fails.
///
/// # Errors
///
/// Returns the start error; a failing cleanup stop is only logged.
pub fn start_node(
    node: &dyn NodeRunner,
    config: &Config,
    timeout: &Timeout,
    reporter: &impl ProgressReporter,
) -> Result<()> {
    let role = match config.role() {
        Role::Server => "server",
        Role::Client => "client",
    };
    info!(role, "start");
    reporter.step(&format!("Starting {role} agent..."));

    if let Err(err) = node.start(config, timeout) {
        error!(error = %err, "start.failed");
        reporter.warn("Start failed, stopping agent");
        if let Err(stop_err) = node.stop() {
            error!(error = %stop_err, "start.cleanup.failed");
        }
        return Err(err.context("error during start"));
    }

    info!("start.success");
    reporter.success("Agent started.");
    Ok(())
}

/// Checks that must pass before anything is written or launched.
///
/// # Errors
///
/// Returns `WardenError::Configuration` naming the first violation.
pub fn preflight(config: &Config) -> Result<()> {
    validate_start_config(config)?;

    let path = &config.path;
    if !path.agent_path.is_file() {
        return Err(WardenError::Configuration(format!(
            "\"agent_path\" \"{}\" cannot be found",
            path.agent_path.display()
        ))
        .into());
    }
    if !path.agent_config_dir.is_dir() {
        return Err(WardenError::Configuration(format!(
            "\"agent_config_dir\" \"{}\" could not be found",
            path.agent_config_dir.display()
        ))
        .into());
    }
    if is_running_process(&path.pid_file) {
        return Err(WardenError::Configuration(
            "agent is already running, please stop it first".to_string(),
        )
        .into());
    }
    Ok(())
}
