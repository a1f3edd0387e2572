//! `warden stop` — take the agent out of the cluster and terminate it.

use anyhow::Result;
use clap::Args;
use tracing::info;

use crate::app::AppContext;
use crate::application::ports::ProgressReporter;
use crate::commands::ConfigArgs;
use crate::domain::WardenError;

/// Arguments for the stop command.
#[derive(Args)]
pub struct StopArgs {
    #[command(flatten)]
    pub config: ConfigArgs,
}

/// Run `warden stop`.
///
/// # Errors
///
/// Returns an error when the configuration cannot be loaded or no RPC client
/// could be built for the local agent.
pub fn run(args: &StopArgs, app: &AppContext) -> Result<()> {
    let config = app.load_config(&args.config.config_file)?;
    if config.path.pid_file.as_os_str().is_empty() {
        return Err(WardenError::Configuration("\"pid_file\" cannot be empty".to_string()).into());
    }

    let reporter = app.terminal_reporter();
    reporter.step("Stopping agent...");

    let node = app.node_runner(&config, Vec::new());
    node.stop()
        .map_err(|err| err.context("error during stop"))?;

    info!("stop.success");
    reporter.success("Agent stopped.");
    Ok(())
}
