//! Application context — unified state passed to every command handler.
//!
//! `AppContext` is the composition root: it owns the cross-cutting output and
//! clock handles and wires the production adapters behind each port.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use warden_common::{Config, Role};

use crate::application::ports::{Clock, LOCAL_AGENT_ADDRESS};
use crate::application::services::{Client, Controller, NodeRunner, Server};
use crate::domain::WardenError;
use crate::infra::agent_client::{DEFAULT_HTTP_TIMEOUT, HttpAgentClient, HttpRpcConnector};
use crate::infra::clock::SystemClock;
use crate::infra::config_writer::AgentConfigWriter;
use crate::infra::keyring::FileKeyringRemover;
use crate::infra::process::ProcessRunner;
use crate::infra::service_definer::JsonServiceDefiner;
use crate::output::{OutputContext, TerminalReporter};

/// Pause between failed join and sync probes.
pub const RETRY_DELAY: Duration = Duration::from_secs(1);

/// Production controller wiring.
pub type AgentController = Controller<ProcessRunner, HttpAgentClient, JsonServiceDefiner>;

/// Flags passed from the top-level CLI to `AppContext::new`.
pub struct AppFlags {
    /// Disable ANSI color output.
    pub no_color: bool,
    /// Suppress non-error output.
    pub quiet: bool,
}

/// Unified application context passed to every command handler.
pub struct AppContext {
    /// Terminal output context (colors, quiet mode).
    pub output: OutputContext,
    /// Time source for deadlines, retries and PID polling.
    pub clock: Arc<dyn Clock>,
}

impl AppContext {
    #[must_use]
    pub fn new(flags: &AppFlags) -> Self {
        Self {
            output: OutputContext::new(flags.no_color, flags.quiet),
            clock: Arc::new(SystemClock),
        }
    }

    /// Returns a `TerminalReporter` wrapping this context's output.
    #[must_use]
    pub fn terminal_reporter(&self) -> TerminalReporter<'_> {
        TerminalReporter::new(&self.output)
    }

    /// Read and parse the supervisor configuration file.
    ///
    /// # Errors
    ///
    /// Returns `WardenError::Io` when the file cannot be read and
    /// `WardenError::Configuration` when it is not a valid document.
    pub fn load_config(&self, path: &Path) -> Result<Config> {
        let data = std::fs::read(path).map_err(|e| {
            WardenError::io(format!("reading configuration file {}", path.display()), e)
        })?;
        let config = Config::from_json(&data)
            .map_err(|e| WardenError::Configuration(format!("{}: {e}", path.display())))?;
        Ok(config)
    }

    /// Controller over the production process, HTTP and file adapters.
    #[must_use]
    pub fn controller(&self, config: &Config, recursors: Vec<String>) -> AgentController {
        let path = &config.path;
        Controller {
            agent_runner: ProcessRunner::new(
                path.agent_path.clone(),
                path.agent_config_dir.clone(),
                recursors,
                path.pid_file.clone(),
                Arc::clone(&self.clock),
            ),
            agent_client: HttpAgentClient::new(
                LOCAL_AGENT_ADDRESS,
                config.cluster.agent.servers.lan.clone(),
                DEFAULT_HTTP_TIMEOUT,
            ),
            service_definer: JsonServiceDefiner,
            retry_delay: RETRY_DELAY,
            clock: Arc::clone(&self.clock),
            encrypt_keys: config.cluster.encrypt_keys.clone(),
            config_dir: path.agent_config_dir.clone(),
            config: config.clone(),
        }
    }

    /// The workflow for the configured role.
    #[must_use]
    pub fn node_runner(&self, config: &Config, recursors: Vec<String>) -> Box<dyn NodeRunner> {
        let controller = self.controller(config, recursors);
        let config_writer = AgentConfigWriter::new(config.path.agent_config_dir.clone());
        let rpc_connector = HttpRpcConnector::new(DEFAULT_HTTP_TIMEOUT);

        match config.role() {
            Role::Server => Box::new(Server::new(controller, config_writer, rpc_connector)),
            Role::Client => Box::new(Client::new(
                controller,
                config_writer,
                FileKeyringRemover::new(config.path.keyring_file.clone()),
                rpc_connector,
            )),
        }
    }
}
