//! Application service — agent lifecycle controller.
//!
//! Each operation is one step of the start/stop workflows owned by the
//! `client` and `server` orchestrators. All I/O is routed through injected
//! port traits.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::{debug, error, info};
use warden_common::Config;

use crate::application::ports::{AgentClient, AgentRpc, AgentRunner, Clock, ServiceDefiner};
use crate::application::timeout::Timeout;
use crate::domain::WardenError;

/// Orchestrates one agent process through boot, configure, and stop.
pub struct Controller<R, C, D> {
    pub agent_runner: R,
    pub agent_client: C,
    pub service_definer: D,
    /// Pause between failed probes inside a bounded wait.
    pub retry_delay: Duration,
    pub clock: Arc<dyn Clock>,
    /// Gossip keys in rotation order; the first becomes primary.
    pub encrypt_keys: Vec<String>,
    pub config_dir: PathBuf,
    pub config: Config,
}

impl<R, C, D> Controller<R, C, D>
where
    R: AgentRunner,
    C: AgentClient,
    D: ServiceDefiner,
{
    /// Generate service definitions from the config and write them out.
    ///
    /// # Errors
    ///
    /// Returns the definer's error when writing fails.
    pub fn write_service_definitions(&self) -> Result<()> {
        info!("controller.write-service-definitions.generate-definitions");
        let definitions = self.service_definer.generate_definitions(&self.config);

        info!(
            count = definitions.len(),
            "controller.write-service-definitions.write"
        );
        if let Err(err) = self
            .service_definer
            .write_definitions(&self.config_dir, &definitions)
        {
            error!(error = %err, "controller.write-service-definitions.write.failed");
            return Err(err);
        }

        info!("controller.write-service-definitions.success");
        Ok(())
    }

    /// Launch the agent and wait until it has joined the cluster.
    ///
    /// A launch failure is returned immediately; only the join check is
    /// retried. On timeout the agent is left running for the caller to stop.
    ///
    /// # Errors
    ///
    /// Returns the launch error, or `WardenError::TimeoutExceeded` when the
    /// agent does not join before `timeout` expires.
    pub fn boot_agent(&self, timeout: &Timeout) -> Result<()> {
        info!("controller.boot-agent.run");
        if let Err(err) = self.agent_runner.run() {
            error!(error = %err, "controller.boot-agent.run.failed");
            return Err(err);
        }

        info!("controller.boot-agent.verify-joined");
        if let Err(err) = self.call_with_timeout(timeout, || self.agent_client.verify_joined()) {
            error!(error = %err, "controller.boot-agent.verify-joined.failed");
            return Err(err);
        }

        info!("controller.boot-agent.success");
        Ok(())
    }

    /// Finish configuring a non-voting member: record its PID.
    ///
    /// # Errors
    ///
    /// Returns the runner's error when the PID cannot be written.
    pub fn configure_client(&self) -> Result<()> {
        info!("controller.configure-client.write-pid");
        if let Err(err) = self.agent_runner.write_pid() {
            error!(error = %err, "controller.configure-client.write-pid.failed");
            return Err(err);
        }

        info!("controller.configure-client.success");
        Ok(())
    }

    /// Finish configuring a voting member.
    ///
    /// When this node completes the initial bring-up it first waits for the
    /// cluster to sync; only then is the keyring rotated, and the PID written
    /// last.
    ///
    /// # Errors
    ///
    /// Returns `WardenError::Configuration` when no encryption key is
    /// configured, `WardenError::TimeoutExceeded` when the sync wait runs
    /// out, or the first collaborator error encountered.
    pub fn configure_server(&self, timeout: &Timeout, rpc: Option<Box<dyn AgentRpc>>) -> Result<()> {
        if let Some(rpc) = rpc {
            self.agent_client.bind_rpc_client(rpc);
        }

        info!("controller.configure-server.is-last-node");
        let last_node = match self.agent_client.is_last_node() {
            Ok(last_node) => last_node,
            Err(err) => {
                error!(error = %err, "controller.configure-server.is-last-node.failed");
                return Err(err);
            }
        };

        if last_node {
            info!("controller.configure-server.verify-synced");
            if let Err(err) = self.call_with_timeout(timeout, || self.agent_client.verify_synced()) {
                error!(error = %err, "controller.configure-server.verify-synced.failed");
                return Err(err);
            }
        }

        if self.encrypt_keys.is_empty() {
            let err = WardenError::Configuration(
                "encrypt keys cannot be empty for a server".to_string(),
            );
            error!(error = %err, "controller.configure-server.no-encrypt-keys");
            return Err(err.into());
        }

        info!(
            keys = self.encrypt_keys.len(),
            "controller.configure-server.set-keys"
        );
        if let Err(err) = self.agent_client.set_keys(&self.encrypt_keys) {
            error!(error = %err, "controller.configure-server.set-keys.failed");
            return Err(err);
        }

        info!("controller.configure-server.write-pid");
        if let Err(err) = self.agent_runner.write_pid() {
            error!(error = %err, "controller.configure-server.write-pid.failed");
            return Err(err);
        }

        info!("controller.configure-server.success");
        Ok(())
    }

    /// Take the agent out of the cluster and shut it down.
    ///
    /// Every step runs regardless of earlier failures; failures are logged,
    /// never returned. A failed leave is followed by a forced stop.
    pub fn stop_agent(&self, rpc: Option<Box<dyn AgentRpc>>) {
        if let Some(rpc) = rpc {
            self.agent_client.bind_rpc_client(rpc);
        }

        info!("controller.stop-agent.leave");
        if let Err(err) = self.agent_client.leave() {
            error!(error = %err, "controller.stop-agent.leave.failed");

            info!("controller.stop-agent.stop");
            if let Err(err) = self.agent_runner.stop() {
                error!(error = %err, "controller.stop-agent.stop.failed");
            }
        }

        info!("controller.stop-agent.wait");
        if let Err(err) = self.agent_runner.wait() {
            error!(error = %err, "controller.stop-agent.wait.failed");
        }

        info!("controller.stop-agent.cleanup");
        if let Err(err) = self.agent_runner.cleanup() {
            error!(error = %err, "controller.stop-agent.cleanup.failed");
        }

        info!("controller.stop-agent.success");
    }

    /// Poll `probe` until it succeeds or `timeout` expires.
    ///
    /// The first attempt is immediate. Expiry is checked before each attempt,
    /// never during one; a failed attempt is followed by `retry_delay`.
    ///
    /// # Errors
    ///
    /// Returns `WardenError::TimeoutExceeded` once the deadline has passed.
    pub fn call_with_timeout<F>(&self, timeout: &Timeout, mut probe: F) -> Result<()>
    where
        F: FnMut() -> Result<()>,
    {
        let mut attempt: u32 = 0;
        loop {
            if timeout.is_expired() {
                return Err(WardenError::TimeoutExceeded.into());
            }

            attempt += 1;
            match probe() {
                Ok(()) => return Ok(()),
                Err(err) => {
                    debug!(attempt, error = %err, "controller.call-with-timeout.retry");
                    self.clock.sleep(self.retry_delay);
                }
            }
        }
    }
}
