//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain` and `warden_common`, never
//! from `crate::infra`, `crate::commands`, or `crate::output`.

use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::Result;
use warden_common::{Config, ServiceDefinition};

// ── Constants ─────────────────────────────────────────────────────────────────

/// Endpoint of the local agent that RPC clients are built against.
pub const LOCAL_AGENT_ADDRESS: &str = "127.0.0.1:8500";

// ── Time ──────────────────────────────────────────────────────────────────────

/// Source of time for deadlines and retry delays.
///
/// Injected everywhere a wait happens so retry cadence is deterministic
/// under test.
pub trait Clock: Send + Sync {
    /// Current instant.
    fn now(&self) -> Instant;
    /// Block the calling thread for `duration`.
    fn sleep(&self, duration: Duration);
}

// ── Agent Port Traits ─────────────────────────────────────────────────────────

/// Owns the agent OS process: spawning, PID tracking, termination.
pub trait AgentRunner {
    /// Launch the agent process.
    fn run(&self) -> Result<()>;
    /// Force-terminate the agent process.
    fn stop(&self) -> Result<()>;
    /// Block until the agent process has exited.
    fn wait(&self) -> Result<()>;
    /// Remove runtime artifacts such as the PID file.
    fn cleanup(&self) -> Result<()>;
    /// Record the agent's PID.
    fn write_pid(&self) -> Result<()>;
}

/// Keyring and membership RPC handle bound to a running agent.
pub trait AgentRpc: Send {
    /// Keys currently known to the cluster keyring.
    fn list_keys(&self) -> Result<Vec<String>>;
    /// Distribute a key to every member.
    fn install_key(&self, key: &str) -> Result<()>;
    /// Make an installed key the primary encryption key.
    fn use_key(&self, key: &str) -> Result<()>;
    /// Retire a key from every member.
    fn remove_key(&self, key: &str) -> Result<()>;
    /// Ask the agent to gracefully leave the cluster.
    fn leave(&self) -> Result<()>;
}

/// Cluster-state queries and commands against the running agent.
pub trait AgentClient {
    /// Succeeds once the agent has joined at least one expected member.
    fn verify_joined(&self) -> Result<()>;
    /// Succeeds once the agent's consensus log has caught up.
    fn verify_synced(&self) -> Result<()>;
    /// Whether this node completes the initial cluster bring-up.
    fn is_last_node(&self) -> Result<bool>;
    /// Install and rotate the gossip keyring to exactly `keys`, first is primary.
    fn set_keys(&self, keys: &[String]) -> Result<()>;
    /// Gracefully leave the cluster.
    fn leave(&self) -> Result<()>;
    /// Use `rpc` for subsequent keyring and leave calls.
    fn bind_rpc_client(&self, rpc: Box<dyn AgentRpc>);
}

/// Builds RPC handles against an agent endpoint.
pub trait RpcConnector {
    /// Connect to the agent listening on `address`.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint cannot be reached.
    fn connect(&self, address: &str) -> Result<Box<dyn AgentRpc>>;
}

// ── Artifact Port Traits ──────────────────────────────────────────────────────

/// Generates and emits service-definition files.
pub trait ServiceDefiner {
    /// Build the definitions for every configured service.
    fn generate_definitions(&self, config: &Config) -> Vec<ServiceDefinition>;
    /// Write `definitions` into `dir`, one file per service.
    fn write_definitions(&self, dir: &Path, definitions: &[ServiceDefinition]) -> Result<()>;
}

/// Materializes the agent configuration and node identity.
pub trait ConfigWriter {
    /// Resolve the node identity and rewrite the agent configuration file.
    fn write(&self, config: &Config) -> Result<()>;
}

/// Deletes the agent's persisted keyring before boot.
pub trait KeyringRemover {
    /// Remove the keyring file; a missing file is not an error.
    fn execute(&self) -> Result<()>;
}

// ── Progress Reporting Port ───────────────────────────────────────────────────

/// Abstracts progress reporting so commands can emit events without
/// depending on the Presentation layer.
pub trait ProgressReporter {
    /// Emit an in-progress step message.
    fn step(&self, message: &str);
    /// Emit a success message.
    fn success(&self, message: &str);
    /// Emit a warning message.
    fn warn(&self, message: &str);
}
