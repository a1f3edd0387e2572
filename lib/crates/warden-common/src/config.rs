use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::service::ServiceDefinition;

const DEFAULT_AGENT_PATH: &str = "/var/vcap/packages/consul/bin/consul";
const DEFAULT_CONFIG_DIR: &str = "/var/vcap/jobs/consul_agent/config";
const DEFAULT_PID_FILE: &str = "/var/vcap/sys/run/consul_agent/consul_agent.pid";
const DEFAULT_TIMEOUT_SECONDS: u64 = 55;

const SERVER_DATA_DIR: &str = "/var/vcap/store/consul_agent";
const CLIENT_DATA_DIR: &str = "/var/vcap/data/consul_agent";
const KEYRING_SUFFIX: &str = "serf/local.keyring";

/// Errors raised while loading the supervisor configuration file.
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("invalid configuration: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Agent role within the cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Voting member; participates in consensus.
    Server,
    /// Non-voting member; only relays requests.
    Client,
}

/// Complete, immutable configuration for one supervisor run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub node: NodeConfig,
    pub supervisor: SupervisorConfig,
    pub cluster: ClusterConfig,
    pub path: PathConfig,
}

/// Identity of the job instance this supervisor runs on.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    pub name: String,
    pub index: u32,
    pub external_ip: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SupervisorConfig {
    /// Deadline for the whole `start` choreography.
    pub timeout_in_seconds: u64,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            timeout_in_seconds: DEFAULT_TIMEOUT_SECONDS,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    pub agent: AgentSettings,
    /// Gossip encryption keys, first is the primary key.
    pub encrypt_keys: Vec<String>,
}

/// Settings rendered into the agent's own configuration document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentSettings {
    pub servers: ServerSeeds,
    pub services: BTreeMap<String, ServiceDefinition>,
    /// `"server"` for voting members, anything else is a client.
    pub mode: String,
    pub domain: String,
    pub datacenter: String,
    pub log_level: String,
    pub protocol_version: u32,
    pub dns_config: DnsConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSeeds {
    pub lan: Vec<String>,
    pub wan: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DnsConfig {
    pub allow_stale: bool,
    pub max_stale: String,
}

impl Default for DnsConfig {
    fn default() -> Self {
        Self {
            allow_stale: false,
            max_stale: "5s".to_string(),
        }
    }
}

/// Filesystem locations owned by the supervisor.
///
/// Directories are never created; only files inside them are written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathConfig {
    pub agent_path: PathBuf,
    pub agent_config_dir: PathBuf,
    pub pid_file: PathBuf,
    pub keyring_file: PathBuf,
    pub data_dir: PathBuf,
}

impl Default for PathConfig {
    fn default() -> Self {
        Self {
            agent_path: PathBuf::from(DEFAULT_AGENT_PATH),
            agent_config_dir: PathBuf::from(DEFAULT_CONFIG_DIR),
            pid_file: PathBuf::from(DEFAULT_PID_FILE),
            keyring_file: PathBuf::new(),
            data_dir: PathBuf::new(),
        }
    }
}

impl Config {
    /// Parse a JSON configuration document, filling in defaults.
    ///
    /// `keyring_file` and `data_dir` default to role-specific locations when
    /// left empty: servers keep their state on the persistent store, clients
    /// on the ephemeral data disk.
    pub fn from_json(data: &[u8]) -> Result<Self, ConfigLoadError> {
        let mut config: Config = serde_json::from_slice(data)?;

        let base = match config.role() {
            Role::Server => SERVER_DATA_DIR,
            Role::Client => CLIENT_DATA_DIR,
        };
        if config.path.keyring_file.as_os_str().is_empty() {
            config.path.keyring_file = PathBuf::from(base).join(KEYRING_SUFFIX);
        }
        if config.path.data_dir.as_os_str().is_empty() {
            config.path.data_dir = PathBuf::from(base);
        }

        Ok(config)
    }

    #[must_use]
    pub fn role(&self) -> Role {
        if self.cluster.agent.mode == "server" {
            Role::Server
        } else {
            Role::Client
        }
    }

    /// Identity derived from the job instance, before any persisted marker
    /// is consulted.
    #[must_use]
    pub fn derived_node_name(&self) -> String {
        format!("{}-{}", self.node.name, self.node.index)
    }
}
