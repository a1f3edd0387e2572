//! The agent's own configuration document.
//!
//! Generation is a pure function of the supervisor `Config`, the agent
//! config directory and the resolved node name, so rendering the same inputs
//! twice yields byte-identical output.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use warden_common::{Config, Role};

use crate::domain::keys::encrypt_key;

/// Port the agent serves DNS on.
pub const DNS_PORT: u16 = 53;

/// File name of the generated document inside the agent config directory.
pub const AGENT_CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentConfiguration {
    pub server: bool,
    pub domain: String,
    pub datacenter: String,
    pub data_dir: PathBuf,
    pub log_level: String,
    pub node_name: String,
    pub ports: AgentPorts,
    pub rejoin_after_leave: bool,
    pub retry_join: Vec<String>,
    pub retry_join_wan: Vec<String>,
    pub bind_addr: String,
    pub disable_remote_exec: bool,
    pub disable_update_check: bool,
    pub protocol: u32,
    pub verify_outgoing: bool,
    pub verify_incoming: bool,
    pub verify_server_hostname: bool,
    pub ca_file: PathBuf,
    pub key_file: PathBuf,
    pub cert_file: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encrypt: Option<String>,
    pub dns_config: AgentDnsConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentPorts {
    pub dns: u16,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentDnsConfig {
    pub allow_stale: bool,
    pub max_stale: String,
}

impl AgentConfiguration {
    /// Render the document for `config` with the given node identity.
    #[must_use]
    pub fn generate(config: &Config, config_dir: &Path, node_name: &str) -> Self {
        let agent = &config.cluster.agent;
        let certs = config_dir.join("certs");

        Self {
            server: config.role() == Role::Server,
            domain: agent.domain.clone(),
            datacenter: agent.datacenter.clone(),
            data_dir: config.path.data_dir.clone(),
            log_level: agent.log_level.clone(),
            node_name: node_name.to_string(),
            ports: AgentPorts { dns: DNS_PORT },
            rejoin_after_leave: true,
            retry_join: agent.servers.lan.clone(),
            retry_join_wan: agent.servers.wan.clone(),
            bind_addr: config.node.external_ip.clone(),
            disable_remote_exec: true,
            disable_update_check: true,
            protocol: agent.protocol_version,
            verify_outgoing: true,
            verify_incoming: true,
            verify_server_hostname: true,
            ca_file: certs.join("ca.crt"),
            key_file: certs.join("agent.key"),
            cert_file: certs.join("agent.crt"),
            encrypt: config.cluster.encrypt_keys.first().map(|key| encrypt_key(key)),
            dns_config: AgentDnsConfig {
                allow_stale: agent.dns_config.allow_stale,
                max_stale: agent.dns_config.max_stale.clone(),
            },
        }
    }

    /// Serialize to the on-disk JSON representation.
    ///
    /// # Errors
    ///
    /// Returns an error only if serialization itself fails.
    pub fn to_json(&self) -> serde_json::Result<Vec<u8>> {
        let mut out = serde_json::to_vec_pretty(self)?;
        out.push(b'\n');
        Ok(out)
    }
}
