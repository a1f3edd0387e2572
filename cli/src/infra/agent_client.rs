//! HTTP adapters for the local agent's API.
//!
//! `HttpAgentRpc` wraps the keyring and leave endpoints, `HttpAgentClient`
//! answers the cluster-state questions the controller asks, and
//! `HttpRpcConnector` builds RPC handles once the agent's port accepts
//! connections.

use std::collections::{BTreeSet, HashMap};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::application::ports::{AgentClient, AgentRpc, RpcConnector};
use crate::domain::{WardenError, encrypt_key};

/// Per-request deadline for agent API calls.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(5);

/// Member tag value identifying voting members.
const SERVER_ROLE: &str = "consul";
/// Serf status code for a live member.
const MEMBER_ALIVE: u8 = 1;

// ── Wire types ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Member {
    pub name: String,
    pub addr: String,
    pub tags: HashMap<String, String>,
    pub status: u8,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AgentSelf {
    stats: AgentStats,
}

#[derive(Debug, Deserialize)]
struct AgentStats {
    raft: RaftStats,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RaftStats {
    pub commit_index: String,
    pub last_log_index: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct KeyringEntry {
    #[serde(default)]
    keys: HashMap<String, u32>,
}

// ── Shared transport ──────────────────────────────────────────────────────────

struct AgentHttp {
    agent: ureq::Agent,
    base_url: String,
}

impl AgentHttp {
    fn new(address: &str, timeout: Duration) -> Self {
        Self {
            agent: ureq::AgentBuilder::new().timeout(timeout).build(),
            base_url: format!("http://{address}"),
        }
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = format!("{}{path}", self.base_url);
        let body = match self.agent.get(&url).call() {
            Ok(resp) => resp
                .into_string()
                .with_context(|| format!("reading response from {url}"))?,
            Err(e) => return Err(rpc_error("GET", path, &e).into()),
        };
        serde_json::from_str(&body).with_context(|| format!("parsing response from {url}"))
    }

    fn send(&self, method: &str, path: &str, key: Option<&str>) -> Result<()> {
        let url = format!("{}{path}", self.base_url);
        let req = self.agent.request(method, &url);
        let result = match key {
            Some(key) => req
                .set("Content-Type", "application/json")
                .send_string(&serde_json::json!({ "Key": key }).to_string()),
            None => req.call(),
        };
        result.map(|_| ()).map_err(|e| rpc_error(method, path, &e).into())
    }
}

fn rpc_error(method: &str, path: &str, err: &ureq::Error) -> WardenError {
    match err {
        ureq::Error::Status(code, _) => WardenError::Rpc(format!("{method} {path}: HTTP {code}")),
        ureq::Error::Transport(t) => WardenError::Rpc(format!("{method} {path}: {t}")),
    }
}

// ── RPC handle ────────────────────────────────────────────────────────────────

pub struct HttpAgentRpc {
    http: AgentHttp,
}

impl HttpAgentRpc {
    #[must_use]
    pub fn new(address: &str, timeout: Duration) -> Self {
        Self {
            http: AgentHttp::new(address, timeout),
        }
    }
}

impl AgentRpc for HttpAgentRpc {
    fn list_keys(&self) -> Result<Vec<String>> {
        let entries: Vec<KeyringEntry> = self.http.get_json("/v1/operator/keyring")?;
        let keys: BTreeSet<String> = entries
            .into_iter()
            .flat_map(|entry| entry.keys.into_keys())
            .collect();
        Ok(keys.into_iter().collect())
    }

    fn install_key(&self, key: &str) -> Result<()> {
        self.http.send("POST", "/v1/operator/keyring", Some(key))
    }

    fn use_key(&self, key: &str) -> Result<()> {
        self.http.send("PUT", "/v1/operator/keyring", Some(key))
    }

    fn remove_key(&self, key: &str) -> Result<()> {
        self.http.send("DELETE", "/v1/operator/keyring", Some(key))
    }

    fn leave(&self) -> Result<()> {
        self.http.send("PUT", "/v1/agent/leave", None)
    }
}

/// Builds `HttpAgentRpc` handles after checking the endpoint is listening.
pub struct HttpRpcConnector {
    timeout: Duration,
}

impl HttpRpcConnector {
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl RpcConnector for HttpRpcConnector {
    fn connect(&self, address: &str) -> Result<Box<dyn AgentRpc>> {
        let addr: SocketAddr = address
            .to_socket_addrs()
            .map_err(|e| WardenError::Rpc(format!("resolving {address}: {e}")))?
            .next()
            .ok_or_else(|| WardenError::Rpc(format!("no address for {address}")))?;

        TcpStream::connect_timeout(&addr, self.timeout)
            .map_err(|e| WardenError::Rpc(format!("connecting to {address}: {e}")))?;

        debug!(%address, "rpc-connector.connect");
        Ok(Box::new(HttpAgentRpc::new(address, self.timeout)))
    }
}

// ── Agent client ──────────────────────────────────────────────────────────────

pub struct HttpAgentClient {
    http: AgentHttp,
    expected_members: Vec<String>,
    rpc: Mutex<Option<Box<dyn AgentRpc>>>,
}

impl HttpAgentClient {
    /// Client for the agent at `address` expecting the given LAN members.
    #[must_use]
    pub fn new(address: &str, expected_members: Vec<String>, timeout: Duration) -> Self {
        Self {
            http: AgentHttp::new(address, timeout),
            expected_members,
            rpc: Mutex::new(None),
        }
    }

    fn rpc(&self) -> MutexGuard<'_, Option<Box<dyn AgentRpc>>> {
        self.rpc.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn members(&self) -> Result<Vec<Member>> {
        self.http.get_json("/v1/agent/members")
    }
}

impl AgentClient for HttpAgentClient {
    fn verify_joined(&self) -> Result<()> {
        let members = self.members()?;
        if has_joined(&members, &self.expected_members) {
            Ok(())
        } else {
            Err(WardenError::Rpc("no expected members".to_string()).into())
        }
    }

    fn verify_synced(&self) -> Result<()> {
        let info: AgentSelf = self.http.get_json("/v1/agent/self")?;
        check_synced(&info.stats.raft)
    }

    fn is_last_node(&self) -> Result<bool> {
        let members = self.members()?;
        let servers = count_servers(&members);
        debug!(servers, expected = self.expected_members.len(), "agent-client.is-last-node");
        Ok(servers == self.expected_members.len())
    }

    fn set_keys(&self, keys: &[String]) -> Result<()> {
        let guard = self.rpc();
        let rpc = guard
            .as_ref()
            .ok_or_else(|| WardenError::Rpc("rpc client is not bound".to_string()))?;
        rotate_keys(rpc.as_ref(), keys)
    }

    fn leave(&self) -> Result<()> {
        let guard = self.rpc();
        let rpc = guard
            .as_ref()
            .ok_or_else(|| WardenError::Rpc("rpc client is not bound".to_string()))?;
        rpc.leave()
    }

    fn bind_rpc_client(&self, rpc: Box<dyn AgentRpc>) {
        *self.rpc() = Some(rpc);
    }
}

/// Whether any member's address is one of the expected LAN members.
#[must_use]
pub fn has_joined(members: &[Member], expected: &[String]) -> bool {
    members
        .iter()
        .any(|member| expected.iter().any(|addr| *addr == member.addr))
}

/// Number of live voting members.
#[must_use]
pub fn count_servers(members: &[Member]) -> usize {
    members
        .iter()
        .filter(|m| m.status == MEMBER_ALIVE)
        .filter(|m| m.tags.get("role").is_some_and(|role| role == SERVER_ROLE))
        .count()
}

/// Succeeds when the consensus log is non-empty and fully committed.
///
/// # Errors
///
/// Returns `WardenError::Rpc` while the log is empty or behind.
pub fn check_synced(raft: &RaftStats) -> Result<()> {
    if raft.commit_index != raft.last_log_index {
        return Err(WardenError::Rpc(format!(
            "log not in sync: commit index {} of {}",
            raft.commit_index, raft.last_log_index
        ))
        .into());
    }
    if raft.commit_index.trim().is_empty() || raft.commit_index == "0" {
        return Err(WardenError::Rpc("commit index must not be zero".to_string()).into());
    }
    Ok(())
}

/// Install every key, make the first primary, then retire the rest.
///
/// # Errors
///
/// Returns the first failing keyring call.
pub fn rotate_keys(rpc: &dyn AgentRpc, keys: &[String]) -> Result<()> {
    let derived: Vec<String> = keys.iter().map(|k| encrypt_key(k)).collect();
    let Some(primary) = derived.first() else {
        return Err(WardenError::Configuration("no encryption keys to set".to_string()).into());
    };

    for key in &derived {
        info!("agent-client.set-keys.install");
        rpc.install_key(key)?;
    }

    info!("agent-client.set-keys.use");
    rpc.use_key(primary)?;

    for existing in rpc.list_keys()? {
        if !derived.contains(&existing) {
            info!("agent-client.set-keys.remove");
            rpc.remove_key(&existing)?;
        }
    }
    Ok(())
}
