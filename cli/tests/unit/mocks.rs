//! Shared mock infrastructure for unit tests.
//!
//! Every recording mock appends to one shared [`CallLog`] so tests can assert
//! on the relative order of calls across collaborators.

#![allow(clippy::expect_used)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use anyhow::Result;
use warden::application::ports::{
    AgentClient, AgentRpc, AgentRunner, Clock, ConfigWriter, KeyringRemover, ProgressReporter,
    RpcConnector, ServiceDefiner,
};
use warden::application::services::Controller;
use warden_common::{Config, ServiceDefinition};

// ── Call log ──────────────────────────────────────────────────────────────────

pub type CallLog = Arc<Mutex<Vec<String>>>;

pub fn call_log() -> CallLog {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn calls(log: &CallLog) -> Vec<String> {
    log.lock().expect("lock").clone()
}

pub fn count(log: &CallLog, call: &str) -> usize {
    calls(log).iter().filter(|c| *c == call).count()
}

pub fn position(log: &CallLog, call: &str) -> Option<usize> {
    calls(log).iter().position(|c| c == call)
}

fn record(log: &CallLog, call: impl Into<String>) {
    log.lock().expect("lock").push(call.into());
}

// ── Failure script ────────────────────────────────────────────────────────────

/// Per-operation failure budget: an operation fails while its count is
/// positive. `u32::MAX` means it always fails.
#[derive(Default)]
pub struct Script {
    failures: Mutex<HashMap<&'static str, u32>>,
}

impl Script {
    pub fn fail(&self, op: &'static str, times: u32) {
        self.failures.lock().expect("lock").insert(op, times);
    }

    pub fn fail_always(&self, op: &'static str) {
        self.fail(op, u32::MAX);
    }

    fn outcome(&self, op: &'static str) -> Result<()> {
        let mut failures = self.failures.lock().expect("lock");
        if let Some(remaining) = failures.get_mut(op)
            && *remaining > 0
        {
            if *remaining != u32::MAX {
                *remaining -= 1;
            }
            anyhow::bail!("{op} failed");
        }
        Ok(())
    }
}

// ── Mock: clock ───────────────────────────────────────────────────────────────

/// Clock whose `sleep` advances time instantly and is recorded.
pub struct FakeClock {
    now: Mutex<Instant>,
    sleeps: Mutex<Vec<Duration>>,
}

impl FakeClock {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            now: Mutex::new(Instant::now()),
            sleeps: Mutex::new(Vec::new()),
        })
    }

    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().expect("lock").clone()
    }
}

impl Clock for FakeClock {
    fn now(&self) -> Instant {
        *self.now.lock().expect("lock")
    }

    fn sleep(&self, duration: Duration) {
        self.sleeps.lock().expect("lock").push(duration);
        *self.now.lock().expect("lock") += duration;
    }
}

// ── Mock: agent runner ────────────────────────────────────────────────────────

pub struct RecordingRunner {
    pub log: CallLog,
    pub script: Script,
}

impl AgentRunner for RecordingRunner {
    fn run(&self) -> Result<()> {
        record(&self.log, "run");
        self.script.outcome("run")
    }
    fn stop(&self) -> Result<()> {
        record(&self.log, "stop");
        self.script.outcome("stop")
    }
    fn wait(&self) -> Result<()> {
        record(&self.log, "wait");
        self.script.outcome("wait")
    }
    fn cleanup(&self) -> Result<()> {
        record(&self.log, "cleanup");
        self.script.outcome("cleanup")
    }
    fn write_pid(&self) -> Result<()> {
        record(&self.log, "write_pid");
        self.script.outcome("write_pid")
    }
}

// ── Mock: agent client ────────────────────────────────────────────────────────

pub struct ScriptedClient {
    pub log: CallLog,
    pub script: Script,
    pub last_node: bool,
}

impl AgentClient for ScriptedClient {
    fn verify_joined(&self) -> Result<()> {
        record(&self.log, "verify_joined");
        self.script.outcome("verify_joined")
    }
    fn verify_synced(&self) -> Result<()> {
        record(&self.log, "verify_synced");
        self.script.outcome("verify_synced")
    }
    fn is_last_node(&self) -> Result<bool> {
        record(&self.log, "is_last_node");
        self.script.outcome("is_last_node")?;
        Ok(self.last_node)
    }
    fn set_keys(&self, keys: &[String]) -> Result<()> {
        record(&self.log, format!("set_keys {}", keys.join(",")));
        self.script.outcome("set_keys")
    }
    fn leave(&self) -> Result<()> {
        record(&self.log, "leave");
        self.script.outcome("leave")
    }
    fn bind_rpc_client(&self, _rpc: Box<dyn AgentRpc>) {
        record(&self.log, "bind_rpc_client");
    }
}

// ── Mock: RPC handle and connector ────────────────────────────────────────────

pub struct RecordingRpc {
    pub log: CallLog,
}

impl AgentRpc for RecordingRpc {
    fn list_keys(&self) -> Result<Vec<String>> {
        record(&self.log, "rpc.list_keys");
        Ok(Vec::new())
    }
    fn install_key(&self, key: &str) -> Result<()> {
        record(&self.log, format!("rpc.install_key {key}"));
        Ok(())
    }
    fn use_key(&self, key: &str) -> Result<()> {
        record(&self.log, format!("rpc.use_key {key}"));
        Ok(())
    }
    fn remove_key(&self, key: &str) -> Result<()> {
        record(&self.log, format!("rpc.remove_key {key}"));
        Ok(())
    }
    fn leave(&self) -> Result<()> {
        record(&self.log, "rpc.leave");
        Ok(())
    }
}

pub struct ScriptedConnector {
    pub log: CallLog,
    pub script: Script,
}

impl RpcConnector for ScriptedConnector {
    fn connect(&self, address: &str) -> Result<Box<dyn AgentRpc>> {
        record(&self.log, format!("connect {address}"));
        self.script.outcome("connect")?;
        Ok(Box::new(RecordingRpc {
            log: Arc::clone(&self.log),
        }))
    }
}

// ── Mock: artifact writers ────────────────────────────────────────────────────

pub struct RecordingDefiner {
    pub log: CallLog,
    pub script: Script,
}

impl ServiceDefiner for RecordingDefiner {
    fn generate_definitions(&self, config: &Config) -> Vec<ServiceDefinition> {
        record(&self.log, "generate_definitions");
        warden::domain::generate_definitions(config)
    }
    fn write_definitions(&self, dir: &Path, definitions: &[ServiceDefinition]) -> Result<()> {
        record(
            &self.log,
            format!("write_definitions {} {}", dir.display(), definitions.len()),
        );
        self.script.outcome("write_definitions")
    }
}

pub struct RecordingConfigWriter {
    pub log: CallLog,
    pub script: Script,
}

impl ConfigWriter for RecordingConfigWriter {
    fn write(&self, _config: &Config) -> Result<()> {
        record(&self.log, "config_writer.write");
        self.script.outcome("config_writer.write")
    }
}

pub struct RecordingKeyringRemover {
    pub log: CallLog,
    pub script: Script,
}

impl KeyringRemover for RecordingKeyringRemover {
    fn execute(&self) -> Result<()> {
        record(&self.log, "keyring_remover.execute");
        self.script.outcome("keyring_remover.execute")
    }
}

// ── Mock: no-op progress reporter ────────────────────────────────────────────

pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn step(&self, _: &str) {}
    fn success(&self, _: &str) {}
    fn warn(&self, _: &str) {}
}

// ── Builders ──────────────────────────────────────────────────────────────────

pub type MockController = Controller<RecordingRunner, ScriptedClient, RecordingDefiner>;

pub const RETRY_DELAY: Duration = Duration::from_secs(1);

pub fn config_dir() -> PathBuf {
    PathBuf::from("/var/vcap/jobs/consul_agent/config")
}

/// A controller over recording mocks sharing `log` and `clock`.
pub fn controller(log: &CallLog, clock: &Arc<FakeClock>, config: Config) -> MockController {
    Controller {
        agent_runner: RecordingRunner {
            log: Arc::clone(log),
            script: Script::default(),
        },
        agent_client: ScriptedClient {
            log: Arc::clone(log),
            script: Script::default(),
            last_node: false,
        },
        service_definer: RecordingDefiner {
            log: Arc::clone(log),
            script: Script::default(),
        },
        retry_delay: RETRY_DELAY,
        clock: Arc::clone(clock) as Arc<dyn Clock>,
        encrypt_keys: config.cluster.encrypt_keys.clone(),
        config_dir: config_dir(),
        config,
    }
}

pub fn config_writer(log: &CallLog) -> RecordingConfigWriter {
    RecordingConfigWriter {
        log: Arc::clone(log),
        script: Script::default(),
    }
}

pub fn keyring_remover(log: &CallLog) -> RecordingKeyringRemover {
    RecordingKeyringRemover {
        log: Arc::clone(log),
        script: Script::default(),
    }
}

pub fn connector(log: &CallLog) -> ScriptedConnector {
    ScriptedConnector {
        log: Arc::clone(log),
        script: Script::default(),
    }
}
