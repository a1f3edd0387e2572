//! Infrastructure implementation of the `AgentRunner` port.
//!
//! `ProcessRunner` owns the agent OS process. A runner that spawned the
//! agent holds its `Child` and reaps it directly; a runner built by a later
//! `stop` invocation only knows the PID recorded in the PID file.

use std::path::{Path, PathBuf};
use std::process::{Child, Command};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use anyhow::Result;
use nix::errno::Errno;
use nix::sys::signal::{Signal, kill};
use nix::unistd::Pid;
use tracing::{debug, info, warn};

use crate::application::ports::{AgentRunner, Clock};
use crate::domain::WardenError;

/// Pause between liveness probes while waiting on a PID we do not own.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(250);

pub struct ProcessRunner {
    agent_path: PathBuf,
    config_dir: PathBuf,
    recursors: Vec<String>,
    pid_file: PathBuf,
    clock: Arc<dyn Clock>,
    poll_interval: Duration,
    child: Mutex<Option<Child>>,
}

impl ProcessRunner {
    #[must_use]
    pub fn new(
        agent_path: PathBuf,
        config_dir: PathBuf,
        recursors: Vec<String>,
        pid_file: PathBuf,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            agent_path,
            config_dir,
            recursors,
            pid_file,
            clock,
            poll_interval: DEFAULT_POLL_INTERVAL,
            child: Mutex::new(None),
        }
    }

    /// Arguments passed to the agent binary.
    #[must_use]
    pub fn agent_args(&self) -> Vec<String> {
        let mut args = vec![
            "agent".to_string(),
            format!("-config-dir={}", self.config_dir.display()),
        ];
        args.extend(self.recursors.iter().map(|r| format!("-recursor={r}")));
        args
    }

    fn child(&self) -> MutexGuard<'_, Option<Child>> {
        self.child.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// PID of the owned child, else the one recorded in the PID file.
    fn pid(&self) -> Result<Option<i32>> {
        if let Some(child) = self.child().as_ref() {
            return Ok(Some(pid_from_u32(child.id())?));
        }
        read_pid_file(&self.pid_file)
    }
}

impl AgentRunner for ProcessRunner {
    fn run(&self) -> Result<()> {
        let args = self.agent_args();
        info!(agent = %self.agent_path.display(), ?args, "agent-runner.run");

        let child = Command::new(&self.agent_path)
            .args(&args)
            .spawn()
            .map_err(|e| {
                WardenError::Process(format!(
                    "failed to spawn {}: {e}",
                    self.agent_path.display()
                ))
            })?;

        info!(pid = child.id(), "agent-runner.run.spawned");
        *self.child() = Some(child);
        Ok(())
    }

    fn stop(&self) -> Result<()> {
        let Some(pid) = self.pid()? else {
            warn!("agent-runner.stop.no-pid");
            return Ok(());
        };

        info!(pid, "agent-runner.stop");
        match kill(Pid::from_raw(pid), Signal::SIGKILL) {
            Ok(()) | Err(Errno::ESRCH) => Ok(()),
            Err(e) => Err(WardenError::Process(format!("failed to kill {pid}: {e}")).into()),
        }
    }

    fn wait(&self) -> Result<()> {
        if let Some(child) = self.child().as_mut() {
            info!(pid = child.id(), "agent-runner.wait.child");
            let status = child
                .wait()
                .map_err(|e| WardenError::Process(format!("waiting for agent: {e}")))?;
            info!(%status, "agent-runner.wait.exited");
            return Ok(());
        }

        let Some(pid) = read_pid_file(&self.pid_file)? else {
            debug!("agent-runner.wait.no-pid");
            return Ok(());
        };

        info!(pid, "agent-runner.wait.poll");
        while process_alive(pid) {
            self.clock.sleep(self.poll_interval);
        }
        info!(pid, "agent-runner.wait.exited");
        Ok(())
    }

    fn cleanup(&self) -> Result<()> {
        info!(pid_file = %self.pid_file.display(), "agent-runner.cleanup");
        match std::fs::remove_file(&self.pid_file) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(WardenError::io(format!("removing {}", self.pid_file.display()), e).into()),
        }
    }

    fn write_pid(&self) -> Result<()> {
        let pid = self
            .child()
            .as_ref()
            .map(Child::id)
            .ok_or_else(|| WardenError::Process("agent has not been started".to_string()))?;

        info!(pid, pid_file = %self.pid_file.display(), "agent-runner.write-pid");
        std::fs::write(&self.pid_file, pid.to_string())
            .map_err(|e| WardenError::io(format!("writing {}", self.pid_file.display()), e))?;
        Ok(())
    }
}

/// Whether the PID file names a process that is still alive.
///
/// A missing, empty, or unparseable PID file counts as not running.
#[must_use]
pub fn is_running_process(pid_file: &Path) -> bool {
    matches!(read_pid_file(pid_file), Ok(Some(pid)) if process_alive(pid))
}

fn process_alive(pid: i32) -> bool {
    match kill(Pid::from_raw(pid), None) {
        Ok(()) | Err(Errno::EPERM) => true,
        Err(_) => false,
    }
}

fn read_pid_file(path: &Path) -> Result<Option<i32>> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(WardenError::io(format!("reading {}", path.display()), e).into()),
    };

    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let pid: i32 = trimmed.parse().map_err(|e| {
        WardenError::Process(format!("invalid PID in {}: {e}", path.display()))
    })?;
    if pid <= 0 {
        return Err(WardenError::Process(format!("invalid PID in {}: {pid}", path.display())).into());
    }
    Ok(Some(pid))
}

fn pid_from_u32(pid: u32) -> Result<i32> {
    i32::try_from(pid).map_err(|_| WardenError::Process(format!("PID {pid} out of range")).into())
}
