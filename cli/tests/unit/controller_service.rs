//! Tests for the agent lifecycle `Controller`.

#![allow(clippy::expect_used)]

use std::sync::Arc;
use std::time::Duration;

use warden::application::ports::Clock;
use warden::application::timeout::Timeout;
use warden::domain::WardenError;
use warden_common::{Config, ServiceDefinition};

use crate::mocks::{self, FakeClock, RETRY_DELAY, call_log, calls, count, position};

fn server_config(keys: &[&str]) -> Config {
    let mut config = Config::default();
    config.node.name = "n".to_string();
    config.cluster.agent.mode = "server".to_string();
    config.cluster.agent.servers.lan = vec!["m1".to_string()];
    config.cluster.encrypt_keys = keys.iter().map(ToString::to_string).collect();
    config
}

fn timeout(clock: &Arc<FakeClock>, secs: u64) -> Timeout {
    Timeout::after(
        Arc::clone(clock) as Arc<dyn Clock>,
        Duration::from_secs(secs),
    )
    .expect("timeout")
}

fn warden_error(err: &anyhow::Error) -> Option<&WardenError> {
    err.downcast_ref::<WardenError>()
}

// ── call_with_timeout ─────────────────────────────────────────────────────────

#[test]
fn retry_terminates_between_deadline_and_one_delay_past_it() {
    let log = call_log();
    let clock = FakeClock::new();
    let mut controller = mocks::controller(&log, &clock, Config::default());
    controller.retry_delay = Duration::from_secs(3);
    let start = clock.now();
    let deadline = timeout(&clock, 10);

    let err = controller
        .call_with_timeout(&deadline, || Err(anyhow::anyhow!("not yet")))
        .expect_err("never succeeds");

    assert!(matches!(warden_error(&err), Some(WardenError::TimeoutExceeded)));
    let elapsed = clock.now() - start;
    assert!(elapsed >= Duration::from_secs(10), "returned early: {elapsed:?}");
    assert!(elapsed <= Duration::from_secs(13), "returned late: {elapsed:?}");
}

#[test]
fn retry_succeeds_after_two_failures_with_exactly_two_delays() {
    let log = call_log();
    let clock = FakeClock::new();
    let controller = mocks::controller(&log, &clock, Config::default());
    let deadline = timeout(&clock, 60);

    let mut attempts = 0;
    controller
        .call_with_timeout(&deadline, || {
            attempts += 1;
            if attempts <= 2 {
                anyhow::bail!("attempt {attempts} failed");
            }
            Ok(())
        })
        .expect("third attempt succeeds");

    assert_eq!(attempts, 3);
    assert_eq!(clock.sleeps(), vec![RETRY_DELAY, RETRY_DELAY]);
}

#[test]
fn retry_first_attempt_is_immediate() {
    let log = call_log();
    let clock = FakeClock::new();
    let controller = mocks::controller(&log, &clock, Config::default());
    let deadline = timeout(&clock, 60);

    controller
        .call_with_timeout(&deadline, || Ok(()))
        .expect("succeeds");
    assert!(clock.sleeps().is_empty());
}

#[test]
fn retry_with_expired_timeout_never_probes() {
    let log = call_log();
    let clock = FakeClock::new();
    let controller = mocks::controller(&log, &clock, Config::default());
    let deadline = timeout(&clock, 0);

    let mut probed = false;
    let err = controller
        .call_with_timeout(&deadline, || {
            probed = true;
            Ok(())
        })
        .expect_err("already expired");
    assert!(!probed);
    assert!(matches!(warden_error(&err), Some(WardenError::TimeoutExceeded)));
}

// ── write_service_definitions ─────────────────────────────────────────────────

#[test]
fn write_service_definitions_writes_into_config_dir() {
    let log = call_log();
    let clock = FakeClock::new();
    let mut config = Config::default();
    config
        .cluster
        .agent
        .services
        .insert("router".to_string(), ServiceDefinition::default());
    let controller = mocks::controller(&log, &clock, config);

    controller.write_service_definitions().expect("write");
    assert_eq!(
        calls(&log),
        vec![
            "generate_definitions".to_string(),
            format!("write_definitions {} 1", mocks::config_dir().display()),
        ]
    );
}

#[test]
fn write_service_definitions_propagates_write_failure() {
    let log = call_log();
    let clock = FakeClock::new();
    let controller = mocks::controller(&log, &clock, Config::default());
    controller
        .service_definer
        .script
        .fail_always("write_definitions");

    assert!(controller.write_service_definitions().is_err());
}

// ── boot_agent ────────────────────────────────────────────────────────────────

#[test]
fn boot_agent_runs_then_verifies_join() {
    let log = call_log();
    let clock = FakeClock::new();
    let controller = mocks::controller(&log, &clock, Config::default());

    controller.boot_agent(&timeout(&clock, 10)).expect("boot");
    assert_eq!(calls(&log), vec!["run", "verify_joined"]);
}

#[test]
fn boot_agent_launch_failure_is_not_retried() {
    let log = call_log();
    let clock = FakeClock::new();
    let controller = mocks::controller(&log, &clock, Config::default());
    controller.agent_runner.script.fail_always("run");

    controller
        .boot_agent(&timeout(&clock, 10))
        .expect_err("launch fails");
    assert_eq!(calls(&log), vec!["run"]);
    assert!(clock.sleeps().is_empty());
}

#[test]
fn boot_agent_times_out_and_leaves_agent_running() {
    let log = call_log();
    let clock = FakeClock::new();
    let controller = mocks::controller(&log, &clock, Config::default());
    controller.agent_client.script.fail_always("verify_joined");

    let err = controller
        .boot_agent(&timeout(&clock, 5))
        .expect_err("never joins");
    assert!(matches!(warden_error(&err), Some(WardenError::TimeoutExceeded)));
    assert_eq!(count(&log, "run"), 1);
    assert_eq!(count(&log, "verify_joined"), 5);
    assert_eq!(count(&log, "stop"), 0);
}

// ── configure_client ──────────────────────────────────────────────────────────

#[test]
fn configure_client_only_writes_pid() {
    let log = call_log();
    let clock = FakeClock::new();
    let controller = mocks::controller(&log, &clock, Config::default());

    controller.configure_client().expect("configure");
    assert_eq!(calls(&log), vec!["write_pid"]);
}

// ── configure_server ──────────────────────────────────────────────────────────

#[test]
fn configure_server_syncs_before_setting_keys() {
    let log = call_log();
    let clock = FakeClock::new();
    let mut controller = mocks::controller(&log, &clock, server_config(&["k1", "k2"]));
    controller.agent_client.last_node = true;
    controller.agent_client.script.fail("verify_synced", 1);

    controller
        .configure_server(&timeout(&clock, 10), None)
        .expect("configure");

    assert_eq!(
        calls(&log),
        vec![
            "is_last_node",
            "verify_synced",
            "verify_synced",
            "set_keys k1,k2",
            "write_pid"
        ]
    );
}

#[test]
fn configure_server_skips_sync_when_not_last_node() {
    let log = call_log();
    let clock = FakeClock::new();
    let controller = mocks::controller(&log, &clock, server_config(&["k1"]));

    controller
        .configure_server(&timeout(&clock, 10), None)
        .expect("configure");
    assert_eq!(calls(&log), vec!["is_last_node", "set_keys k1", "write_pid"]);
}

#[test]
fn configure_server_binds_supplied_rpc_client_first() {
    let log = call_log();
    let clock = FakeClock::new();
    let controller = mocks::controller(&log, &clock, server_config(&["k1"]));
    let rpc = Box::new(mocks::RecordingRpc {
        log: Arc::clone(&log),
    });

    controller
        .configure_server(&timeout(&clock, 10), Some(rpc))
        .expect("configure");
    assert_eq!(position(&log, "bind_rpc_client"), Some(0));
}

#[test]
fn configure_server_without_keys_is_configuration_error() {
    let log = call_log();
    let clock = FakeClock::new();
    let controller = mocks::controller(&log, &clock, server_config(&[]));

    let err = controller
        .configure_server(&timeout(&clock, 10), None)
        .expect_err("no keys");

    assert!(matches!(warden_error(&err), Some(WardenError::Configuration(_))));
    assert!(!calls(&log).iter().any(|c| c.starts_with("set_keys")));
    assert_eq!(count(&log, "write_pid"), 0);
}

#[test]
fn configure_server_sync_timeout_skips_keys() {
    let log = call_log();
    let clock = FakeClock::new();
    let mut controller = mocks::controller(&log, &clock, server_config(&["k1"]));
    controller.agent_client.last_node = true;
    controller.agent_client.script.fail_always("verify_synced");

    let err = controller
        .configure_server(&timeout(&clock, 3), None)
        .expect_err("never syncs");
    assert!(matches!(warden_error(&err), Some(WardenError::TimeoutExceeded)));
    assert!(!calls(&log).iter().any(|c| c.starts_with("set_keys")));
    assert_eq!(count(&log, "write_pid"), 0);
}

#[test]
fn configure_server_set_keys_failure_skips_pid() {
    let log = call_log();
    let clock = FakeClock::new();
    let controller = mocks::controller(&log, &clock, server_config(&["k1"]));
    controller.agent_client.script.fail_always("set_keys");

    controller
        .configure_server(&timeout(&clock, 10), None)
        .expect_err("set_keys fails");
    assert_eq!(count(&log, "write_pid"), 0);
}

#[test]
fn configure_server_last_node_query_failure_skips_remaining_steps() {
    let log = call_log();
    let clock = FakeClock::new();
    let mut controller = mocks::controller(&log, &clock, server_config(&["k1"]));
    controller.agent_client.last_node = true;
    controller.agent_client.script.fail("is_last_node", 1);

    controller
        .configure_server(&timeout(&clock, 10), None)
        .expect_err("is_last_node fails");

    assert_eq!(calls(&log), vec!["is_last_node"]);
    assert_eq!(count(&log, "verify_synced"), 0);
    assert!(!calls(&log).iter().any(|c| c.starts_with("set_keys")));
    assert_eq!(count(&log, "write_pid"), 0);
    assert!(clock.sleeps().is_empty());
}

// ── stop_agent ────────────────────────────────────────────────────────────────

#[test]
fn stop_agent_graceful_leave_skips_force_stop() {
    let log = call_log();
    let clock = FakeClock::new();
    let controller = mocks::controller(&log, &clock, Config::default());

    controller.stop_agent(None);
    assert_eq!(calls(&log), vec!["leave", "wait", "cleanup"]);
}

#[test]
fn stop_agent_failed_leave_still_stops_waits_and_cleans_up_once() {
    let log = call_log();
    let clock = FakeClock::new();
    let controller = mocks::controller(&log, &clock, Config::default());
    controller.agent_client.script.fail_always("leave");

    controller.stop_agent(None);

    assert_eq!(count(&log, "stop"), 1);
    assert_eq!(count(&log, "wait"), 1);
    assert_eq!(count(&log, "cleanup"), 1);
    assert_eq!(calls(&log), vec!["leave", "stop", "wait", "cleanup"]);
}

#[test]
fn stop_agent_never_short_circuits() {
    let log = call_log();
    let clock = FakeClock::new();
    let controller = mocks::controller(&log, &clock, Config::default());
    controller.agent_client.script.fail_always("leave");
    controller.agent_runner.script.fail_always("stop");
    controller.agent_runner.script.fail_always("wait");
    controller.agent_runner.script.fail_always("cleanup");

    controller.stop_agent(Some(Box::new(mocks::RecordingRpc {
        log: Arc::clone(&log),
    })));

    assert_eq!(
        calls(&log),
        vec!["bind_rpc_client", "leave", "stop", "wait", "cleanup"]
    );
}
