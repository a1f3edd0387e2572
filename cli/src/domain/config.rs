//! Validation of the supervisor configuration before a `start`.
//!
//! Pure functions only: no I/O, no filesystem access. Existence checks on
//! the referenced paths happen in the command layer.

use std::path::Path;

use anyhow::Result;
use warden_common::Config;

use crate::domain::error::WardenError;
use crate::domain::services::check_service_key;

/// Validates the settings `start` depends on.
///
/// # Errors
///
/// Returns `WardenError::Configuration` when the PID file is unset, a path is
/// relative, no LAN member is configured, or a service key is not a plain
/// file name.
pub fn validate_start_config(config: &Config) -> Result<()> {
    let path = &config.path;
    if path.pid_file.as_os_str().is_empty() {
        return Err(WardenError::Configuration("\"pid_file\" cannot be empty".to_string()).into());
    }

    for (key, value) in [
        ("agent_path", &path.agent_path),
        ("agent_config_dir", &path.agent_config_dir),
        ("pid_file", &path.pid_file),
        ("keyring_file", &path.keyring_file),
        ("data_dir", &path.data_dir),
    ] {
        require_absolute(key, value)?;
    }

    if config.cluster.agent.servers.lan.is_empty() {
        return Err(WardenError::Configuration(
            "at least one \"expected-member\" must be provided".to_string(),
        )
        .into());
    }

    for key in config.cluster.agent.services.keys() {
        check_service_key(key)?;
    }

    Ok(())
}

fn require_absolute(key: &str, value: &Path) -> Result<()> {
    if !value.is_absolute() {
        return Err(WardenError::Configuration(format!(
            "\"{key}\" must be an absolute path, got \"{}\"",
            value.display()
        ))
        .into());
    }
    Ok(())
}
