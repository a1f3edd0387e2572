//! Infrastructure implementation of the `ConfigWriter` port.

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{error, info};
use warden_common::Config;

use crate::application::ports::ConfigWriter;
use crate::domain::agent_config::{AGENT_CONFIG_FILE, AgentConfiguration};
use crate::infra::fs::write_atomic;
use crate::infra::identity::IdentityMarker;

/// Renders `config.json` into the agent config directory.
pub struct AgentConfigWriter {
    config_dir: PathBuf,
}

impl AgentConfigWriter {
    #[must_use]
    pub fn new(config_dir: PathBuf) -> Self {
        Self { config_dir }
    }
}

impl ConfigWriter for AgentConfigWriter {
    fn write(&self, config: &Config) -> Result<()> {
        info!("config-writer.write.resolve-identity");
        let identity = match IdentityMarker::in_dir(&config.path.data_dir).resolve(config) {
            Ok(identity) => identity,
            Err(err) => {
                error!(error = %err, "config-writer.write.resolve-identity.failed");
                return Err(err);
            }
        };

        let document = AgentConfiguration::generate(config, &self.config_dir, &identity.node_name);
        let content = document.to_json().context("serializing agent configuration")?;

        let path = self.config_dir.join(AGENT_CONFIG_FILE);
        info!(path = %path.display(), node_name = %identity.node_name, "config-writer.write");
        if let Err(err) = write_atomic(&path, &content) {
            error!(error = %err, "config-writer.write.failed");
            return Err(err.into());
        }

        info!("config-writer.write.success");
        Ok(())
    }
}
