//! Application service — non-voting member workflow.

use anyhow::Result;
use tracing::error;
use warden_common::Config;

use crate::application::ports::{
    AgentClient, AgentRunner, ConfigWriter, KeyringRemover, LOCAL_AGENT_ADDRESS, RpcConnector,
    ServiceDefiner,
};
use crate::application::services::NodeRunner;
use crate::application::services::controller::Controller;
use crate::application::timeout::Timeout;

/// Start/stop workflow for an agent that does not vote.
///
/// The local keyring is reset on every boot so the agent rebuilds it from the
/// keys in its freshly written configuration.
pub struct Client<R, C, D, W, K, N> {
    controller: Controller<R, C, D>,
    config_writer: W,
    keyring_remover: K,
    rpc_connector: N,
}

impl<R, C, D, W, K, N> Client<R, C, D, W, K, N> {
    #[must_use]
    pub fn new(
        controller: Controller<R, C, D>,
        config_writer: W,
        keyring_remover: K,
        rpc_connector: N,
    ) -> Self {
        Self {
            controller,
            config_writer,
            keyring_remover,
            rpc_connector,
        }
    }

    #[must_use]
    pub fn controller(&self) -> &Controller<R, C, D> {
        &self.controller
    }
}

impl<R, C, D, W, K, N> NodeRunner for Client<R, C, D, W, K, N>
where
    R: AgentRunner,
    C: AgentClient,
    D: ServiceDefiner,
    W: ConfigWriter,
    K: KeyringRemover,
    N: RpcConnector,
{
    fn start(&self, config: &Config, timeout: &Timeout) -> Result<()> {
        self.config_writer.write(config)?;
        self.controller.write_service_definitions()?;
        self.keyring_remover.execute()?;
        self.controller.boot_agent(timeout)?;
        self.controller.configure_client()
    }

    fn stop(&self) -> Result<()> {
        match self.rpc_connector.connect(LOCAL_AGENT_ADDRESS) {
            Ok(rpc) => {
                self.controller.stop_agent(Some(rpc));
                Ok(())
            }
            Err(err) => {
                error!(error = %err, "client.stop.rpc-client.failed");
                self.controller.stop_agent(None);
                Err(err)
            }
        }
    }
}
