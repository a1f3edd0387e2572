//! Application service — voting member workflow.

use anyhow::Result;
use tracing::error;
use warden_common::Config;

use crate::application::ports::{
    AgentClient, AgentRunner, ConfigWriter, LOCAL_AGENT_ADDRESS, RpcConnector, ServiceDefiner,
};
use crate::application::services::NodeRunner;
use crate::application::services::controller::Controller;
use crate::application::timeout::Timeout;

/// Start/stop workflow for an agent that takes part in consensus.
///
/// Unlike [`super::Client`], the keyring is never reset before boot: a
/// server's keyring is managed by rotation through `set_keys`.
pub struct Server<R, C, D, W, N> {
    controller: Controller<R, C, D>,
    config_writer: W,
    rpc_connector: N,
}

impl<R, C, D, W, N> Server<R, C, D, W, N> {
    #[must_use]
    pub fn new(controller: Controller<R, C, D>, config_writer: W, rpc_connector: N) -> Self {
        Self {
            controller,
            config_writer,
            rpc_connector,
        }
    }

    #[must_use]
    pub fn controller(&self) -> &Controller<R, C, D> {
        &self.controller
    }
}

impl<R, C, D, W, N> NodeRunner for Server<R, C, D, W, N>
where
    R: AgentRunner,
    C: AgentClient,
    D: ServiceDefiner,
    W: ConfigWriter,
    N: RpcConnector,
{
    fn start(&self, config: &Config, timeout: &Timeout) -> Result<()> {
        self.config_writer.write(config)?;
        self.controller.write_service_definitions()?;
        self.controller.boot_agent(timeout)?;

        let rpc = self.rpc_connector.connect(LOCAL_AGENT_ADDRESS)?;
        self.controller.configure_server(timeout, Some(rpc))
    }

    fn stop(&self) -> Result<()> {
        match self.rpc_connector.connect(LOCAL_AGENT_ADDRESS) {
            Ok(rpc) => {
                self.controller.stop_agent(Some(rpc));
                Ok(())
            }
            Err(err) => {
                error!(error = %err, "server.stop.rpc-client.failed");
                self.controller.stop_agent(None);
                Err(err)
            }
        }
    }
}
