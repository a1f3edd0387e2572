//! Application layer — port trait definitions and use-case orchestration.
//!
//! This module depends only on `crate::domain`, never on `crate::infra`,
//! `crate::commands`, or `crate::output`.

pub mod ports;
pub mod services;
pub mod timeout;

pub use ports::{
    AgentClient, AgentRpc, AgentRunner, Clock, ConfigWriter, KeyringRemover, LOCAL_AGENT_ADDRESS,
    ProgressReporter, RpcConnector, ServiceDefiner,
};
pub use services::{Client, Controller, NodeRunner, Server};
pub use timeout::Timeout;
