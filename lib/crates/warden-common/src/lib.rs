pub mod config;
pub mod service;

pub use config::{
    AgentSettings, ClusterConfig, Config, ConfigLoadError, DnsConfig, NodeConfig, PathConfig,
    Role, ServerSeeds, SupervisorConfig,
};
pub use service::{ServiceCheck, ServiceDefinition};
