//! Domain layer — pure business logic, types, and validation.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `std::fs`, `std::process`, or `std::net`.
//! All functions are synchronous and take data in, returning data out.

pub mod agent_config;
pub mod config;
pub mod error;
pub mod identity;
pub mod keys;
pub mod services;

pub use agent_config::AgentConfiguration;
pub use config::validate_start_config;
pub use error::WardenError;
pub use identity::NodeIdentity;
pub use keys::encrypt_key;
pub use services::{check_service_key, generate_definitions};
