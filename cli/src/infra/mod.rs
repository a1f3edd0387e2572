//! Infrastructure layer — concrete implementations of application port traits.
//!
//! This module contains all I/O-performing code: process management,
//! filesystem access, and the agent HTTP API.
//!
//! Imports from `crate::domain` and `crate::application::ports` are allowed.
//! Imports from `crate::commands` or `crate::output` are forbidden.

pub mod agent_client;
pub mod clock;
pub mod config_writer;
pub mod fs;
pub mod identity;
pub mod keyring;
pub mod process;
pub mod service_definer;
