//! Application services — use-case orchestration.
//!
//! Each service module implements a single use-case by composing domain logic
//! with port trait calls. Services import only from `crate::domain` and
//! `crate::application`, never from `crate::infra`, `crate::commands`, or
//! `crate::output`.

use anyhow::Result;
use warden_common::Config;

use crate::application::timeout::Timeout;

pub mod client;
pub mod controller;
pub mod server;

pub use client::Client;
pub use controller::Controller;
pub use server::Server;

/// The start/stop capability shared by both agent roles.
///
/// Selected once at startup from the configured role; see
/// [`Client`] for non-voting members and [`Server`] for voting members.
pub trait NodeRunner {
    /// Bring the agent up and into the cluster.
    ///
    /// # Errors
    ///
    /// Returns the first failing step's error. Nothing is cleaned up; callers
    /// run [`NodeRunner::stop`] on failure.
    fn start(&self, config: &Config, timeout: &Timeout) -> Result<()>;

    /// Take the agent out of the cluster and terminate it.
    ///
    /// # Errors
    ///
    /// Returns only an RPC-client construction error; every shutdown step
    /// still runs.
    fn stop(&self) -> Result<()>;
}
