//! Typed domain error enum.
//!
//! Every failure the supervisor reports falls into one of these kinds.
//! Variants convert to `anyhow::Error` via the `?` operator; callers that need
//! the kind recover it with `downcast_ref::<WardenError>()`.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WardenError {
    /// Invalid or missing required settings.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Filesystem access failure on a config, identity, PID or keyring file.
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// The persisted node-identity marker cannot be parsed.
    #[error("corrupt node identity in {}: {reason}", path.display())]
    CorruptIdentity { path: PathBuf, reason: String },

    /// A bounded wait ran out of time.
    #[error("timeout exceeded")]
    TimeoutExceeded,

    /// The agent failed to launch or exited unexpectedly.
    #[error("agent process error: {0}")]
    Process(String),

    /// A status or keyring call against the agent failed.
    #[error("agent rpc error: {0}")]
    Rpc(String),
}

impl WardenError {
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}
