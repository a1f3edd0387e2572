//! Durable node identity record.
//!
//! The marker file holds a single `{"node_name": "..."}` record. Parsing and
//! rendering live here; reading and writing the file is the job of
//! `infra::identity::IdentityMarker`.

use serde::{Deserialize, Serialize};
use warden_common::Config;

/// File name of the marker inside the data directory.
pub const IDENTITY_MARKER_FILE: &str = "node-name.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeIdentity {
    pub node_name: String,
}

impl NodeIdentity {
    /// Identity for a data directory that has never been claimed.
    #[must_use]
    pub fn derive(config: &Config) -> Self {
        Self {
            node_name: config.derived_node_name(),
        }
    }

    /// Parse a marker record.
    ///
    /// # Errors
    ///
    /// Returns a description of the problem when the record is not valid
    /// JSON or names an empty node.
    pub fn parse(data: &[u8]) -> Result<Self, String> {
        let identity: Self = serde_json::from_slice(data).map_err(|e| e.to_string())?;
        if identity.node_name.trim().is_empty() {
            return Err("node_name is empty".to_string());
        }
        Ok(identity)
    }

    /// Render the marker record.
    ///
    /// # Errors
    ///
    /// Returns an error only if serialization itself fails.
    pub fn to_json(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }
}
