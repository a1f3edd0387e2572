//! Node-identity marker store.
//!
//! A single-record key-value store in the data directory. The first run on a
//! data directory claims the identity derived from the job instance; every
//! later run reads it back unchanged, so renumbered instances keep their
//! cluster identity.

use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::{error, info};
use warden_common::Config;

use crate::domain::WardenError;
use crate::domain::identity::{IDENTITY_MARKER_FILE, NodeIdentity};
use crate::infra::fs::write_atomic;

pub struct IdentityMarker {
    dir: PathBuf,
    path: PathBuf,
}

impl IdentityMarker {
    /// Marker living in `data_dir`.
    #[must_use]
    pub fn in_dir(data_dir: &Path) -> Self {
        Self {
            dir: data_dir.to_path_buf(),
            path: data_dir.join(IDENTITY_MARKER_FILE),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Return the persisted identity, claiming a derived one on first use.
    ///
    /// # Errors
    ///
    /// Returns `WardenError::Io` when the data directory is missing or the
    /// marker cannot be read or written, and `WardenError::CorruptIdentity`
    /// when an existing marker cannot be parsed.
    pub fn resolve(&self, config: &Config) -> Result<NodeIdentity> {
        std::fs::metadata(&self.dir)
            .map_err(|e| WardenError::io(format!("stat {}", self.dir.display()), e))?;

        match std::fs::read(&self.path) {
            Ok(data) => NodeIdentity::parse(&data).map_err(|reason| {
                WardenError::CorruptIdentity {
                    path: self.path.clone(),
                    reason,
                }
                .into()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => self.claim(config),
            Err(e) => Err(WardenError::io(format!("reading {}", self.path.display()), e).into()),
        }
    }

    fn claim(&self, config: &Config) -> Result<NodeIdentity> {
        let identity = NodeIdentity::derive(config);
        info!(node_name = %identity.node_name, "identity-marker.claim");

        let data = identity.to_json()?;
        if let Err(err) = write_atomic(&self.path, &data) {
            error!(error = %err, "identity-marker.claim.failed");
            return Err(err.into());
        }
        Ok(identity)
    }
}
