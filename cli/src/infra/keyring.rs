//! Infrastructure implementation of the `KeyringRemover` port.

use std::path::PathBuf;

use anyhow::Result;
use tracing::{error, info};

use crate::application::ports::KeyringRemover;
use crate::domain::WardenError;

/// Deletes the agent's serf keyring so the next boot rebuilds it from the
/// `encrypt` key in the generated configuration.
pub struct FileKeyringRemover {
    path: PathBuf,
}

impl FileKeyringRemover {
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl KeyringRemover for FileKeyringRemover {
    fn execute(&self) -> Result<()> {
        info!(keyring = %self.path.display(), "keyring-remover.execute");
        match std::fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                let err = WardenError::io(format!("removing {}", self.path.display()), e);
                error!(error = %err, "keyring-remover.execute.failed");
                return Err(err.into());
            }
        }
        info!("keyring-remover.execute.success");
        Ok(())
    }
}
