//! Raw file operations shared by the filesystem adapters.

use std::path::Path;

use crate::domain::WardenError;

/// Replace `path` with `content` via a sibling temp file and rename.
///
/// Readers never observe a partially written file. The file ends up with
/// mode `0o600` on unix.
///
/// # Errors
///
/// Returns `WardenError::Io` naming the step that failed. The temp file is
/// removed on a failed rename.
pub fn write_atomic(path: &Path, content: &[u8]) -> Result<(), WardenError> {
    let mut temp_name = path.file_name().unwrap_or_default().to_os_string();
    temp_name.push(".tmp");
    let temp_path = path.with_file_name(temp_name);

    std::fs::write(&temp_path, content)
        .map_err(|e| WardenError::io(format!("writing {}", temp_path.display()), e))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&temp_path, std::fs::Permissions::from_mode(0o600))
            .map_err(|e| WardenError::io(format!("setting permissions on {}", temp_path.display()), e))?;
    }

    if let Err(e) = std::fs::rename(&temp_path, path) {
        let _ = std::fs::remove_file(&temp_path);
        return Err(WardenError::io(format!("writing {}", path.display()), e));
    }
    Ok(())
}
