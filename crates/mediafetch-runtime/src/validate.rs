//! Extractor binary validation.

use mediafetch_core::ProvisionError;
use std::path::{Path, PathBuf};

/// Whether `path` is a regular file the current user may execute.
///
/// On non-unix platforms only existence is checked.
pub fn is_executable(path: &Path) -> bool {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::metadata(path).is_ok_and(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
    }

    #[cfg(not(unix))]
    {
        path.is_file()
    }
}

/// Validate that a binary exists and is executable.
pub fn validate_binary(path: &Path) -> Result<PathBuf, ProvisionError> {
    if !path.exists() {
        return Err(ProvisionError::NotFound(path.to_path_buf()));
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        match std::fs::metadata(path) {
            Ok(metadata) => {
                // Any execute bit (owner, group, or other)
                if !metadata.is_file() || metadata.permissions().mode() & 0o111 == 0 {
                    return Err(ProvisionError::NotExecutable(path.to_path_buf()));
                }
            }
            Err(e) => return Err(ProvisionError::install(path, e)),
        }
    }

    Ok(path.to_path_buf())
}
