//! File permission helpers for secret material
//!
//! Key files and the encrypted secrets file must not be readable by other
//! users. On Windows these are no-ops (permissions are managed via ACLs).

use crate::error::{Error, Result};
use std::path::Path;

/// Set restrictive permissions on a file (Unix: 0o600 - owner read/write only)
///
/// # Errors
///
/// Returns `Error::FileRead`/`Error::FileWrite` if the file metadata cannot
/// be read or the permissions cannot be applied.
#[cfg(unix)]
pub fn set_secure_file_permissions(path: &Path) -> Result<()> {
    use std::fs;
    use std::os::unix::fs::PermissionsExt;

    let metadata = fs::metadata(path).map_err(|e| Error::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    let mut perms = metadata.permissions();
    perms.set_mode(0o600); // Owner read/write only

    fs::set_permissions(path, perms).map_err(|e| Error::FileWrite {
        path: path.to_path_buf(),
        source: e,
    })?;

    Ok(())
}

/// Set restrictive permissions on a directory (Unix: 0o700 - owner rwx only)
///
/// # Errors
///
/// Returns `Error::FileRead`/`Error::FileWrite` if the directory metadata
/// cannot be read or the permissions cannot be applied.
#[cfg(unix)]
pub fn set_secure_dir_permissions(path: &Path) -> Result<()> {
    use std::fs;
    use std::os::unix::fs::PermissionsExt;

    let metadata = fs::metadata(path).map_err(|e| Error::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    let mut perms = metadata.permissions();
    perms.set_mode(0o700); // Owner read/write/execute only

    fs::set_permissions(path, perms).map_err(|e| Error::FileWrite {
        path: path.to_path_buf(),
        source: e,
    })?;

    Ok(())
}

/// Ensure a directory exists with secure permissions (Unix: 0o700)
///
/// Combines `fs::create_dir_all` with `set_secure_dir_permissions`.
/// Cross-platform safe: on Windows it just creates the directory.
///
/// # Errors
///
/// Returns `Error::DirectoryCreate` if directory creation fails.
pub fn ensure_secure_dir(path: &Path) -> Result<()> {
    std::fs::create_dir_all(path).map_err(|e| Error::DirectoryCreate {
        path: path.to_path_buf(),
        source: e,
    })?;

    #[cfg(unix)]
    set_secure_dir_permissions(path)?;

    Ok(())
}

/// No-op on Windows (permissions managed via ACLs)
#[cfg(not(unix))]
pub fn set_secure_file_permissions(_path: &Path) -> Result<()> {
    Ok(())
}

/// No-op on Windows (permissions managed via ACLs)
#[cfg(not(unix))]
pub fn set_secure_dir_permissions(_path: &Path) -> Result<()> {
    Ok(())
}
