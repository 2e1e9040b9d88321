//! Data directory resolution.
//!
//! The shell keeps its own files (the backend log, rolling shell logs) under
//! a single data root.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Environment variable that overrides the data root.
pub const ENV_DATA_DIR: &str = "DMSENDER_DATA_DIR";

/// File name of the backend log sink.
pub const BACKEND_LOG_FILE: &str = "dmsender.log";

/// Errors that can occur during path resolution.
#[derive(Debug, Error)]
pub enum PathError {
    /// Could not determine the system data directory.
    #[error("Cannot determine system data directory")]
    NoDataDir,

    /// Failed to create a directory.
    #[error("Failed to create directory {path}: {reason}")]
    CreateFailed { path: PathBuf, reason: String },
}

/// Get the root directory for shell data.
///
/// Resolution order:
/// 1. `DMSENDER_DATA_DIR` environment variable
/// 2. System data directory (e.g., `~/.local/share/dmsender`)
pub fn data_root() -> Result<PathBuf, PathError> {
    data_root_with(|var| env::var(var).ok())
}

/// [`data_root`] with an injected environment lookup.
pub fn data_root_with<F>(lookup: F) -> Result<PathBuf, PathError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(path) = lookup(ENV_DATA_DIR).filter(|p| !p.trim().is_empty()) {
        return Ok(PathBuf::from(path));
    }

    let root = dirs::data_dir().ok_or(PathError::NoDataDir)?.join("dmsender");
    ensure_dir(&root)?;
    Ok(root)
}

/// Directory holding every log file the shell writes.
pub fn logs_dir(root: &Path) -> PathBuf {
    root.join("logs")
}

/// Default location of the backend log sink under `root`.
pub fn backend_log_path(root: &Path) -> PathBuf {
    logs_dir(root).join(BACKEND_LOG_FILE)
}

fn ensure_dir(path: &Path) -> Result<(), PathError> {
    if !path.exists() {
        fs::create_dir_all(path).map_err(|e| PathError::CreateFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_override_wins() {
        let root = data_root_with(|var| {
            (var == ENV_DATA_DIR).then(|| "/tmp/dmsender-test-root".to_string())
        })
        .unwrap();
        assert_eq!(root, PathBuf::from("/tmp/dmsender-test-root"));
    }

    #[test]
    fn backend_log_lives_under_logs() {
        let dir = tempfile::tempdir().unwrap();
        let path = backend_log_path(dir.path());
        assert_eq!(path, dir.path().join("logs").join("dmsender.log"));
    }
}
