//! Supervisor error types.
//!
//! Preflight failures are reported to callers as a plain `false` from
//! `start()`; this enum carries the detail for logs and `try_start()`.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while starting the backend process.
#[derive(Debug, Error)]
pub enum SupervisorError {
    /// The runtime executable is not on disk.
    #[error("Backend executable not found: {}", path.display())]
    ExecutableMissing { path: PathBuf },

    /// The backend artifact (jar) is not on disk.
    #[error("Backend artifact not found: {}", path.display())]
    ArtifactMissing { path: PathBuf },

    /// A live backend process already exists for this supervisor.
    #[error("Backend process is already running (pid {pid:?})")]
    AlreadyRunning { pid: Option<u32> },

    /// The backend log sink could not be opened.
    #[error("Failed to open backend log {}: {source}", path.display())]
    LogSink {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The augmented search path could not be assembled.
    #[error("Failed to build backend search path: {0}")]
    SearchPath(String),

    /// The OS refused to spawn the process.
    #[error("Failed to spawn backend process: {0}")]
    Spawn(#[source] io::Error),
}

impl SupervisorError {
    /// True for failures detected before any side effect (missing files).
    pub const fn is_preflight(&self) -> bool {
        matches!(
            self,
            Self::ExecutableMissing { .. } | Self::ArtifactMissing { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preflight_classification() {
        let missing = SupervisorError::ExecutableMissing {
            path: PathBuf::from("/nope/java"),
        };
        assert!(missing.is_preflight());
        assert!(missing.to_string().contains("/nope/java"));

        let running = SupervisorError::AlreadyRunning { pid: Some(42) };
        assert!(!running.is_preflight());
    }
}
