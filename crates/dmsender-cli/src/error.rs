//! CLI-specific error types and exit code mapping.

use dmsender_core::{PathError, SettingsError};
use thiserror::Error;

/// CLI-specific error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// Invalid settings from the environment or flags.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The backend process could not be started.
    #[error("Backend failed to start (check the Java runtime and app.jar paths)")]
    StartFailed,

    /// The backend never accepted a connection.
    #[error("Backend did not become reachable at {0}")]
    Unreachable(String),

    /// The backend process died on its own.
    #[error("Backend process exited unexpectedly (code {})", exit_label(.code))]
    BackendExited { code: Option<i32> },
}

fn exit_label(code: &Option<i32>) -> String {
    code.map_or_else(|| "none".to_string(), |c| c.to_string())
}

impl CliError {
    /// Map error to appropriate exit code.
    ///
    /// Exit codes follow sysexits.h where one fits.
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) => 78,            // EX_CONFIG
            Self::StartFailed => 69,          // EX_UNAVAILABLE
            Self::Unreachable(_) => 75,       // EX_TEMPFAIL
            Self::BackendExited { .. } => 70, // EX_SOFTWARE
        }
    }
}

impl From<SettingsError> for CliError {
    fn from(err: SettingsError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<PathError> for CliError {
    fn from(err: PathError) -> Self {
        Self::Config(err.to_string())
    }
}
