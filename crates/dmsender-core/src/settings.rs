//! Shell settings and validation.
//!
//! Settings are plain data. Environment overrides are read through an
//! injected lookup so callers (and tests) decide where values come from.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Port the backend's embedded web server binds.
pub const DEFAULT_BACKEND_PORT: u16 = 8010;

/// Connection attempts before the orchestrator gives up.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;

/// Upper bound accepted for `max_attempts`.
pub const MAX_ATTEMPTS_LIMIT: u32 = 1000;

pub const ENV_JAVA: &str = "DMSENDER_JAVA";
pub const ENV_JAR: &str = "DMSENDER_JAR";
pub const ENV_LOG_PATH: &str = "DMSENDER_LOG_PATH";
pub const ENV_BACKEND_HOST: &str = "DMSENDER_BACKEND_HOST";
pub const ENV_BACKEND_PORT: &str = "DMSENDER_BACKEND_PORT";
pub const ENV_PROBE_ATTEMPTS: &str = "DMSENDER_PROBE_ATTEMPTS";
pub const ENV_PROBE_TIMEOUT_MS: &str = "DMSENDER_PROBE_TIMEOUT_MS";
pub const ENV_RETRY_DELAY_MS: &str = "DMSENDER_RETRY_DELAY_MS";
pub const ENV_STAGE_WAIT_MS: &str = "DMSENDER_STAGE_WAIT_MS";
pub const ENV_STAGE_POLL_MS: &str = "DMSENDER_STAGE_POLL_MS";

#[cfg(windows)]
const DEFAULT_JAVA: &str = "jre/bin/java.exe";
#[cfg(not(windows))]
const DEFAULT_JAVA: &str = "jre/bin/java";

/// Everything the supervisor, prober and orchestrator need to run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ShellSettings {
    /// Java runtime used to launch the backend.
    pub executable: PathBuf,

    /// Backend artifact passed after `leading_args`.
    pub artifact: PathBuf,

    /// Arguments placed between the executable and the artifact.
    pub leading_args: Vec<String>,

    /// Backend log sink. `None` means `<data root>/logs/dmsender.log`.
    pub log_path: Option<PathBuf>,

    pub backend_host: String,
    pub backend_port: u16,

    /// Connection attempts per run (1-1000).
    pub max_attempts: u32,

    pub attempt_timeout_ms: u64,
    pub retry_delay_ms: u64,

    /// How long to wait for all startup stages before probing anyway.
    pub stage_wait_window_ms: u64,
    pub stage_poll_interval_ms: u64,

    /// Pause between a successful spawn and the first connection run.
    pub connect_delay_ms: u64,
    /// Pause between a successful probe and the handoff.
    pub handoff_delay_ms: u64,
    /// Pause between stopping the old lifetime and starting the new one.
    pub restart_settle_ms: u64,
    /// Pause between an unexpected exit and host termination.
    pub exit_grace_ms: u64,
    /// How long a graceful stop may take before the process is killed.
    pub stop_timeout_ms: u64,
}

impl Default for ShellSettings {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl ShellSettings {
    /// Settings matching the packaged desktop shell.
    pub fn with_defaults() -> Self {
        Self {
            executable: PathBuf::from(DEFAULT_JAVA),
            artifact: PathBuf::from("app.jar"),
            leading_args: vec!["-jar".to_string()],
            log_path: None,
            backend_host: "127.0.0.1".to_string(),
            backend_port: DEFAULT_BACKEND_PORT,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            attempt_timeout_ms: 10_000,
            retry_delay_ms: 1_000,
            stage_wait_window_ms: 10_000,
            stage_poll_interval_ms: 200,
            connect_delay_ms: 1_000,
            handoff_delay_ms: 500,
            restart_settle_ms: 500,
            exit_grace_ms: 1_000,
            stop_timeout_ms: 5_000,
        }
    }

    /// Override fields from `DMSENDER_*` variables returned by `lookup`.
    ///
    /// Empty values are treated as unset.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), SettingsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        if let Some(v) = get(ENV_JAVA) {
            self.executable = PathBuf::from(v);
        }
        if let Some(v) = get(ENV_JAR) {
            self.artifact = PathBuf::from(v);
        }
        if let Some(v) = get(ENV_LOG_PATH) {
            self.log_path = Some(PathBuf::from(v));
        }
        if let Some(v) = get(ENV_BACKEND_HOST) {
            self.backend_host = v.trim().to_string();
        }
        if let Some(v) = get(ENV_BACKEND_PORT) {
            self.backend_port = parse_var(ENV_BACKEND_PORT, &v)?;
        }
        if let Some(v) = get(ENV_PROBE_ATTEMPTS) {
            self.max_attempts = parse_var(ENV_PROBE_ATTEMPTS, &v)?;
        }
        if let Some(v) = get(ENV_PROBE_TIMEOUT_MS) {
            self.attempt_timeout_ms = parse_var(ENV_PROBE_TIMEOUT_MS, &v)?;
        }
        if let Some(v) = get(ENV_RETRY_DELAY_MS) {
            self.retry_delay_ms = parse_var(ENV_RETRY_DELAY_MS, &v)?;
        }
        if let Some(v) = get(ENV_STAGE_WAIT_MS) {
            self.stage_wait_window_ms = parse_var(ENV_STAGE_WAIT_MS, &v)?;
        }
        if let Some(v) = get(ENV_STAGE_POLL_MS) {
            self.stage_poll_interval_ms = parse_var(ENV_STAGE_POLL_MS, &v)?;
        }
        Ok(())
    }

    pub const fn attempt_timeout(&self) -> Duration {
        Duration::from_millis(self.attempt_timeout_ms)
    }

    pub const fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub const fn stage_wait_window(&self) -> Duration {
        Duration::from_millis(self.stage_wait_window_ms)
    }

    pub const fn stage_poll_interval(&self) -> Duration {
        Duration::from_millis(self.stage_poll_interval_ms)
    }

    pub const fn connect_delay(&self) -> Duration {
        Duration::from_millis(self.connect_delay_ms)
    }

    pub const fn handoff_delay(&self) -> Duration {
        Duration::from_millis(self.handoff_delay_ms)
    }

    pub const fn restart_settle(&self) -> Duration {
        Duration::from_millis(self.restart_settle_ms)
    }

    pub const fn exit_grace(&self) -> Duration {
        Duration::from_millis(self.exit_grace_ms)
    }

    pub const fn stop_timeout(&self) -> Duration {
        Duration::from_millis(self.stop_timeout_ms)
    }
}

fn parse_var<T: std::str::FromStr>(var: &'static str, value: &str) -> Result<T, SettingsError> {
    value
        .trim()
        .parse()
        .map_err(|_| SettingsError::InvalidEnvValue {
            var,
            value: value.to_string(),
        })
}

/// Errors that can occur while loading or validating settings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsError {
    #[error("Invalid value for {var}: {value:?}")]
    InvalidEnvValue { var: &'static str, value: String },

    #[error("Backend port must be non-zero")]
    InvalidPort,

    #[error("Max attempts must be between 1 and 1000, got {0}")]
    InvalidAttempts(u32),

    #[error("{0} must be greater than zero")]
    ZeroDuration(&'static str),

    #[error("{0} cannot be empty")]
    EmptyValue(&'static str),
}

/// Validate settings values.
pub fn validate_settings(settings: &ShellSettings) -> Result<(), SettingsError> {
    if settings.executable.as_os_str().is_empty() {
        return Err(SettingsError::EmptyValue("executable"));
    }
    if settings.artifact.as_os_str().is_empty() {
        return Err(SettingsError::EmptyValue("artifact"));
    }
    if settings.backend_host.trim().is_empty() {
        return Err(SettingsError::EmptyValue("backend host"));
    }
    if settings.backend_port == 0 {
        return Err(SettingsError::InvalidPort);
    }
    if !(1..=MAX_ATTEMPTS_LIMIT).contains(&settings.max_attempts) {
        return Err(SettingsError::InvalidAttempts(settings.max_attempts));
    }
    if settings.attempt_timeout_ms == 0 {
        return Err(SettingsError::ZeroDuration("attempt timeout"));
    }
    // A zero poll interval would spin the stage wait loop.
    if settings.stage_poll_interval_ms == 0 {
        return Err(SettingsError::ZeroDuration("stage poll interval"));
    }
    if settings.stop_timeout_ms == 0 {
        return Err(SettingsError::ZeroDuration("stop timeout"));
    }
    Ok(())
}
