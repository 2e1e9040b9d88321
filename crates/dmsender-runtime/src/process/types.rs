//! Shared types for backend process supervision.

use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dmsender_core::ShellSettings;
use serde::Serialize;

/// Lifecycle of one backend lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum LifecycleState {
    /// No spawn has succeeded yet.
    NotStarted,
    Running,
    Exited,
}

/// Snapshot of the supervised backend process.
#[derive(Debug, Clone, Serialize)]
pub struct BackendProcess {
    pub executable: PathBuf,
    pub args: Vec<String>,
    pub state: LifecycleState,
    /// Exit code once `state` is `Exited`; `None` when killed by a signal.
    pub exit_code: Option<i32>,
    pub started_at: DateTime<Utc>,
    pub pid: Option<u32>,
    /// Monotonic lifetime counter, bumped on every successful spawn.
    pub generation: u64,
}

impl BackendProcess {
    pub fn running(
        executable: PathBuf,
        args: Vec<String>,
        pid: Option<u32>,
        generation: u64,
    ) -> Self {
        Self {
            executable,
            args,
            state: LifecycleState::Running,
            exit_code: None,
            started_at: Utc::now(),
            pid,
            generation,
        }
    }

    pub fn is_running(&self) -> bool {
        self.state == LifecycleState::Running
    }

    pub fn mark_exited(&mut self, code: Option<i32>) {
        self.state = LifecycleState::Exited;
        self.exit_code = code;
    }
}

/// Delays used by the supervisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupervisorTimings {
    /// Pause between stopping the old lifetime and spawning the new one.
    pub restart_settle: Duration,
    /// Pause between an unexpected exit and host termination.
    pub exit_grace: Duration,
    /// SIGTERM grace before the process is killed.
    pub stop_timeout: Duration,
    /// Upper bound on waiting for output readers after exit.
    pub drain_timeout: Duration,
}

impl Default for SupervisorTimings {
    fn default() -> Self {
        Self::from_settings(&ShellSettings::with_defaults())
    }
}

impl SupervisorTimings {
    pub const fn from_settings(settings: &ShellSettings) -> Self {
        Self {
            restart_settle: settings.restart_settle(),
            exit_grace: settings.exit_grace(),
            stop_timeout: settings.stop_timeout(),
            drain_timeout: Duration::from_secs(2),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mark_exited_records_code() {
        let mut process =
            BackendProcess::running(PathBuf::from("java"), vec!["-jar".into()], Some(7), 1);
        assert!(process.is_running());
        process.mark_exited(Some(1));
        assert_eq!(process.state, LifecycleState::Exited);
        assert_eq!(process.exit_code, Some(1));
        assert!(!process.is_running());
    }

    #[test]
    fn timings_follow_settings() {
        let mut settings = ShellSettings::with_defaults();
        settings.exit_grace_ms = 250;
        let timings = SupervisorTimings::from_settings(&settings);
        assert_eq!(timings.exit_grace, Duration::from_millis(250));
        assert_eq!(timings.restart_settle, Duration::from_millis(500));
    }
}
