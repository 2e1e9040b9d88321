//! Connection orchestration: log-detected readiness, then network probing.
//!
//! A run waits (bounded) for the supervisor to report every startup stage,
//! then probes the backend port on a fixed retry schedule. Attempts are
//! strictly sequential and a run ends with exactly one outcome.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use dmsender_core::{
    ConnectionOutcome, ConnectionReport, ProbeTarget, ReadinessProbe, RetryAttempt, ShellSettings,
    StageProgress, SupervisorEvent, SupervisorEventSink,
};
use tokio::time::{Instant, sleep};
use tracing::{debug, info, warn};

pub const WAITING_STATUS: &str = "Waiting for Spring Boot application to start...";
pub const STAGE_TIMEOUT_STATUS: &str = "Trying to connect to backend service...";
pub const CONNECTING_STATUS: &str = "Connecting to backend service...";
pub const CONNECTED_STATUS: &str = "Connected";
pub const ENTERING_STATUS: &str = "Entering main page...";
pub const RETRY_STATUS: &str = "Connection failed, waiting to retry...";
pub const FAILED_STATUS: &str = "Connection failed";

/// Retry schedule and target for a connection run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrchestratorConfig {
    pub target: ProbeTarget,
    pub max_attempts: u32,
    pub attempt_timeout: Duration,
    pub retry_delay: Duration,
    pub stage_wait_window: Duration,
    pub stage_poll_interval: Duration,
    pub handoff_delay: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self::from_settings(&ShellSettings::with_defaults())
    }
}

impl OrchestratorConfig {
    pub fn from_settings(settings: &ShellSettings) -> Self {
        Self {
            target: ProbeTarget::new(settings.backend_host.clone(), settings.backend_port),
            max_attempts: settings.max_attempts,
            attempt_timeout: settings.attempt_timeout(),
            retry_delay: settings.retry_delay(),
            stage_wait_window: settings.stage_wait_window(),
            stage_poll_interval: settings.stage_poll_interval(),
            handoff_delay: settings.handoff_delay(),
        }
    }
}

/// Drives one connection run per call to [`ConnectionOrchestrator::run`].
pub struct ConnectionOrchestrator {
    probe: Arc<dyn ReadinessProbe>,
    events: Arc<dyn SupervisorEventSink>,
    config: OrchestratorConfig,
}

impl ConnectionOrchestrator {
    pub fn new(
        probe: Arc<dyn ReadinessProbe>,
        events: Arc<dyn SupervisorEventSink>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            probe,
            events,
            config,
        }
    }

    pub const fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    fn status(&self, message: impl Into<String>) {
        self.events.emit(SupervisorEvent::status(message));
    }

    /// Wait for log-detected readiness, then probe until live or exhausted.
    pub async fn run(&self, progress: &dyn StageProgress) -> ConnectionReport {
        let stages_confirmed = self.wait_for_stages(progress).await;
        debug!(stages_confirmed, "Stage wait finished");

        let config = &self.config;
        let max = config.max_attempts;
        let mut attempts = Vec::with_capacity(max as usize);

        self.status(CONNECTING_STATUS);

        for attempt in 1..=max {
            self.status(format!("Attempting to connect to backend... ({attempt}/{max})"));

            let outcome = self
                .probe
                .probe(&config.target, config.attempt_timeout)
                .await;
            attempts.push(RetryAttempt {
                attempt,
                outcome,
                at: Utc::now(),
            });

            if outcome.is_reachable() {
                info!(attempt, target = %config.target, "Backend is reachable");
                self.status(CONNECTED_STATUS);
                self.status(ENTERING_STATUS);
                sleep(config.handoff_delay).await;
                return ConnectionReport {
                    outcome: ConnectionOutcome::Live {
                        url: config.target.live_url(),
                    },
                    attempts,
                };
            }

            debug!(attempt, ?outcome, "Backend probe failed");
            if attempt < max {
                self.status(RETRY_STATUS);
                sleep(config.retry_delay).await;
            } else {
                self.status(FAILED_STATUS);
            }
        }

        warn!(attempts = max, target = %config.target, "Backend never became reachable");
        ConnectionReport {
            outcome: ConnectionOutcome::Failed,
            attempts,
        }
    }

    /// Poll stage progress until complete or the wait window closes.
    async fn wait_for_stages(&self, progress: &dyn StageProgress) -> bool {
        self.status(WAITING_STATUS);

        let deadline = Instant::now() + self.config.stage_wait_window;
        loop {
            if progress.all_stages_reached() {
                info!("All backend startup stages reached");
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                info!("Backend startup not confirmed from logs, probing anyway");
                self.status(STAGE_TIMEOUT_STATUS);
                return false;
            }
            sleep(self.config.stage_poll_interval.min(deadline - now)).await;
        }
    }
}
