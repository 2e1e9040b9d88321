//! Application session: one supervisor, one orchestrator, one event sink.
//!
//! Hosts hold an `AppSession` instead of wiring the supervisor and the
//! orchestrator by hand.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use dmsender_core::{
    ConnectionOutcome, ReadinessProbe, ShellSettings, SupervisorEvent, SupervisorEventSink,
};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::orchestrator::{ConnectionOrchestrator, OrchestratorConfig};
use crate::process::{LaunchSpec, ProcessSupervisor, SupervisorTimings};

pub const INITIALIZED_STATUS: &str = "Application initialized...";

const SHUTDOWN_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// How a launch or restart ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SessionOutcome {
    /// The backend is reachable at `url`.
    Live { url: String },
    /// The backend could not be spawned (missing files, spawn error).
    StartFailed,
    /// Spawned, but never became reachable.
    Failed,
    /// A restart replaced the lifetime this run was connecting to.
    Superseded,
}

pub struct AppSession {
    supervisor: ProcessSupervisor,
    orchestrator: ConnectionOrchestrator,
    events: Arc<dyn SupervisorEventSink>,
    connect_delay: Duration,
}

impl AppSession {
    pub fn new(
        supervisor: ProcessSupervisor,
        orchestrator: ConnectionOrchestrator,
        events: Arc<dyn SupervisorEventSink>,
        connect_delay: Duration,
    ) -> Self {
        Self {
            supervisor,
            orchestrator,
            events,
            connect_delay,
        }
    }

    /// Wire a session from settings and a resolved backend log path.
    pub fn from_settings(
        settings: &ShellSettings,
        log_path: impl Into<PathBuf>,
        probe: Arc<dyn ReadinessProbe>,
        events: Arc<dyn SupervisorEventSink>,
    ) -> Self {
        let spec = LaunchSpec::from_settings(settings, log_path);
        let supervisor = ProcessSupervisor::new(
            spec,
            SupervisorTimings::from_settings(settings),
            Arc::clone(&events),
        );
        let orchestrator = ConnectionOrchestrator::new(
            probe,
            Arc::clone(&events),
            OrchestratorConfig::from_settings(settings),
        );
        Self::new(supervisor, orchestrator, events, settings.connect_delay())
    }

    pub const fn supervisor(&self) -> &ProcessSupervisor {
        &self.supervisor
    }

    /// Start the backend and connect to it.
    pub async fn launch(&self) -> SessionOutcome {
        self.events.emit(SupervisorEvent::status(INITIALIZED_STATUS));

        let generation = match self.supervisor.try_start() {
            Ok(generation) => generation,
            Err(e) => {
                warn!(error = %e, "Backend failed to start");
                return SessionOutcome::StartFailed;
            }
        };
        self.connect(generation).await
    }

    /// Restart the backend and connect to the new lifetime.
    pub async fn restart(&self) -> SessionOutcome {
        if !self.supervisor.restart().await {
            return SessionOutcome::StartFailed;
        }
        match self.supervisor.generation() {
            Some(generation) => self.connect(generation).await,
            None => SessionOutcome::Superseded,
        }
    }

    async fn connect(&self, generation: u64) -> SessionOutcome {
        tokio::time::sleep(self.connect_delay).await;
        let report = self.orchestrator.run(&self.supervisor).await;

        if self.supervisor.generation() != Some(generation) {
            debug!(generation, "Discarding connection outcome of superseded lifetime");
            return SessionOutcome::Superseded;
        }

        match report.outcome {
            ConnectionOutcome::Live { url } => {
                info!(generation, %url, attempts = report.attempts.len(), "Backend is live");
                SessionOutcome::Live { url }
            }
            ConnectionOutcome::Failed => SessionOutcome::Failed,
        }
    }

    /// Request a graceful stop. Does not trigger host termination.
    pub fn shutdown(&self) -> bool {
        self.supervisor.stop()
    }

    /// Stop the backend and wait (bounded) until its exit has been recorded.
    pub async fn shutdown_and_wait(&self, limit: Duration) -> bool {
        if !self.shutdown() {
            return !self.supervisor.is_running();
        }
        let waited = tokio::time::timeout(limit, async {
            while self.supervisor.is_running() {
                tokio::time::sleep(SHUTDOWN_POLL_INTERVAL).await;
            }
        })
        .await;
        waited.is_ok()
    }

    /// Cancelled when the backend dies unexpectedly and the grace delay ends.
    pub fn termination(&self) -> CancellationToken {
        self.supervisor.termination()
    }
}
