//! Backend process supervisor.
//!
//! Owns at most one live backend lifetime. Each successful spawn gets a new
//! generation number; output and exits from a generation that is no longer
//! current are persisted to their own log but produce no events.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use dmsender_core::{
    LogRecord, StageProgress, StartupStage, StreamKind, SupervisorError, SupervisorEvent,
    SupervisorEventSink,
};
use tokio::process::Child;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::launch::LaunchSpec;
use super::shutdown::terminate_child;
use super::stream::spawn_stream_reader;
use super::types::{BackendProcess, LifecycleState, SupervisorTimings};
use crate::detector::{SUCCESS_BANNER_STATUS, StageDetector};
use crate::log_sink::BackendLogFile;

/// Status emitted after a successful spawn.
pub const STARTED_STATUS: &str = "Backend process started...";

/// One spawned backend and the handles scoped to it.
struct Lifetime {
    generation: u64,
    info: BackendProcess,
    /// Cancelled to request a graceful stop.
    stop: CancellationToken,
    /// Finishes once the child has been reaped and its exit recorded.
    exit_waiter: JoinHandle<()>,
}

/// Detector plus the generation it is tracking, guarded together so the
/// staleness check and classification are one critical section.
struct StageTracker {
    generation: Option<u64>,
    detector: StageDetector,
}

struct Shared {
    spec: LaunchSpec,
    timings: SupervisorTimings,
    events: Arc<dyn SupervisorEventSink>,
    current: Mutex<Option<Lifetime>>,
    tracker: Mutex<StageTracker>,
    next_generation: AtomicU64,
    termination: CancellationToken,
}

/// Spawns, observes and stops the backend process.
#[derive(Clone)]
pub struct ProcessSupervisor {
    shared: Arc<Shared>,
}

impl ProcessSupervisor {
    pub fn new(
        spec: LaunchSpec,
        timings: SupervisorTimings,
        events: Arc<dyn SupervisorEventSink>,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                spec,
                timings,
                events,
                current: Mutex::new(None),
                tracker: Mutex::new(StageTracker {
                    generation: None,
                    detector: StageDetector::new(),
                }),
                next_generation: AtomicU64::new(0),
                termination: CancellationToken::new(),
            }),
        }
    }

    pub fn spec(&self) -> &LaunchSpec {
        &self.shared.spec
    }

    /// Start the backend. Returns `false` on any failure, including missing
    /// files and an already running process.
    pub fn start(&self) -> bool {
        match self.try_start() {
            Ok(_) => true,
            Err(e) => {
                warn!(error = %e, "Backend start failed");
                false
            }
        }
    }

    /// Start the backend, returning the new lifetime's generation.
    ///
    /// Must be called from within a tokio runtime.
    pub fn try_start(&self) -> Result<u64, SupervisorError> {
        let shared = &self.shared;
        let mut current = shared.lock_current();

        if let Some(lifetime) = current.as_ref()
            && lifetime.info.is_running()
        {
            return Err(SupervisorError::AlreadyRunning {
                pid: lifetime.info.pid,
            });
        }

        // No side effects before this passes.
        shared.spec.preflight()?;

        let log = BackendLogFile::open(&shared.spec.log_path).map_err(|source| {
            SupervisorError::LogSink {
                path: shared.spec.log_path.clone(),
                source,
            }
        })?;
        let log = Arc::new(log);

        let mut child = match shared.spec.build_command().and_then(|mut cmd| {
            cmd.spawn().map_err(SupervisorError::Spawn)
        }) {
            Ok(child) => child,
            Err(e) => {
                log.close();
                return Err(e);
            }
        };

        let generation = shared.next_generation.fetch_add(1, Ordering::SeqCst) + 1;
        {
            let mut tracker = shared.lock_tracker();
            tracker.generation = Some(generation);
            tracker.detector.reset();
        }

        // Announce before any output can be routed.
        shared.events.emit(SupervisorEvent::status(STARTED_STATUS));
        let readers = Self::spawn_readers(shared, &mut child, generation, &log);
        let stop = CancellationToken::new();
        let pid = child.id();

        let exit_waiter = tokio::spawn(wait_for_exit(
            Arc::clone(shared),
            generation,
            child,
            Arc::clone(&log),
            readers,
            stop.clone(),
        ));

        let args = shared
            .spec
            .args()
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        *current = Some(Lifetime {
            generation,
            info: BackendProcess::running(shared.spec.executable.clone(), args, pid, generation),
            stop,
            exit_waiter,
        });
        drop(current);

        info!(
            generation,
            pid = ?pid,
            executable = %shared.spec.executable.display(),
            log = %log.path().display(),
            "Backend process started"
        );
        Ok(generation)
    }

    fn spawn_readers(
        shared: &Arc<Shared>,
        child: &mut Child,
        generation: u64,
        log: &Arc<BackendLogFile>,
    ) -> Vec<JoinHandle<()>> {
        let mut readers = Vec::with_capacity(2);

        if let Some(stdout) = child.stdout.take() {
            let shared = Arc::clone(shared);
            let log = Arc::clone(log);
            readers.push(spawn_stream_reader(
                stdout,
                generation,
                StreamKind::Stdout,
                move |kind, line| shared.on_output(generation, &log, kind, line),
            ));
        }

        if let Some(stderr) = child.stderr.take() {
            let shared = Arc::clone(shared);
            let log = Arc::clone(log);
            readers.push(spawn_stream_reader(
                stderr,
                generation,
                StreamKind::Stderr,
                move |kind, line| shared.on_output(generation, &log, kind, line),
            ));
        }

        readers
    }

    /// Request graceful termination of the running backend. Never blocks.
    ///
    /// An exit caused by `stop` does not trigger host termination.
    pub fn stop(&self) -> bool {
        let current = self.shared.lock_current();
        match current.as_ref() {
            Some(lifetime) if lifetime.info.is_running() => {
                info!(generation = lifetime.generation, "Stopping backend process");
                lifetime.stop.cancel();
                true
            }
            _ => false,
        }
    }

    /// Stop the current lifetime, wait for it to be reaped, then wait the
    /// settle delay and start a new one.
    ///
    /// The wait is bounded by `stop_timeout`, after which the old child is
    /// killed.
    pub async fn restart(&self) -> bool {
        let shared = &self.shared;

        // Detach first so the old lifetime's late output and exit are stale.
        {
            let mut tracker = shared.lock_tracker();
            tracker.generation = None;
            tracker.detector.reset();
        }
        let detached = shared.lock_current().take();
        if let Some(lifetime) = detached {
            info!(generation = lifetime.generation, "Restarting backend process");
            lifetime.stop.cancel();
            // The old backend still holds its port until it is gone.
            if let Err(e) = lifetime.exit_waiter.await {
                warn!(generation = lifetime.generation, error = %e, "Exit waiter of replaced backend failed");
            }
        }

        tokio::time::sleep(shared.timings.restart_settle).await;

        if self.start() {
            shared.events.emit(SupervisorEvent::ProcessRestarted);
            true
        } else {
            false
        }
    }

    /// Snapshot of the current lifetime, if any.
    pub fn process_info(&self) -> Option<BackendProcess> {
        self.shared
            .lock_current()
            .as_ref()
            .map(|lifetime| lifetime.info.clone())
    }

    /// Lifecycle state of the current lifetime; `NotStarted` before the
    /// first successful spawn.
    pub fn state(&self) -> LifecycleState {
        self.shared
            .lock_current()
            .as_ref()
            .map_or(LifecycleState::NotStarted, |lifetime| lifetime.info.state)
    }

        pub fn is_running(&self) -> bool {
        self.shared
            .lock_current()
            .as_ref()
            .is_some_and(|lifetime| lifetime.info.is_running())
    }

    /// Generation of the lifetime whose output is currently observed.
    pub fn generation(&self) -> Option<u64> {
        self.shared.lock_tracker().generation
    }

    pub fn current_stage(&self) -> StartupStage {
        self.shared.lock_tracker().detector.current()
    }

    /// Cancelled once an unexpected exit's grace delay has elapsed.
    pub fn termination(&self) -> CancellationToken {
        self.shared.termination.clone()
    }
}

impl StageProgress for ProcessSupervisor {
    fn all_stages_reached(&self) -> bool {
        let tracker = self.shared.lock_tracker();
        tracker.generation.is_some() && tracker.detector.all_reached()
    }
}

impl Shared {
    fn lock_current(&self) -> MutexGuard<'_, Option<Lifetime>> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_tracker(&self) -> MutexGuard<'_, StageTracker> {
        self.tracker.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Persist a line, then derive events if its lifetime is still current.
    fn on_output(&self, generation: u64, log: &BackendLogFile, kind: StreamKind, line: String) {
        let record = LogRecord::output(kind, line);
        if let Err(e) = log.append(&record) {
            debug!(generation, error = %e, "Failed to persist backend output");
        }
        let line = record.text;

        let mut tracker = self.lock_tracker();
        if tracker.generation != Some(generation) {
            return;
        }

        let transition = tracker.detector.classify(&line);
        let warning = StageDetector::is_warning(&line);
        let banner = StageDetector::is_success_banner(&line);

        // Events go out under the tracker lock so a concurrent restart
        // cannot interleave with them.
        if warning {
            self.events.emit(SupervisorEvent::Warning { line: line.clone() });
        }
        self.events.emit(match kind {
            StreamKind::Stdout => SupervisorEvent::RawLog { line },
            StreamKind::Stderr => SupervisorEvent::RawError { line },
        });
        if let Some(transition) = transition {
            info!(generation, stage = ?transition.stage, "Backend startup stage reached");
            self.events
                .emit(SupervisorEvent::status(transition.description()));
        }
        if banner {
            self.events.emit(SupervisorEvent::status(SUCCESS_BANNER_STATUS));
        }
    }

    fn on_exit(&self, generation: u64, log: &BackendLogFile, code: Option<i32>, requested: bool) {
        if let Err(e) = log.append(&LogRecord::exit(code)) {
            debug!(generation, error = %e, "Failed to persist exit record");
        }
        log.close();

        let is_current = {
            let mut current = self.lock_current();
            match current.as_mut() {
                Some(lifetime) if lifetime.generation == generation => {
                    lifetime.info.mark_exited(code);
                    true
                }
                _ => false,
            }
        };
        if !is_current {
            debug!(generation, ?code, "Discarding exit of superseded backend lifetime");
            return;
        }

        self.events.emit(SupervisorEvent::ProcessExited { code });

        if requested {
            info!(generation, ?code, "Backend process stopped");
            return;
        }

        warn!(
            generation,
            ?code,
            grace_ms = self.timings.exit_grace.as_millis(),
            "Backend process exited unexpectedly, terminating host"
        );
        let termination = self.termination.clone();
        let grace = self.timings.exit_grace;
        tokio::spawn(async move {
            tokio::time::sleep(grace).await;
            termination.cancel();
        });
    }
}

/// Wait for the child (or a stop request), drain the readers, then report.
async fn wait_for_exit(
    shared: Arc<Shared>,
    generation: u64,
    mut child: Child,
    log: Arc<BackendLogFile>,
    readers: Vec<JoinHandle<()>>,
    stop: CancellationToken,
) {
    let status = tokio::select! {
        status = child.wait() => status,
        () = stop.cancelled() => terminate_child(&mut child, shared.timings.stop_timeout).await,
    };
    let requested = stop.is_cancelled();

    let code = match status {
        Ok(status) => status.code(),
        Err(e) => {
            warn!(generation, error = %e, "Failed to wait for backend process");
            None
        }
    };

    // [EXIT] must be the last record of the lifetime.
    for reader in readers {
        if tokio::time::timeout(shared.timings.drain_timeout, reader)
            .await
            .is_err()
        {
            debug!(generation, "Backend output reader did not finish before exit was recorded");
        }
    }

    shared.on_exit(generation, &log, code, requested);
}
