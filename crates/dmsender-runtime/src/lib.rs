//! Process runtime and OS-level concerns for the dmsender shell.
//!
//! This crate implements the ports defined in `dmsender-core`:
//!
//! - [`ProcessSupervisor`] spawns the backend, pipes its output through the
//!   [`StageDetector`] and into the [`BackendLogFile`], and reports exits.
//! - [`TcpReadinessProbe`] checks whether the backend port accepts
//!   connections.
//! - [`ConnectionOrchestrator`] waits for log-detected readiness, then probes
//!   on a bounded retry schedule.
//! - [`AppSession`] ties the pieces together for a host application.

#![deny(unsafe_code)]

pub mod broadcaster;
pub mod detector;
pub mod log_sink;
pub mod orchestrator;
pub mod probe;
pub mod process;
pub mod session;

pub use broadcaster::ChannelEventSink;
pub use detector::StageDetector;
pub use log_sink::{BackendLogFile, LogSinkError};
pub use orchestrator::{ConnectionOrchestrator, OrchestratorConfig};
pub use probe::TcpReadinessProbe;
pub use process::{
    BackendProcess, LaunchSpec, LifecycleState, ProcessSupervisor, SupervisorTimings,
};
pub use session::{AppSession, SessionOutcome};
