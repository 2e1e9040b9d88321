//! Port definitions (trait abstractions) for external systems.
//!
//! Ports keep the orchestration logic independent of how events are
//! delivered, how the network is probed and where stage progress lives.
//! Implementations live in `dmsender-runtime`.

mod event_sink;
mod readiness_probe;
mod stage_progress;

pub use event_sink::{NoopEventSink, SupervisorEventSink};
pub use readiness_probe::ReadinessProbe;
pub use stage_progress::StageProgress;
