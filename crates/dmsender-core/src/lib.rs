//! Core domain types and ports for the dmsender desktop shell.
//!
//! This crate holds everything that describes *what* the shell supervises
//! without touching processes or sockets:
//!
//! - [`stage`] - the ordered startup stages and their log triggers
//! - [`records`] - backend log records and their on-disk rendering
//! - [`readiness`] - probe targets, probe outcomes and connection outcomes
//! - [`events`] - notifications delivered to the presentation layer
//! - [`settings`] - tunable timings and paths, with env overrides
//! - [`ports`] - trait seams implemented by `dmsender-runtime`
//!
//! Adapters (the runtime and the CLI) depend on this crate; it depends on
//! none of them.

#![deny(unsafe_code)]

pub mod error;
pub mod events;
pub mod paths;
pub mod ports;
pub mod readiness;
pub mod records;
pub mod settings;
pub mod stage;

// Re-export commonly used types for convenience
pub use error::SupervisorError;
pub use events::SupervisorEvent;
pub use paths::{PathError, backend_log_path, data_root};
pub use ports::{NoopEventSink, ReadinessProbe, StageProgress, SupervisorEventSink};
pub use readiness::{ConnectionOutcome, ConnectionReport, ProbeOutcome, ProbeTarget, RetryAttempt};
pub use records::{LogLevel, LogRecord, RecordKind, StreamKind};
pub use settings::{
    DEFAULT_BACKEND_PORT, DEFAULT_MAX_ATTEMPTS, SettingsError, ShellSettings, validate_settings,
};
pub use stage::{StageTransition, StartupStage};
