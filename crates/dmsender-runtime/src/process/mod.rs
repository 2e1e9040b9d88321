//! Backend process management.
//!
//! # Structure
//!
//! - `LaunchSpec` - preflight checks and the spawn command line
//! - `ProcessSupervisor` - lifetime ownership, output routing, exit handling
//! - `spawn_stream_reader` - lossy line reader per output pipe
//! - `terminate_child` - SIGTERM → SIGKILL escalation

mod launch;
pub mod shutdown;
mod stream;
mod supervisor;
mod types;

pub use launch::LaunchSpec;
pub use shutdown::terminate_child;
pub use supervisor::{ProcessSupervisor, STARTED_STATUS};
pub use types::{BackendProcess, LifecycleState, SupervisorTimings};
