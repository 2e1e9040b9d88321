//! Read-only view of startup stage progress.

/// Lets the orchestrator ask whether log-based detection has finished
/// without holding a reference to the supervisor internals.
pub trait StageProgress: Send + Sync {
    /// True once every detectable stage has been reached in the current
    /// lifetime.
    fn all_stages_reached(&self) -> bool;
}
