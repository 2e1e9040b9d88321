//! Event sink trait for supervisor notifications.

use crate::events::SupervisorEvent;

/// Trait for delivering supervisor events to a presentation layer.
///
/// # Implementations
///
/// - `NoopEventSink` - for tests and contexts without a listener
/// - `ChannelEventSink` (runtime) - tokio broadcast channel
pub trait SupervisorEventSink: Send + Sync {
    /// Deliver an event.
    ///
    /// Called from output reader tasks; must not block.
    fn emit(&self, event: SupervisorEvent);
}

/// A sink that discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopEventSink;

impl NoopEventSink {
    pub const fn new() -> Self {
        Self
    }
}

impl SupervisorEventSink for NoopEventSink {
    fn emit(&self, _event: SupervisorEvent) {}
}
