//! Broadcast-channel event sink.
//!
//! The presentation layer subscribes to receive supervisor events. Events
//! sent while nobody is subscribed are dropped.

use dmsender_core::{SupervisorEvent, SupervisorEventSink};
use tokio::sync::broadcast;
use tracing::debug;

/// Broadcast channel capacity for supervisor events.
const CHANNEL_CAPACITY: usize = 256;

/// [`SupervisorEventSink`] backed by a tokio broadcast channel.
#[derive(Debug, Clone)]
pub struct ChannelEventSink {
    sender: broadcast::Sender<SupervisorEvent>,
}

impl ChannelEventSink {
    pub fn new() -> Self {
        Self::with_capacity(CHANNEL_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to supervisor events
    pub fn subscribe(&self) -> broadcast::Receiver<SupervisorEvent> {
        self.sender.subscribe()
    }

    /// Get number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for ChannelEventSink {
    fn default() -> Self {
        Self::new()
    }
}

impl SupervisorEventSink for ChannelEventSink {
    fn emit(&self, event: SupervisorEvent) {
        // Only log if there are receivers (raw log lines would spam otherwise)
        if self.sender.receiver_count() > 0 {
            debug!(event = event.event_name(), "Broadcasting supervisor event");
            let _ = self.sender.send(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribers_receive_in_order() {
        let sink = ChannelEventSink::new();
        let mut rx = sink.subscribe();
        assert_eq!(sink.subscriber_count(), 1);

        sink.emit(SupervisorEvent::status("one"));
        sink.emit(SupervisorEvent::ProcessRestarted);

        assert_eq!(rx.recv().await.unwrap(), SupervisorEvent::status("one"));
        assert_eq!(rx.recv().await.unwrap(), SupervisorEvent::ProcessRestarted);
    }

    #[test]
    fn emit_without_subscribers_is_silent() {
        let sink = ChannelEventSink::new();
        sink.emit(SupervisorEvent::status("nobody listening"));
        assert_eq!(sink.subscriber_count(), 0);
    }
}
