//! Event bus for broadcasting diagnostic events.

use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, trace, warn};

use allowguard_core::message::GuardEventType;

use crate::event::GuardEvent;

/// Default channel capacity for the event bus.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// Broadcasts [`GuardEvent`]s to every subscriber.
///
/// Publishing never blocks and never fails: with no subscribers the event is
/// dropped, and a slow subscriber loses the oldest events instead of holding
/// up the publisher.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<Arc<GuardEvent>>,
    capacity: usize,
}

impl EventBus {
    /// Create a new event bus with default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Create a new event bus with specified capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender, capacity }
    }

    /// Publish an event.
    ///
    /// Returns the number of receivers that got it.
    pub fn publish(&self, event: GuardEvent) -> usize {
        let event = Arc::new(event);
        if let Ok(count) = self.sender.send(Arc::clone(&event)) {
            debug!(
                event_type = %event.event_type,
                receiver_count = count,
                "Event published"
            );
            count
        } else {
            trace!(event_type = %event.event_type, "No receivers for event");
            0
        }
    }

    /// Subscribe to every event.
    #[must_use]
    pub fn subscribe(&self) -> EventReceiver {
        EventReceiver::new(self.sender.subscribe(), None)
    }

    /// Subscribe to events of one kind only.
    #[must_use]
    pub fn subscribe_kind(&self, event_type: GuardEventType) -> EventReceiver {
        EventReceiver::new(self.sender.subscribe(), Some(event_type))
    }

    /// Number of live receivers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Get the channel capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiver for events from the event bus.
pub struct EventReceiver {
    receiver: broadcast::Receiver<Arc<GuardEvent>>,
    filter: Option<GuardEventType>,
}

impl EventReceiver {
    fn new(receiver: broadcast::Receiver<Arc<GuardEvent>>, filter: Option<GuardEventType>) -> Self {
        Self { receiver, filter }
    }

    fn matches(&self, event: &GuardEvent) -> bool {
        self.filter.is_none_or(|kind| kind == event.event_type)
    }

    /// Receive the next matching event.
    ///
    /// Lagging skips the lost events with a warning. Returns `None` once
    /// every sender is gone.
    pub async fn recv(&mut self) -> Option<Arc<GuardEvent>> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => {
                    if self.matches(&event) {
                        return Some(event);
                    }
                },
                Err(broadcast::error::RecvError::Lagged(count)) => {
                    warn!(skipped = count, "Event receiver lagged, events dropped");
                },
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Receive the next matching event without waiting.
    pub fn try_recv(&mut self) -> Option<Arc<GuardEvent>> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    if self.matches(&event) {
                        return Some(event);
                    }
                },
                Err(broadcast::error::TryRecvError::Lagged(count)) => {
                    warn!(skipped = count, "Event receiver lagged, events dropped");
                },
                Err(
                    broadcast::error::TryRecvError::Empty | broadcast::error::TryRecvError::Closed,
                ) => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event(kind: GuardEventType) -> GuardEvent {
        GuardEvent::new("test", kind, json!({}))
    }

    #[tokio::test]
    async fn test_publish_and_receive() {
        let bus = EventBus::new();
        let mut receiver = bus.subscribe();

        assert_eq!(bus.publish(event(GuardEventType::WarningDisplayed)), 1);

        let got = receiver.recv().await.unwrap();
        assert_eq!(got.event_type, GuardEventType::WarningDisplayed);
    }

    #[tokio::test]
    async fn test_no_subscribers_is_not_an_error() {
        let bus = EventBus::new();
        assert_eq!(bus.publish(event(GuardEventType::UserDecision)), 0);
    }

    #[tokio::test]
    async fn test_kind_filter() {
        let bus = EventBus::new();
        let mut decisions = bus.subscribe_kind(GuardEventType::UserDecision);

        bus.publish(event(GuardEventType::WarningDisplayed));
        bus.publish(event(GuardEventType::UserDecision));

        let got = decisions.recv().await.unwrap();
        assert_eq!(got.event_type, GuardEventType::UserDecision);
        assert!(decisions.try_recv().is_none());
    }

    #[tokio::test]
    async fn test_lagged_receiver_keeps_newest() {
        let bus = EventBus::with_capacity(2);
        let mut receiver = bus.subscribe();
        for _ in 0..5 {
            bus.publish(event(GuardEventType::WarningDisplayed));
        }
        bus.publish(event(GuardEventType::UserDecision));

        let mut last = None;
        while let Some(e) = receiver.try_recv() {
            last = Some(e.event_type);
        }
        assert_eq!(last, Some(GuardEventType::UserDecision));
    }

    #[tokio::test]
    async fn test_recv_returns_none_when_closed() {
        let bus = EventBus::new();
        let mut receiver = bus.subscribe();
        drop(bus);
        assert!(receiver.recv().await.is_none());
    }
}
