//! Broadcast channel for domain events.
//!
//! [`EventBus`] wraps a [`tokio::sync::broadcast`] channel. Every committed
//! waitlist mutation publishes a [`WaitlistEvent`] through the bus; WebSocket
//! connections and downstream notifiers subscribe to it. Publishing is
//! fire-and-forget: the core never waits on delivery.

use tokio::sync::broadcast;

use super::WaitlistEvent;

/// Broadcast bus for [`WaitlistEvent`]s.
///
/// Backed by a `tokio::broadcast` channel with a configurable capacity
/// (default 10 000). When the ring buffer is full, the oldest events are
/// dropped for lagging receivers.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<WaitlistEvent>,
}

impl EventBus {
    /// Creates a new `EventBus` with the given channel capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publishes a committed event, returning how many receivers got it.
    /// With no receivers the event is dropped.
    pub fn publish(&self, event: WaitlistEvent) -> usize {
        let event_id = event.event_id();
        let event_type = event.event_type_str();
        let delivered = self.sender.send(event).unwrap_or(0);
        tracing::trace!(%event_id, event_type, delivered, "waitlist event published");
        delivered
    }

    /// Publishes the events of one commit in order. Returns the number of
    /// receivers that got the last one.
    pub fn publish_all(&self, events: impl IntoIterator<Item = WaitlistEvent>) -> usize {
        events
            .into_iter()
            .fold(0, |_, event| self.publish(event))
    }

    /// Creates a new receiver that will receive all future events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<WaitlistEvent> {
        self.sender.subscribe()
    }

    /// Returns the current number of active receivers.
    #[must_use]
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::{EventId, UserId};
    use chrono::Utc;

    fn make_event(event_id: EventId) -> WaitlistEvent {
        WaitlistEvent::EntrantJoined {
            event_id,
            user_id: UserId::new(1),
            entry_count: 1,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn publish_without_receivers_returns_zero() {
        let bus = EventBus::new(100);
        assert_eq!(bus.publish(make_event(EventId::new(1))), 0);
        assert_eq!(bus.publish_all(Vec::new()), 0);
    }

    #[tokio::test]
    async fn subscriber_receives_event() {
        let bus = EventBus::new(100);
        let mut rx = bus.subscribe();

        bus.publish(make_event(EventId::new(7)));

        let Ok(event) = rx.recv().await else {
            panic!("expected to receive event");
        };
        assert_eq!(event.event_id(), EventId::new(7));
    }

    #[tokio::test]
    async fn publish_all_preserves_order() {
        let bus = EventBus::new(100);
        let mut rx = bus.subscribe();

        let delivered =
            bus.publish_all([make_event(EventId::new(1)), make_event(EventId::new(2))]);
        assert_eq!(delivered, 1);

        let Ok(first) = rx.recv().await else {
            panic!("first event missing");
        };
        let Ok(second) = rx.recv().await else {
            panic!("second event missing");
        };
        assert_eq!(first.event_id(), EventId::new(1));
        assert_eq!(second.event_id(), EventId::new(2));
    }

    #[test]
    fn receiver_count_tracks_subscribers() {
        let bus = EventBus::new(100);
        assert_eq!(bus.receiver_count(), 0);

        let rx1 = bus.subscribe();
        assert_eq!(bus.receiver_count(), 1);

        let _rx2 = bus.subscribe();
        assert_eq!(bus.receiver_count(), 2);

        drop(rx1);
        assert_eq!(bus.receiver_count(), 1);
    }
}
