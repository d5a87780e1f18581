use crossbeam_channel::{unbounded, Receiver, Sender, TrySendError};
use parking_lot::RwLock;
/// Event bus for pub/sub messaging
///
/// Lets hosts observe the workflow without holding the controller.
use std::sync::Arc;

use super::events::WorkflowEvent;

/// Subscriber ID for tracking subscriptions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(usize);

struct Subscriber {
    id: SubscriberId,
    sender: Sender<WorkflowEvent>,
}

/// Event bus for broadcasting workflow events to subscribers
#[derive(Clone, Default)]
pub struct EventBus {
    subscribers: Arc<RwLock<Vec<Subscriber>>>,
    next_id: Arc<RwLock<usize>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to events, returns a receiver and subscription ID
    pub fn subscribe(&self) -> (Receiver<WorkflowEvent>, SubscriberId) {
        let (tx, rx) = unbounded();

        let mut next_id = self.next_id.write();
        let id = SubscriberId(*next_id);
        *next_id += 1;
        drop(next_id);

        self.subscribers.write().push(Subscriber { id, sender: tx });

        (rx, id)
    }

    pub fn unsubscribe(&self, id: SubscriberId) {
        self.subscribers.write().retain(|s| s.id != id);
    }

    /// Publish an event to all subscribers (never blocks)
    pub fn publish(&self, event: WorkflowEvent) {
        tracing::trace!(target: "lesion_capture::workflow", "Event: {}", event.description());

        // Subscribers whose receiver was dropped are pruned
        self.subscribers.write().retain(|s| {
            !matches!(
                s.sender.try_send(event.clone()),
                Err(TrySendError::Disconnected(_))
            )
        });
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }

    pub fn clear(&self) {
        self.subscribers.write().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_event_bus_subscribe_and_unsubscribe() {
        let bus = EventBus::new();
        let (_rx, id) = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 1);

        bus.unsubscribe(id);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn test_event_bus_multiple_subscribers() {
        let bus = EventBus::new();
        let (rx1, _id1) = bus.subscribe();
        let (rx2, _id2) = bus.subscribe();

        let session_id = Uuid::new_v4();
        bus.publish(WorkflowEvent::SessionReset { session_id });

        match rx1.try_recv().unwrap() {
            WorkflowEvent::SessionReset { session_id: id } => assert_eq!(id, session_id),
            other => panic!("Wrong event type received: {:?}", other),
        }
        assert!(rx2.try_recv().is_ok());
    }

    #[test]
    fn test_dropped_subscriber_pruned() {
        let bus = EventBus::new();
        let (rx, _id) = bus.subscribe();
        let (_kept, _id2) = bus.subscribe();
        drop(rx);

        bus.publish(WorkflowEvent::Shutdown);
        assert_eq!(bus.subscriber_count(), 1);
    }

    #[test]
    fn test_event_bus_clone_shares_subscribers() {
        let bus1 = EventBus::new();
        let bus2 = bus1.clone();

        let (rx, _id) = bus1.subscribe();
        assert_eq!(bus2.subscriber_count(), 1);

        bus2.publish(WorkflowEvent::Shutdown);
        assert!(matches!(rx.try_recv(), Ok(WorkflowEvent::Shutdown)));

        bus2.clear();
        assert_eq!(bus1.subscriber_count(), 0);
    }
}
