//! Event Bus implementation.
//!
//! Provides the core EventBus struct. Each session owns its bus and hands
//! an `Arc` of it to the workers that publish.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::{mpsc, Arc};
use tokio::sync::broadcast;
use uuid::Uuid;

use super::events::{AppEvent, EventCategory};

/// Subscription handle for unsubscribing from events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(Uuid);

impl SubscriptionId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Sub({})", &self.0.to_string()[..8])
    }
}

/// Filter to receive only specific event types
#[derive(Debug, Clone, Default)]
pub enum EventFilter {
    /// Receive all events.
    #[default]
    All,
    /// Receive events matching any of these categories.
    Categories(Vec<EventCategory>),
}

impl EventFilter {
    /// Check if an event matches this filter
    pub fn matches(&self, event: &AppEvent) -> bool {
        match self {
            EventFilter::All => true,
            EventFilter::Categories(categories) => categories.contains(&event.category()),
        }
    }
}

type EventHandler = Box<dyn Fn(AppEvent) + Send + Sync>;

/// Events buffered for each async receiver before it starts lagging.
pub const CHANNEL_CAPACITY: usize = 256;

/// Error types for event bus operations
#[derive(Debug, Clone, thiserror::Error)]
pub enum EventBusError {
    /// No subscribers are listening
    #[error("No active subscribers")]
    NoSubscribers,
}

/// Central event bus for application-wide event distribution
///
/// Synchronous handlers run on the publishing thread, which for compute
/// and playback events is a worker thread. Handlers must return quickly;
/// the usual pattern is forwarding into a channel owned by the session.
pub struct EventBus {
    sender: broadcast::Sender<AppEvent>,
    handlers: Arc<RwLock<HashMap<SubscriptionId, (EventFilter, EventHandler)>>>,
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            sender,
            handlers: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Publish an event to all subscribers
    ///
    /// Returns the number of handlers and receivers reached, or
    /// `NoSubscribers` if nobody is listening. Callers that only notify
    /// usually ignore that error.
    pub fn publish(&self, event: AppEvent) -> Result<usize, EventBusError> {
        tracing::trace!("publish: {}", event.description());

        let mut delivered = 0;
        {
            let handlers = self.handlers.read();
            for (filter, handler) in handlers.values() {
                if filter.matches(&event) {
                    handler(event.clone());
                    delivered += 1;
                }
            }
        }

        if let Ok(count) = self.sender.send(event) {
            delivered += count;
        }

        if delivered == 0 && self.subscriber_count() == 0 && self.sender.receiver_count() == 0 {
            Err(EventBusError::NoSubscribers)
        } else {
            Ok(delivered)
        }
    }

    /// Subscribe to events with a synchronous handler
    pub fn subscribe<F>(&self, filter: EventFilter, handler: F) -> SubscriptionId
    where
        F: Fn(AppEvent) + Send + Sync + 'static,
    {
        let id = SubscriptionId::new();
        self.handlers.write().insert(id, (filter, Box::new(handler)));
        tracing::debug!("Subscription {} added", id);
        id
    }

    /// Subscribe and forward matching events into a standard channel.
    ///
    /// Convenient for a session loop that drains notifications with
    /// `recv_timeout` or `try_recv`.
    pub fn subscribe_channel(&self, filter: EventFilter) -> (SubscriptionId, mpsc::Receiver<AppEvent>) {
        let (tx, rx) = mpsc::channel();
        let tx = parking_lot::Mutex::new(tx);
        let id = self.subscribe(filter, move |event| {
            let _ = tx.lock().send(event);
        });
        (id, rx)
    }

    /// Get a receiver for async polling from a tokio task
    pub fn receiver(&self) -> broadcast::Receiver<AppEvent> {
        self.sender.subscribe()
    }

    /// Unsubscribe from events
    ///
    /// Returns true if the subscription was found and removed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let removed = self.handlers.write().remove(&id).is_some();
        if removed {
            tracing::debug!("Subscription {} removed", id);
        }
        removed
    }

    /// Get the number of active handler subscriptions
    pub fn subscriber_count(&self) -> usize {
        self.handlers.read().len()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscriber_count())
            .field("receivers", &self.sender.receiver_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event_bus::events::{ComputeEvent, PreviewEvent, SimulationEvent};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[test]
    fn test_subscribe_and_unsubscribe() {
        let bus = EventBus::new();
        assert_eq!(bus.subscriber_count(), 0);

        let id = bus.subscribe(EventFilter::All, |_| {});
        assert_eq!(bus.subscriber_count(), 1);

        assert!(bus.unsubscribe(id));
        assert_eq!(bus.subscriber_count(), 0);
        assert!(!bus.unsubscribe(id));
    }

    #[test]
    fn test_publish_without_subscribers() {
        let bus = EventBus::new();
        let result = bus.publish(AppEvent::Preview(PreviewEvent::Invalidated));
        assert!(matches!(result, Err(EventBusError::NoSubscribers)));
    }

    #[test]
    fn test_event_filtering() {
        let bus = EventBus::new();
        let compute_count = Arc::new(AtomicUsize::new(0));
        let preview_count = Arc::new(AtomicUsize::new(0));

        let cc = compute_count.clone();
        bus.subscribe(
            EventFilter::Categories(vec![EventCategory::Compute]),
            move |_| {
                cc.fetch_add(1, Ordering::SeqCst);
            },
        );
        let pc = preview_count.clone();
        bus.subscribe(
            EventFilter::Categories(vec![EventCategory::Preview]),
            move |_| {
                pc.fetch_add(1, Ordering::SeqCst);
            },
        );

        bus.publish(AppEvent::Compute(ComputeEvent::Started { generation: 1 }))
            .ok();
        bus.publish(AppEvent::Preview(PreviewEvent::Invalidated)).ok();
        bus.publish(AppEvent::Preview(PreviewEvent::Invalidated)).ok();

        assert_eq!(compute_count.load(Ordering::SeqCst), 1);
        assert_eq!(preview_count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_subscribe_channel() {
        let bus = EventBus::new();
        let (_id, rx) = bus.subscribe_channel(EventFilter::Categories(vec![
            EventCategory::Simulation,
        ]));

        bus.publish(AppEvent::Compute(ComputeEvent::Started { generation: 1 }))
            .ok();
        bus.publish(AppEvent::Simulation(SimulationEvent::Stopped { step: 4 }))
            .ok();

        let received = rx.recv_timeout(Duration::from_secs(1)).unwrap();
        assert_eq!(
            received,
            AppEvent::Simulation(SimulationEvent::Stopped { step: 4 })
        );
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_async_receiver() {
        let bus = EventBus::new();
        let mut receiver = bus.receiver();

        bus.publish(AppEvent::Compute(ComputeEvent::Superseded { generation: 7 }))
            .ok();

        match receiver.try_recv() {
            Ok(AppEvent::Compute(ComputeEvent::Superseded { generation })) => {
                assert_eq!(generation, 7)
            }
            other => panic!("Wrong event received: {:?}", other),
        }
    }
}
