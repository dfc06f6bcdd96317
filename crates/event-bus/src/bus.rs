//! Synchronous in-process event bus.

use std::sync::Arc;

use crate::envelope::EventEnvelope;
use crate::events::MarketplaceEvent;
use crate::subscriber::Subscriber;

/// Delivers each published event once to every interested subscriber.
///
/// `publish` returns after all handlers have run. Subscribers are fixed at
/// build time; cloning the bus shares them.
#[derive(Clone, Default)]
pub struct EventBus {
    subscribers: Arc<Vec<Arc<dyn Subscriber>>>,
}

impl EventBus {
    pub fn builder() -> EventBusBuilder {
        EventBusBuilder::default()
    }

    /// A bus with no subscribers.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Publishes an event and returns the envelope that was delivered.
    #[tracing::instrument(skip(self, event), fields(event = event.name()))]
    pub async fn publish(&self, event: MarketplaceEvent) -> EventEnvelope {
        self.publish_envelope(EventEnvelope::new(event)).await
    }

    /// Publishes a prepared envelope, e.g. one carrying metadata.
    pub async fn publish_envelope(&self, envelope: EventEnvelope) -> EventEnvelope {
        metrics::counter!("event_bus_events_published_total", "event" => envelope.name.clone())
            .increment(1);

        for subscriber in self.subscribers.iter() {
            if !subscriber.interested_in(&envelope.name) {
                continue;
            }
            if let Err(e) = subscriber.handle(&envelope).await {
                metrics::counter!(
                    "event_bus_subscriber_failures_total",
                    "subscriber" => subscriber.name()
                )
                .increment(1);
                tracing::warn!(
                    subscriber = subscriber.name(),
                    event = %envelope.name,
                    event_id = %envelope.event_id,
                    error = %e,
                    "subscriber failed to handle event"
                );
            }
        }

        envelope
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<_> = self.subscribers.iter().map(|s| s.name()).collect();
        f.debug_struct("EventBus").field("subscribers", &names).finish()
    }
}

/// Collects subscribers before the bus is shared.
#[derive(Default)]
pub struct EventBusBuilder {
    subscribers: Vec<Arc<dyn Subscriber>>,
}

impl EventBusBuilder {
    pub fn subscribe(mut self, subscriber: Arc<dyn Subscriber>) -> Self {
        self.subscribers.push(subscriber);
        self
    }

    pub fn build(self) -> EventBus {
        EventBus {
            subscribers: Arc::new(self.subscribers),
        }
    }
}
