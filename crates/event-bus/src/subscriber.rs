//! Subscriber trait for reacting to published events.

use async_trait::async_trait;

use crate::Result;
use crate::envelope::EventEnvelope;

/// A handler registered on the [`EventBus`](crate::EventBus).
///
/// Handlers run in registration order. An error from one handler is logged
/// and counted but does not stop delivery to the rest, and is never
/// reported back to the publisher.
#[async_trait]
pub trait Subscriber: Send + Sync {
    /// Returns the name of this subscriber, used in logs.
    fn name(&self) -> &'static str;

    /// Returns whether this subscriber wants events with the given name.
    fn interested_in(&self, _event_name: &str) -> bool {
        true
    }

    /// Handles a single event.
    async fn handle(&self, event: &EventEnvelope) -> Result<()>;
}
