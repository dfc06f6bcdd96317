//! Subscriber that writes each event to the tracing log.

use async_trait::async_trait;

use crate::Result;
use crate::envelope::EventEnvelope;
use crate::subscriber::Subscriber;

/// Logs every event at info level.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingSubscriber;

#[async_trait]
impl Subscriber for LoggingSubscriber {
    fn name(&self) -> &'static str {
        "LoggingSubscriber"
    }

    async fn handle(&self, event: &EventEnvelope) -> Result<()> {
        match event.payload.order_id() {
            Some(order_id) => tracing::info!(
                event = %event.name,
                event_id = %event.event_id,
                %order_id,
                "event published"
            ),
            None => tracing::info!(
                event = %event.name,
                event_id = %event.event_id,
                "event published"
            ),
        }
        Ok(())
    }
}
