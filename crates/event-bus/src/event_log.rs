//! Subscriber that keeps every delivered event in memory.

use std::sync::Arc;

use async_trait::async_trait;
use common::OrderId;
use tokio::sync::RwLock;

use crate::Result;
use crate::envelope::EventEnvelope;
use crate::subscriber::Subscriber;

/// Records every event it receives, in delivery order.
///
/// Clones share the same log, so a test can keep one handle and register
/// another on the bus.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Arc<RwLock<Vec<EventEnvelope>>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn all(&self) -> Vec<EventEnvelope> {
        self.events.read().await.clone()
    }

    /// Event names in delivery order.
    pub async fn names(&self) -> Vec<String> {
        self.events
            .read()
            .await
            .iter()
            .map(|e| e.name.clone())
            .collect()
    }

    pub async fn for_order(&self, order_id: OrderId) -> Vec<EventEnvelope> {
        self.events
            .read()
            .await
            .iter()
            .filter(|e| e.payload.order_id() == Some(order_id))
            .cloned()
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.events.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.events.read().await.is_empty()
    }

    pub async fn clear(&self) {
        self.events.write().await.clear();
    }
}

#[async_trait]
impl Subscriber for EventLog {
    fn name(&self) -> &'static str {
        "EventLog"
    }

    async fn handle(&self, event: &EventEnvelope) -> Result<()> {
        self.events.write().await.push(event.clone());
        Ok(())
    }
}
