//! Envelope wrapping an event with delivery metadata.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::events::MarketplaceEvent;

/// Unique identifier for a published event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(Uuid);

impl EventId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An event as delivered to subscribers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub event_id: EventId,
    /// Dotted event name, e.g. `order.placed`.
    pub name: String,
    pub timestamp: DateTime<Utc>,
    pub payload: MarketplaceEvent,
    /// Free-form metadata such as the acting account.
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl EventEnvelope {
    pub fn new(payload: MarketplaceEvent) -> Self {
        Self {
            event_id: EventId::new(),
            name: payload.name().to_string(),
            timestamp: Utc::now(),
            payload,
            metadata: HashMap::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn payload_json(&self) -> crate::Result<serde_json::Value> {
        Ok(serde_json::to_value(&self.payload)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::CourierSuspensionData;
    use common::CourierId;

    #[test]
    fn test_envelope_takes_name_from_payload() {
        let envelope = EventEnvelope::new(MarketplaceEvent::CourierUnsuspended(
            CourierSuspensionData {
                courier_id: CourierId::new(),
                suspended_by: None,
                reason: None,
            },
        ))
        .with_metadata("actor", "admin");

        assert_eq!(envelope.name, "courier.unsuspended");
        assert_eq!(envelope.metadata.get("actor").map(String::as_str), Some("admin"));
        assert_eq!(envelope.payload_json().unwrap()["event"], "courier.unsuspended");
    }
}
