//! Event bus error types.

use thiserror::Error;

/// Errors a subscriber can report while handling an event.
#[derive(Debug, Error)]
pub enum EventBusError {
    /// Failed to serialize or deserialize an event payload.
    #[error("Event serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A subscriber-specific error.
    #[error("Subscriber error: {0}")]
    Subscriber(String),
}

/// Result type for event bus operations.
pub type Result<T> = std::result::Result<T, EventBusError>;
