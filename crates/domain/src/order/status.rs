//! Order status state machine.

use serde::{Deserialize, Serialize};

/// The fulfillment status of an order.
///
/// State transitions:
/// ```text
/// Pending ──► Confirmed ──► Preparing ──► Ready ──► PickedUp ──► Delivering ──► Delivered
///    │            │             │           │          │             │
///    └────────────┴─────────────┴───────────┴──────────┴─────────────┴──► Cancelled
/// ```
///
/// Transitions only move forward; steps may be skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Preparing,
    Ready,
    PickedUp,
    Delivering,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// Position along the delivery path. Cancelled sits outside it.
    fn rank(&self) -> Option<u8> {
        match self {
            OrderStatus::Pending => Some(0),
            OrderStatus::Confirmed => Some(1),
            OrderStatus::Preparing => Some(2),
            OrderStatus::Ready => Some(3),
            OrderStatus::PickedUp => Some(4),
            OrderStatus::Delivering => Some(5),
            OrderStatus::Delivered => Some(6),
            OrderStatus::Cancelled => None,
        }
    }

    /// Returns true if no further transitions are possible.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// Returns true if the order may move from this status to `next`.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        match (self.rank(), next.rank()) {
            (_, None) => true,
            (Some(current), Some(next)) => next > current,
            (None, Some(_)) => false,
        }
    }

    /// Returns true for the statuses a courier reports while delivering.
    pub fn is_courier_reported(&self) -> bool {
        matches!(
            self,
            OrderStatus::PickedUp | OrderStatus::Delivering | OrderStatus::Delivered
        )
    }

    /// Returns true if a courier has taken the order out of the store.
    pub fn is_in_transit(&self) -> bool {
        matches!(self, OrderStatus::PickedUp | OrderStatus::Delivering)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Confirmed => "CONFIRMED",
            OrderStatus::Preparing => "PREPARING",
            OrderStatus::Ready => "READY",
            OrderStatus::PickedUp => "PICKED_UP",
            OrderStatus::Delivering => "DELIVERING",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Payment status as mirrored onto the order.
///
/// Follows the payment record and may briefly lag behind it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderPaymentStatus {
    #[default]
    Pending,
    Paid,
    Failed,
    Refunded,
}

impl std::fmt::Display for OrderPaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OrderPaymentStatus::Pending => "PENDING",
            OrderPaymentStatus::Paid => "PAID",
            OrderPaymentStatus::Failed => "FAILED",
            OrderPaymentStatus::Refunded => "REFUNDED",
        };
        write!(f, "{s}")
    }
}
