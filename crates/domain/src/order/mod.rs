//! Orders and their status state machine.

mod items;
mod model;
mod status;

pub use items::{DeliveryAddress, OrderItem, OrderTotals, StatusChange};
pub use model::{Order, OrderDraft};
pub use status::{OrderPaymentStatus, OrderStatus};

use common::{CourierId, Money, OrderId};
use thiserror::Error;

use crate::error::ErrorKind;

/// Errors that can occur during order operations.
#[derive(Debug, Error)]
pub enum OrderError {
    /// The order moved, or tried to move, against the state machine.
    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    /// Courier operations need the order to be `READY`.
    #[error("Order is not ready for pickup (status {status})")]
    NotReady { status: OrderStatus },

    /// The calling courier is not the one assigned to the order.
    #[error("Order {order_id} is not assigned to courier {courier_id}")]
    NotAssignedToCourier {
        order_id: OrderId,
        courier_id: CourierId,
    },

    /// Another courier has already taken the order.
    #[error("Order {order_id} was already accepted by courier {courier_id}")]
    AlreadyAccepted {
        order_id: OrderId,
        courier_id: CourierId,
    },

    /// Order has no items.
    #[error("Order has no items")]
    NoItems,

    /// Invalid quantity.
    #[error("Invalid quantity for {product_id} (must be greater than 0)")]
    InvalidQuantity { product_id: String },

    /// Invalid price.
    #[error("Invalid price {price} for {product_id} (must not be negative)")]
    InvalidPrice { product_id: String, price: Money },

    /// Fee, discount and tax must not be negative.
    #[error("Order charges must not be negative")]
    InvalidCharges,

    /// A line total or the order total does not fit in a money amount.
    #[error("Order amount is too large")]
    AmountOverflow,

    /// The discount is larger than what the order costs.
    #[error("Discount {discount} exceeds the order amount {gross}")]
    DiscountExceedsTotal { discount: Money, gross: Money },

    /// A courier-reported status was outside the delivery steps.
    #[error("Couriers cannot set status {status}")]
    NotACourierStatus { status: OrderStatus },
}

impl OrderError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            OrderError::InvalidTransition { .. } | OrderError::AlreadyAccepted { .. } => {
                ErrorKind::Conflict
            }
            OrderError::NotAssignedToCourier { .. } => ErrorKind::Unauthorized,
            OrderError::NotReady { .. }
            | OrderError::NoItems
            | OrderError::InvalidQuantity { .. }
            | OrderError::InvalidPrice { .. }
            | OrderError::InvalidCharges
            | OrderError::AmountOverflow
            | OrderError::DiscountExceedsTotal { .. }
            | OrderError::NotACourierStatus { .. } => ErrorKind::BadRequest,
        }
    }
}
