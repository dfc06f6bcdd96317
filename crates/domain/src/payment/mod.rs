//! Payments and their status state machine.

mod model;
mod status;

pub use model::{BreakdownPart, Payment, ProcessingDetails, Refund};
pub use status::{PaymentMethod, PaymentStatus};

use common::{Money, OrderId};
use thiserror::Error;

use crate::error::ErrorKind;

/// Errors that can occur during payment operations.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// An order has at most one payment.
    #[error("Payment already exists for order {order_id}")]
    AlreadyExists { order_id: OrderId },

    /// The payment was already completed.
    #[error("Payment already completed")]
    AlreadyCompleted,

    /// The payment cannot perform `action` in its current status.
    #[error("Cannot {action} a payment in status {status}")]
    InvalidTransition {
        status: PaymentStatus,
        action: &'static str,
    },

    /// Only completed payments can be refunded.
    #[error("Payment in status {status} cannot be refunded")]
    NotRefundable { status: PaymentStatus },

    /// The refund would exceed the amount paid.
    #[error("Refund amount {requested} exceeds refundable amount {refundable}")]
    RefundExceedsAmount { requested: Money, refundable: Money },

    #[error("Refund amount must be positive")]
    InvalidRefundAmount,

    /// Mixed payments need a breakdown that adds up to the amount.
    #[error("Payment breakdown totals {breakdown}, expected {amount}")]
    InvalidBreakdown { breakdown: Money, amount: Money },

    /// The breakdown parts do not fit in a money amount when added up.
    #[error("Payment breakdown total is too large")]
    BreakdownOverflow,

    /// Cash confirmation was requested for a non-cash payment.
    #[error("Payment method {method} is not cash")]
    NotCash { method: PaymentMethod },
}

impl PaymentError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PaymentError::AlreadyExists { .. }
            | PaymentError::AlreadyCompleted
            | PaymentError::InvalidTransition { .. } => ErrorKind::Conflict,
            PaymentError::NotRefundable { .. }
            | PaymentError::RefundExceedsAmount { .. }
            | PaymentError::InvalidRefundAmount
            | PaymentError::InvalidBreakdown { .. }
            | PaymentError::BreakdownOverflow
            | PaymentError::NotCash { .. } => ErrorKind::BadRequest,
        }
    }
}
