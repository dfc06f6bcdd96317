//! Fulfillment error types.

use common::OrderId;
use document_store::StoreError;
use domain::{
    CourierError, DomainError, ErrorKind, OrderError, OrderStatus, PaymentError, ZoneError,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during fulfillment operations.
#[derive(Debug, Error)]
pub enum FulfillmentError {
    /// Domain error.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// The order has no payment record.
    #[error("No payment found for order {order_id}")]
    PaymentNotFound { order_id: OrderId },

    /// A new order needs either a zone or a geocoded delivery address.
    #[error("Order needs a delivery zone or a delivery location")]
    MissingDeliveryZone,

    /// Stores and admins cannot set this status directly.
    #[error("Status {status} cannot be set by the store")]
    StatusNotAllowed { status: OrderStatus },
}

impl FulfillmentError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FulfillmentError::Domain(e) => e.kind(),
            FulfillmentError::PaymentNotFound { .. } => ErrorKind::NotFound,
            FulfillmentError::MissingDeliveryZone | FulfillmentError::StatusNotAllowed { .. } => {
                ErrorKind::BadRequest
            }
        }
    }

    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            kind: self.kind(),
            message: self.to_string(),
        }
    }
}

macro_rules! via_domain {
    ($($source:ty),* $(,)?) => {
        $(
            impl From<$source> for FulfillmentError {
                fn from(err: $source) -> Self {
                    FulfillmentError::Domain(DomainError::from(err))
                }
            }
        )*
    };
}

via_domain!(StoreError, OrderError, PaymentError, CourierError, ZoneError);

/// Serialized form of an error returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&FulfillmentError> for ErrorResponse {
    fn from(err: &FulfillmentError) -> Self {
        err.to_response()
    }
}

/// Convenience type alias for fulfillment results.
pub type Result<T> = std::result::Result<T, FulfillmentError>;
