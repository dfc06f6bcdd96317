//! Payment status and method.

use serde::{Deserialize, Serialize};

use crate::order::OrderPaymentStatus;

/// How a payment is settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
    Wallet,
    BankTransfer,
    Mixed,
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
            PaymentMethod::Wallet => "wallet",
            PaymentMethod::BankTransfer => "bank_transfer",
            PaymentMethod::Mixed => "mixed",
        };
        write!(f, "{s}")
    }
}

/// The state of a payment.
///
/// State transitions:
/// ```text
/// Pending ──► Processing ──► Completed ──► PartiallyRefunded ──► Refunded
///    │            │  ▲            │                                 ▲
///    └────────────┴──┼──► Failed  └─────────────────────────────────┘
///                    └──────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Processing,
    Completed,
    Failed,
    Refunded,
    PartiallyRefunded,
}

impl PaymentStatus {
    /// Returns true if the payment is still waiting to be settled.
    pub fn is_open(&self) -> bool {
        matches!(self, PaymentStatus::Pending | PaymentStatus::Processing)
    }

    /// Returns true if refunds may be requested.
    ///
    /// A fully refunded payment still passes so the amount check can
    /// reject the request with a precise message.
    pub fn is_refundable(&self) -> bool {
        matches!(
            self,
            PaymentStatus::Completed | PaymentStatus::PartiallyRefunded | PaymentStatus::Refunded
        )
    }

    /// The status shown on the order for this payment status.
    pub fn order_mirror(&self) -> OrderPaymentStatus {
        match self {
            PaymentStatus::Pending | PaymentStatus::Processing => OrderPaymentStatus::Pending,
            PaymentStatus::Completed | PaymentStatus::PartiallyRefunded => OrderPaymentStatus::Paid,
            PaymentStatus::Failed => OrderPaymentStatus::Failed,
            PaymentStatus::Refunded => OrderPaymentStatus::Refunded,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "PENDING",
            PaymentStatus::Processing => "PROCESSING",
            PaymentStatus::Completed => "COMPLETED",
            PaymentStatus::Failed => "FAILED",
            PaymentStatus::Refunded => "REFUNDED",
            PaymentStatus::PartiallyRefunded => "PARTIALLY_REFUNDED",
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
