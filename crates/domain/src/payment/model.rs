//! Payment document.

use chrono::{DateTime, Utc};
use common::{AccountId, CustomerId, Money, OrderId, PaymentId, StoreId};
use document_store::{UniqueKey, Version};
use serde::{Deserialize, Serialize};

use crate::document::Document;
use crate::order::Order;

use super::{PaymentError, PaymentMethod, PaymentStatus};

/// One part of a split payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakdownPart {
    pub method: PaymentMethod,
    pub amount: Money,
}

impl BreakdownPart {
    pub fn new(method: PaymentMethod, amount: Money) -> Self {
        Self { method, amount }
    }
}

/// A refund issued against a completed payment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Refund {
    pub amount: Money,
    pub reason: String,
    pub refunded_at: DateTime<Utc>,
    pub refunded_by: Option<AccountId>,
}

/// What the gateway or the caller reported when processing starts.
#[derive(Debug, Clone, Default)]
pub struct ProcessingDetails {
    pub breakdown: Vec<BreakdownPart>,
    pub transaction_id: Option<String>,
    pub gateway_response: Option<serde_json::Value>,
}

/// Payment record for an order. An order has at most one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    id: PaymentId,

    #[serde(skip)]
    version: Version,

    order_id: OrderId,
    customer_id: CustomerId,
    store_id: StoreId,

    /// Snapshot of the order total when the payment was created.
    amount: Money,

    method: PaymentMethod,
    status: PaymentStatus,
    transaction_id: Option<String>,
    gateway_response: Option<serde_json::Value>,
    breakdown: Vec<BreakdownPart>,
    refunds: Vec<Refund>,
    paid_at: Option<DateTime<Utc>>,
    confirmed_by: Option<AccountId>,
    failure_reason: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Document for Payment {
    type Id = PaymentId;

    fn collection() -> &'static str {
        "payments"
    }

    fn document_type() -> &'static str {
        "Payment"
    }

    fn id(&self) -> PaymentId {
        self.id
    }

    fn version(&self) -> Version {
        self.version
    }

    fn set_version(&mut self, version: Version) {
        self.version = version;
    }

    fn unique_keys(&self) -> Vec<UniqueKey> {
        vec![Payment::order_key(self.order_id)]
    }
}

impl Payment {
    /// Unique key linking a payment to its order.
    pub fn order_key(order_id: OrderId) -> UniqueKey {
        UniqueKey::new("order_id", order_id)
    }

    /// Creates a `PENDING` payment for the order's current total.
    pub fn for_order(order: &Order, method: PaymentMethod) -> Self {
        let now = Utc::now();
        Self {
            id: PaymentId::new(),
            version: Version::initial(),
            order_id: order.id(),
            customer_id: order.customer_id(),
            store_id: order.store_id(),
            amount: order.total(),
            method,
            status: PaymentStatus::Pending,
            transaction_id: None,
            gateway_response: None,
            breakdown: Vec::new(),
            refunds: Vec::new(),
            paid_at: None,
            confirmed_by: None,
            failure_reason: None,
            created_at: now,
            updated_at: now,
        }
    }
}

// Query methods
impl Payment {
    pub fn order_id(&self) -> OrderId {
        self.order_id
    }

    pub fn customer_id(&self) -> CustomerId {
        self.customer_id
    }

    pub fn store_id(&self) -> StoreId {
        self.store_id
    }

    pub fn amount(&self) -> Money {
        self.amount
    }

    pub fn method(&self) -> PaymentMethod {
        self.method
    }

    pub fn status(&self) -> PaymentStatus {
        self.status
    }

    pub fn transaction_id(&self) -> Option<&str> {
        self.transaction_id.as_deref()
    }

    pub fn gateway_response(&self) -> Option<&serde_json::Value> {
        self.gateway_response.as_ref()
    }

    pub fn breakdown(&self) -> &[BreakdownPart] {
        &self.breakdown
    }

    pub fn refunds(&self) -> &[Refund] {
        &self.refunds
    }

    /// Sum of all refunds issued so far.
    pub fn total_refunded(&self) -> Money {
        self.refunds.iter().map(|r| r.amount).sum()
    }

    pub fn paid_at(&self) -> Option<DateTime<Utc>> {
        self.paid_at
    }

    pub fn confirmed_by(&self) -> Option<AccountId> {
        self.confirmed_by
    }

    pub fn failure_reason(&self) -> Option<&str> {
        self.failure_reason.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn is_cash(&self) -> bool {
        self.method == PaymentMethod::Cash
    }
}

// Mutations
impl Payment {
    fn validate_breakdown(
        &self,
        method: PaymentMethod,
        breakdown: &[BreakdownPart],
    ) -> Result<(), PaymentError> {
        if breakdown.is_empty() && method != PaymentMethod::Mixed {
            return Ok(());
        }
        let total = Money::checked_sum(breakdown.iter().map(|p| p.amount))
            .ok_or(PaymentError::BreakdownOverflow)?;
        if breakdown.is_empty()
            || total != self.amount
            || breakdown.iter().any(|p| !p.amount.is_positive())
        {
            return Err(PaymentError::InvalidBreakdown {
                breakdown: total,
                amount: self.amount,
            });
        }
        Ok(())
    }

    /// Starts (or restarts, after a failure) gateway processing.
    pub fn begin_processing(
        &mut self,
        method: PaymentMethod,
        details: ProcessingDetails,
    ) -> Result<(), PaymentError> {
        match self.status {
            PaymentStatus::Pending | PaymentStatus::Processing | PaymentStatus::Failed => {}
            PaymentStatus::Completed => return Err(PaymentError::AlreadyCompleted),
            status => {
                return Err(PaymentError::InvalidTransition {
                    status,
                    action: "process",
                });
            }
        }
        self.validate_breakdown(method, &details.breakdown)?;

        self.method = method;
        self.breakdown = details.breakdown;
        if details.transaction_id.is_some() {
            self.transaction_id = details.transaction_id;
        }
        if details.gateway_response.is_some() {
            self.gateway_response = details.gateway_response;
        }
        self.failure_reason = None;
        self.status = PaymentStatus::Processing;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Marks the payment as paid.
    pub fn complete(
        &mut self,
        transaction_id: Option<String>,
        confirmed_by: Option<AccountId>,
    ) -> Result<(), PaymentError> {
        match self.status {
            PaymentStatus::Pending | PaymentStatus::Processing => {}
            PaymentStatus::Completed => return Err(PaymentError::AlreadyCompleted),
            status => {
                return Err(PaymentError::InvalidTransition {
                    status,
                    action: "complete",
                });
            }
        }

        let now = Utc::now();
        if transaction_id.is_some() {
            self.transaction_id = transaction_id;
        }
        self.confirmed_by = confirmed_by;
        self.paid_at = Some(now);
        self.status = PaymentStatus::Completed;
        self.updated_at = now;
        Ok(())
    }

    /// Marks the payment as failed.
    pub fn fail(&mut self, reason: String) -> Result<(), PaymentError> {
        if !self.status.is_open() {
            return Err(PaymentError::InvalidTransition {
                status: self.status,
                action: "fail",
            });
        }
        self.failure_reason = Some(reason);
        self.status = PaymentStatus::Failed;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Issues a refund. The payment becomes `REFUNDED` once refunds cover
    /// the whole amount, `PARTIALLY_REFUNDED` before that.
    pub fn refund(
        &mut self,
        amount: Money,
        reason: String,
        refunded_by: Option<AccountId>,
    ) -> Result<(), PaymentError> {
        if !self.status.is_refundable() {
            return Err(PaymentError::NotRefundable {
                status: self.status,
            });
        }
        if !amount.is_positive() {
            return Err(PaymentError::InvalidRefundAmount);
        }

        let refundable = self.amount - self.total_refunded();
        if amount > refundable {
            return Err(PaymentError::RefundExceedsAmount {
                requested: amount,
                refundable,
            });
        }

        let now = Utc::now();
        self.refunds.push(Refund {
            amount,
            reason,
            refunded_at: now,
            refunded_by,
        });
        self.status = if self.total_refunded() >= self.amount {
            PaymentStatus::Refunded
        } else {
            PaymentStatus::PartiallyRefunded
        };
        self.updated_at = now;
        Ok(())
    }
}
