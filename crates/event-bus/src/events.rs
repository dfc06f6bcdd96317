//! Domain events carried by the bus.

use common::{AccountId, CourierId, CustomerId, Money, OrderId, PaymentId, StoreId};
use domain::{Document, OrderStatus, Payment, PaymentMethod, PaymentStatus};
use serde::{Deserialize, Serialize};

/// Events published by the fulfillment coordinator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload")]
pub enum MarketplaceEvent {
    #[serde(rename = "order.placed")]
    OrderPlaced(OrderPlacedData),

    #[serde(rename = "order.status.updated")]
    OrderStatusUpdated(OrderStatusUpdatedData),

    #[serde(rename = "order.assigned.to.courier")]
    OrderAssignedToCourier(OrderAssignedData),

    #[serde(rename = "courier.order.accepted")]
    CourierOrderAccepted(CourierOrderAcceptedData),

    #[serde(rename = "courier.order.rejected")]
    CourierOrderRejected(CourierOrderRejectedData),

    #[serde(rename = "delivery.status.updated")]
    DeliveryStatusUpdated(DeliveryStatusUpdatedData),

    #[serde(rename = "payment.processed")]
    PaymentProcessed(PaymentEventData),

    #[serde(rename = "payment.completed")]
    PaymentCompleted(PaymentEventData),

    #[serde(rename = "payment.failed")]
    PaymentFailed(PaymentEventData),

    #[serde(rename = "payment.refunded")]
    PaymentRefunded(PaymentEventData),

    #[serde(rename = "courier.suspended")]
    CourierSuspended(CourierSuspensionData),

    #[serde(rename = "courier.unsuspended")]
    CourierUnsuspended(CourierSuspensionData),
}

impl MarketplaceEvent {
    /// Returns the dotted event name, e.g. `payment.completed`.
    pub fn name(&self) -> &'static str {
        match self {
            MarketplaceEvent::OrderPlaced(_) => "order.placed",
            MarketplaceEvent::OrderStatusUpdated(_) => "order.status.updated",
            MarketplaceEvent::OrderAssignedToCourier(_) => "order.assigned.to.courier",
            MarketplaceEvent::CourierOrderAccepted(_) => "courier.order.accepted",
            MarketplaceEvent::CourierOrderRejected(_) => "courier.order.rejected",
            MarketplaceEvent::DeliveryStatusUpdated(_) => "delivery.status.updated",
            MarketplaceEvent::PaymentProcessed(_) => "payment.processed",
            MarketplaceEvent::PaymentCompleted(_) => "payment.completed",
            MarketplaceEvent::PaymentFailed(_) => "payment.failed",
            MarketplaceEvent::PaymentRefunded(_) => "payment.refunded",
            MarketplaceEvent::CourierSuspended(_) => "courier.suspended",
            MarketplaceEvent::CourierUnsuspended(_) => "courier.unsuspended",
        }
    }

    /// Returns the order the event concerns, if any.
    pub fn order_id(&self) -> Option<OrderId> {
        match self {
            MarketplaceEvent::OrderPlaced(d) => Some(d.order_id),
            MarketplaceEvent::OrderStatusUpdated(d) => Some(d.order_id),
            MarketplaceEvent::OrderAssignedToCourier(d) => Some(d.order_id),
            MarketplaceEvent::CourierOrderAccepted(d) => Some(d.order_id),
            MarketplaceEvent::CourierOrderRejected(d) => Some(d.order_id),
            MarketplaceEvent::DeliveryStatusUpdated(d) => Some(d.order_id),
            MarketplaceEvent::PaymentProcessed(d)
            | MarketplaceEvent::PaymentCompleted(d)
            | MarketplaceEvent::PaymentFailed(d)
            | MarketplaceEvent::PaymentRefunded(d) => Some(d.order_id),
            MarketplaceEvent::CourierSuspended(_) | MarketplaceEvent::CourierUnsuspended(_) => {
                None
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderPlacedData {
    pub order_id: OrderId,
    pub order_number: String,
    pub customer_id: CustomerId,
    pub store_id: StoreId,
    pub total: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderStatusUpdatedData {
    pub order_id: OrderId,
    pub status: OrderStatus,
    pub actor_id: Option<AccountId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderAssignedData {
    pub order_id: OrderId,
    pub courier_id: CourierId,
    pub assigned_by: Option<AccountId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourierOrderAcceptedData {
    pub courier_id: CourierId,
    pub order_id: OrderId,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourierOrderRejectedData {
    pub courier_id: CourierId,
    pub order_id: OrderId,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryStatusUpdatedData {
    pub courier_id: CourierId,
    pub order_id: OrderId,
    pub status: OrderStatus,
    pub proof_of_delivery: Option<String>,
}

/// Payload shared by all `payment.*` events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentEventData {
    pub payment_id: PaymentId,
    pub order_id: OrderId,
    pub customer_id: CustomerId,
    pub store_id: StoreId,
    pub amount: Money,
    pub payment_method: PaymentMethod,
    pub status: PaymentStatus,
    pub transaction_id: Option<String>,
    pub refund_amount: Option<Money>,
    pub reason: Option<String>,
}

impl PaymentEventData {
    /// Snapshot of a payment as it stands.
    pub fn from_payment(payment: &Payment) -> Self {
        Self {
            payment_id: payment.id(),
            order_id: payment.order_id(),
            customer_id: payment.customer_id(),
            store_id: payment.store_id(),
            amount: payment.amount(),
            payment_method: payment.method(),
            status: payment.status(),
            transaction_id: payment.transaction_id().map(str::to_string),
            refund_amount: None,
            reason: None,
        }
    }

    pub fn with_refund(mut self, amount: Money, reason: impl Into<String>) -> Self {
        self.refund_amount = Some(amount);
        self.reason = Some(reason.into());
        self
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourierSuspensionData {
    pub courier_id: CourierId,
    pub suspended_by: Option<AccountId>,
    pub reason: Option<String>,
}
