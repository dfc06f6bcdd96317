//! Order document.

use chrono::{DateTime, Utc};
use common::{AccountId, CourierId, CustomerId, Money, OrderId, StoreId, ZoneId};
use document_store::{UniqueKey, Version};
use serde::{Deserialize, Serialize};

use crate::document::Document;

use super::{
    DeliveryAddress, OrderError, OrderItem, OrderPaymentStatus, OrderStatus, OrderTotals,
    StatusChange,
};

/// Everything needed to place an order, after pricing.
#[derive(Debug, Clone)]
pub struct OrderDraft {
    pub customer_id: CustomerId,
    pub store_id: StoreId,
    pub items: Vec<OrderItem>,
    pub delivery_address: DeliveryAddress,
    pub zone_id: Option<ZoneId>,
    pub delivery_fee: Money,
    pub discount: Money,
    pub tax: Money,
}

/// A customer order and its fulfillment state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    id: OrderId,

    #[serde(skip)]
    version: Version,

    order_number: String,
    customer_id: CustomerId,
    store_id: StoreId,
    courier_id: Option<CourierId>,
    items: Vec<OrderItem>,
    totals: OrderTotals,
    status: OrderStatus,
    payment_status: OrderPaymentStatus,
    delivery_address: DeliveryAddress,
    zone_id: Option<ZoneId>,

    /// One entry per status occupied; the last equals `status`.
    status_history: Vec<StatusChange>,

    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    actual_delivery_time: Option<DateTime<Utc>>,
    cancellation_reason: Option<String>,
}

impl Document for Order {
    type Id = OrderId;

    fn collection() -> &'static str {
        "orders"
    }

    fn document_type() -> &'static str {
        "Order"
    }

    fn id(&self) -> OrderId {
        self.id
    }

    fn version(&self) -> Version {
        self.version
    }

    fn set_version(&mut self, version: Version) {
        self.version = version;
    }

    fn unique_keys(&self) -> Vec<UniqueKey> {
        vec![UniqueKey::new("order_number", &self.order_number)]
    }
}

/// Formats an order number as `ORD-YYYYMMDD-XXXXXXXX`.
fn order_number(id: OrderId, at: DateTime<Utc>) -> String {
    let suffix = id.as_uuid().simple().to_string()[..8].to_uppercase();
    format!("ORD-{}-{}", at.format("%Y%m%d"), suffix)
}

impl Order {
    /// Places a new order in the `PENDING` status.
    pub fn place(draft: OrderDraft, placed_by: Option<AccountId>) -> Result<Self, OrderError> {
        let subtotal = OrderItem::subtotal_of(&draft.items)?;
        if draft.delivery_fee.is_negative()
            || draft.discount.is_negative()
            || draft.tax.is_negative()
        {
            return Err(OrderError::InvalidCharges);
        }

        let totals =
            OrderTotals::compute(subtotal, draft.delivery_fee, draft.discount, draft.tax)?;
        let id = OrderId::new();
        let now = Utc::now();

        Ok(Self {
            id,
            version: Version::initial(),
            order_number: order_number(id, now),
            customer_id: draft.customer_id,
            store_id: draft.store_id,
            courier_id: None,
            items: draft.items,
            totals,
            status: OrderStatus::Pending,
            payment_status: OrderPaymentStatus::Pending,
            delivery_address: draft.delivery_address,
            zone_id: draft.zone_id,
            status_history: vec![StatusChange {
                status: OrderStatus::Pending,
                at: now,
                actor: placed_by,
                note: None,
            }],
            created_at: now,
            updated_at: now,
            actual_delivery_time: None,
            cancellation_reason: None,
        })
    }
}

// Query methods
impl Order {
    pub fn order_number(&self) -> &str {
        &self.order_number
    }

    pub fn customer_id(&self) -> CustomerId {
        self.customer_id
    }

    pub fn store_id(&self) -> StoreId {
        self.store_id
    }

    /// Returns the courier the order is assigned to, if any.
    pub fn courier_id(&self) -> Option<CourierId> {
        self.courier_id
    }

    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }

    pub fn totals(&self) -> &OrderTotals {
        &self.totals
    }

    pub fn total(&self) -> Money {
        self.totals.total
    }

    pub fn delivery_fee(&self) -> Money {
        self.totals.delivery_fee
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn payment_status(&self) -> OrderPaymentStatus {
        self.payment_status
    }

    pub fn delivery_address(&self) -> &DeliveryAddress {
        &self.delivery_address
    }

    pub fn zone_id(&self) -> Option<ZoneId> {
        self.zone_id
    }

    pub fn status_history(&self) -> &[StatusChange] {
        &self.status_history
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn actual_delivery_time(&self) -> Option<DateTime<Utc>> {
        self.actual_delivery_time
    }

    pub fn cancellation_reason(&self) -> Option<&str> {
        self.cancellation_reason.as_deref()
    }

    /// Returns true if the order is in a terminal status.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

// Mutations
impl Order {
    /// Moves the order to `next`, recording a history entry.
    ///
    /// Entering `DELIVERED` stamps the actual delivery time.
    pub fn transition(
        &mut self,
        next: OrderStatus,
        actor: Option<AccountId>,
        note: Option<String>,
    ) -> Result<(), OrderError> {
        if !self.status.can_transition_to(next) {
            return Err(OrderError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }

        let now = Utc::now();
        self.status = next;
        self.status_history.push(StatusChange {
            status: next,
            at: now,
            actor,
            note,
        });
        self.updated_at = now;

        if next == OrderStatus::Delivered {
            self.actual_delivery_time = Some(now);
        }
        Ok(())
    }

    /// Cancels the order with a reason.
    pub fn cancel(&mut self, actor: Option<AccountId>, reason: String) -> Result<(), OrderError> {
        self.transition(OrderStatus::Cancelled, actor, Some(reason.clone()))?;
        self.cancellation_reason = Some(reason);
        Ok(())
    }

    /// Assigns a courier. The order must be `READY`.
    pub fn assign_courier(&mut self, courier_id: CourierId) -> Result<(), OrderError> {
        if self.status != OrderStatus::Ready {
            return Err(OrderError::NotReady {
                status: self.status,
            });
        }
        self.courier_id = Some(courier_id);
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Fails unless the order is assigned to `courier_id`.
    pub fn ensure_assigned_to(&self, courier_id: CourierId) -> Result<(), OrderError> {
        if self.courier_id != Some(courier_id) {
            return Err(OrderError::NotAssignedToCourier {
                order_id: self.id,
                courier_id,
            });
        }
        Ok(())
    }

    /// Removes the courier assignment.
    pub fn clear_courier(&mut self) {
        self.courier_id = None;
        self.updated_at = Utc::now();
    }

    /// Mirrors the payment record's status onto the order.
    pub fn mirror_payment_status(&mut self, status: OrderPaymentStatus) {
        self.payment_status = status;
        self.updated_at = Utc::now();
    }
}
