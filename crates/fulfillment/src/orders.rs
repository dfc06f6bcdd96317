//! Order placement and store-side status changes.

use common::{AccountId, CustomerId, Money, OrderId, StoreId, ZoneId};
use document_store::DocumentStore;
use domain::{
    DeliveryAddress, DeliveryZone, Document, Order, OrderDraft, OrderItem, OrderStatus,
    Repository, ZoneError,
};
use event_bus::{EventBus, MarketplaceEvent, OrderPlacedData, OrderStatusUpdatedData};

use crate::error::{FulfillmentError, Result};
use crate::lifecycle::OrderLifecycle;
use crate::zones::ZoneService;

/// A customer's order as submitted, before pricing.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub customer_id: CustomerId,
    pub store_id: StoreId,
    pub items: Vec<OrderItem>,
    pub delivery_address: DeliveryAddress,

    /// Zone to deliver into. Looked up from the address location if absent.
    pub zone_id: Option<ZoneId>,

    pub discount: Money,
    pub tax: Money,
    pub placed_by: Option<AccountId>,
}

/// Places orders and applies store and admin status changes.
pub struct OrderService<S: DocumentStore> {
    orders: Repository<S, Order>,
    zones: ZoneService<S>,
    lifecycle: OrderLifecycle<S>,
    bus: EventBus,
}

impl<S: DocumentStore + Clone> Clone for OrderService<S> {
    fn clone(&self) -> Self {
        Self {
            orders: self.orders.clone(),
            zones: self.zones.clone(),
            lifecycle: self.lifecycle.clone(),
            bus: self.bus.clone(),
        }
    }
}

impl<S: DocumentStore + Clone> OrderService<S> {
    pub fn new(store: S, zones: ZoneService<S>, lifecycle: OrderLifecycle<S>, bus: EventBus) -> Self {
        Self {
            orders: Repository::new(store),
            zones,
            lifecycle,
            bus,
        }
    }

    pub async fn get_order(&self, order_id: OrderId) -> Result<Order> {
        Ok(self.orders.load(order_id).await?)
    }

    async fn resolve_zone(&self, new: &NewOrder) -> Result<DeliveryZone> {
        let zone = match (new.zone_id, new.delivery_address.location) {
            (Some(zone_id), _) => self.zones.get_zone(zone_id).await?,
            (None, Some(point)) => self
                .zones
                .find_zone_by_location(point)
                .await?
                .ok_or(ZoneError::NoZoneAtLocation {
                    lng: point.lng,
                    lat: point.lat,
                })?,
            (None, None) => return Err(FulfillmentError::MissingDeliveryZone),
        };

        if !zone.is_active() {
            return Err(ZoneError::Inactive { zone_id: zone.id() }.into());
        }
        Ok(zone)
    }

    /// Prices and stores a new order in `PENDING`.
    #[tracing::instrument(skip(self, new), fields(customer_id = %new.customer_id, store_id = %new.store_id))]
    pub async fn place_order(&self, new: NewOrder) -> Result<Order> {
        let subtotal = OrderItem::subtotal_of(&new.items)?;
        let zone = self.resolve_zone(&new).await?;
        let zone_id = zone.id();

        if !self.zones.check_coverage(new.store_id, zone_id).await? {
            return Err(ZoneError::NotCovered {
                store_id: new.store_id,
                zone_id,
            }
            .into());
        }
        let quote = self
            .zones
            .calculate_fee(new.store_id, zone_id, subtotal)
            .await?;

        let order = Order::place(
            OrderDraft {
                customer_id: new.customer_id,
                store_id: new.store_id,
                items: new.items,
                delivery_address: new.delivery_address,
                zone_id: Some(zone_id),
                delivery_fee: quote.delivery_fee,
                discount: new.discount,
                tax: new.tax,
            },
            new.placed_by,
        )?;
        let order = self.orders.insert(order).await?;
        self.zones.record_order(zone_id).await?;

        tracing::info!(
            order_id = %order.id(),
            order_number = order.order_number(),
            total = %order.total(),
            "order placed"
        );
        self.bus
            .publish(MarketplaceEvent::OrderPlaced(OrderPlacedData {
                order_id: order.id(),
                order_number: order.order_number().to_string(),
                customer_id: order.customer_id(),
                store_id: order.store_id(),
                total: order.total(),
            }))
            .await;
        Ok(order)
    }

    /// Applies a store or admin status change.
    ///
    /// Only `CONFIRMED`, `PREPARING`, `READY` and `CANCELLED` may be set
    /// here; delivery steps are reported by the courier.
    #[tracing::instrument(skip(self, note))]
    pub async fn update_status(
        &self,
        order_id: OrderId,
        status: OrderStatus,
        actor: Option<AccountId>,
        note: Option<String>,
    ) -> Result<Order> {
        match status {
            OrderStatus::Confirmed | OrderStatus::Preparing | OrderStatus::Ready => {}
            OrderStatus::Cancelled => {
                let reason = note.unwrap_or_else(|| "Cancelled".to_string());
                return self.cancel(order_id, actor, reason).await;
            }
            _ => return Err(FulfillmentError::StatusNotAllowed { status }),
        }

        let order = self.lifecycle.advance(order_id, status, actor, note).await?;
        self.status_updated(&order, actor).await;
        Ok(order)
    }

    /// Cancels an order, releasing any courier that accepted it.
    #[tracing::instrument(skip(self))]
    pub async fn cancel(
        &self,
        order_id: OrderId,
        actor: Option<AccountId>,
        reason: String,
    ) -> Result<Order> {
        let order = self
            .lifecycle
            .advance(order_id, OrderStatus::Cancelled, actor, Some(reason))
            .await?;
        self.status_updated(&order, actor).await;
        Ok(order)
    }

    async fn status_updated(&self, order: &Order, actor: Option<AccountId>) {
        self.bus
            .publish(MarketplaceEvent::OrderStatusUpdated(OrderStatusUpdatedData {
                order_id: order.id(),
                status: order.status(),
                actor_id: actor,
            }))
            .await;
    }
}
