//! Courier matching, acceptance and delivery progress.

use common::{AccountId, CourierId, GeoPoint, OrderId, ZoneId};
use document_store::{DocumentQuery, DocumentStore};
use domain::{
    CourierError, CourierProfile, CourierStatus, Document, Order, OrderError, OrderStatus,
    Repository, VerificationStatus,
};
use event_bus::{
    CourierOrderAcceptedData, CourierOrderRejectedData, CourierSuspensionData,
    DeliveryStatusUpdatedData, EventBus, MarketplaceEvent, OrderAssignedData,
};

use crate::config::CoordinatorConfig;
use crate::error::Result;
use crate::lifecycle::OrderLifecycle;
use crate::zones::ZoneService;

/// A courier offered for an order.
#[derive(Debug, Clone)]
pub struct CourierCandidate {
    pub courier: CourierProfile,

    /// Distance to the delivery point, when the order has one.
    pub distance_m: Option<f64>,
}

/// Matches couriers to orders and drives deliveries.
pub struct CourierCoordinator<S: DocumentStore> {
    couriers: Repository<S, CourierProfile>,
    orders: Repository<S, Order>,
    zones: ZoneService<S>,
    lifecycle: OrderLifecycle<S>,
    bus: EventBus,
    config: CoordinatorConfig,
}

impl<S: DocumentStore + Clone> Clone for CourierCoordinator<S> {
    fn clone(&self) -> Self {
        Self {
            couriers: self.couriers.clone(),
            orders: self.orders.clone(),
            zones: self.zones.clone(),
            lifecycle: self.lifecycle.clone(),
            bus: self.bus.clone(),
            config: self.config,
        }
    }
}

impl<S: DocumentStore + Clone> CourierCoordinator<S> {
    pub fn new(
        store: S,
        zones: ZoneService<S>,
        lifecycle: OrderLifecycle<S>,
        bus: EventBus,
        config: CoordinatorConfig,
    ) -> Self {
        Self {
            couriers: Repository::new(store.clone()),
            orders: Repository::new(store),
            zones,
            lifecycle,
            bus,
            config,
        }
    }

    pub async fn get_courier(&self, courier_id: CourierId) -> Result<CourierProfile> {
        Ok(self.couriers.load(courier_id).await?)
    }

    /// The courier profile of an account; `Unauthorized` if it has none.
    pub async fn profile_for(&self, account_id: AccountId) -> Result<CourierProfile> {
        self.couriers
            .get_by_key(&CourierProfile::account_key(account_id))
            .await?
            .ok_or_else(|| CourierError::NoProfile { account_id }.into())
    }

    /// Loads an order and checks that `courier` is assigned to it.
    async fn owned_order(&self, courier: &CourierProfile, order_id: OrderId) -> Result<Order> {
        let order = self.orders.load(order_id).await?;
        order.ensure_assigned_to(courier.id())?;
        Ok(order)
    }

    /// Couriers who could take the order.
    ///
    /// With a delivery point: available couriers within the search radius,
    /// nearest first. Without one: up to the fallback limit of available
    /// couriers.
    #[tracing::instrument(skip(self))]
    pub async fn find_candidates(&self, order_id: OrderId) -> Result<Vec<CourierCandidate>> {
        let order = self.orders.load(order_id).await?;
        let available = self
            .couriers
            .find(
                DocumentQuery::new()
                    .eq("status", CourierStatus::Available)
                    .eq("is_suspended", false)
                    .eq("verification_status", VerificationStatus::Approved),
            )
            .await?;

        let candidates = match order.delivery_address().location {
            Some(point) => self.nearest(available, &point),
            None => available
                .into_iter()
                .take(self.config.courier_fallback_limit)
                .map(|courier| CourierCandidate {
                    courier,
                    distance_m: None,
                })
                .collect(),
        };

        tracing::debug!(count = candidates.len(), "courier candidates found");
        Ok(candidates)
    }

    fn nearest(&self, couriers: Vec<CourierProfile>, point: &GeoPoint) -> Vec<CourierCandidate> {
        let radius_m = self.config.search_radius_m();
        let mut candidates: Vec<CourierCandidate> = couriers
            .into_iter()
            .filter_map(|courier| {
                let distance_m = courier.distance_to(point)?;
                (distance_m <= radius_m).then_some(CourierCandidate {
                    courier,
                    distance_m: Some(distance_m),
                })
            })
            .collect();
        candidates.sort_by(|a, b| {
            a.distance_m
                .unwrap_or(f64::MAX)
                .total_cmp(&b.distance_m.unwrap_or(f64::MAX))
        });
        candidates
    }

    /// Fails when a courier other than `courier_id` holds the order among
    /// their active deliveries.
    async fn ensure_not_taken(&self, order_id: OrderId, courier_id: CourierId) -> Result<()> {
        let order = self.orders.load(order_id).await?;
        let Some(current) = order.courier_id().filter(|current| *current != courier_id) else {
            return Ok(());
        };
        let holder = self.couriers.load(current).await?;
        if holder.active_deliveries().contains(&order_id) {
            return Err(OrderError::AlreadyAccepted {
                order_id,
                courier_id: current,
            }
            .into());
        }
        Ok(())
    }

    /// Assigns a ready order to a courier.
    ///
    /// An order someone else has accepted cannot be reassigned; that courier
    /// has to reject it first.
    #[tracing::instrument(skip(self))]
    pub async fn assign(
        &self,
        order_id: OrderId,
        courier_id: CourierId,
        assigned_by: Option<AccountId>,
    ) -> Result<Order> {
        let courier = self.couriers.load(courier_id).await?;
        courier.can_be_assigned()?;
        self.ensure_not_taken(order_id, courier_id).await?;

        let order = self
            .orders
            .update(order_id, |order| order.assign_courier(courier_id))
            .await?;
        tracing::info!("order assigned to courier");

        self.bus
            .publish(MarketplaceEvent::OrderAssignedToCourier(OrderAssignedData {
                order_id,
                courier_id,
                assigned_by,
            }))
            .await;
        Ok(order)
    }

    /// The assigned courier takes the order and becomes busy.
    #[tracing::instrument(skip(self, notes))]
    pub async fn accept(
        &self,
        account_id: AccountId,
        order_id: OrderId,
        notes: Option<String>,
    ) -> Result<CourierProfile> {
        let courier = self.profile_for(account_id).await?;
        let order = self.owned_order(&courier, order_id).await?;
        ensure_ready(&order)?;

        let was_on_duty = courier.is_on_duty();
        let courier = self
            .couriers
            .update(courier.id(), |courier| courier.accept_delivery(order_id))
            .await?;
        self.zones
            .courier_duty_changed(courier.zone_id(), was_on_duty, courier.is_on_duty())
            .await?;
        tracing::info!(courier_id = %courier.id(), "order accepted");

        self.bus
            .publish(MarketplaceEvent::CourierOrderAccepted(
                CourierOrderAcceptedData {
                    courier_id: courier.id(),
                    order_id,
                    notes,
                },
            ))
            .await;
        Ok(courier)
    }

    /// The assigned courier turns the order down before pickup; it becomes
    /// unassigned.
    #[tracing::instrument(skip(self))]
    pub async fn reject(
        &self,
        account_id: AccountId,
        order_id: OrderId,
        reason: String,
    ) -> Result<Order> {
        let mut courier = self.profile_for(account_id).await?;
        let mut order = self.owned_order(&courier, order_id).await?;
        ensure_ready(&order)?;

        order.clear_courier();
        let order = self.orders.save(order).await?;

        if courier.release_delivery(order_id) {
            self.couriers.save(courier.clone()).await?;
        }
        tracing::info!(courier_id = %courier.id(), %reason, "order rejected");

        self.bus
            .publish(MarketplaceEvent::CourierOrderRejected(
                CourierOrderRejectedData {
                    courier_id: courier.id(),
                    order_id,
                    reason,
                },
            ))
            .await;
        Ok(order)
    }

    /// Records delivery progress reported by the assigned courier.
    #[tracing::instrument(skip(self, proof_of_delivery))]
    pub async fn update_delivery_status(
        &self,
        account_id: AccountId,
        order_id: OrderId,
        status: OrderStatus,
        proof_of_delivery: Option<String>,
    ) -> Result<Order> {
        let courier = self.profile_for(account_id).await?;
        self.owned_order(&courier, order_id).await?;
        if !status.is_courier_reported() {
            return Err(OrderError::NotACourierStatus { status }.into());
        }

        let order = self
            .lifecycle
            .advance(order_id, status, Some(account_id), proof_of_delivery.clone())
            .await?;

        self.bus
            .publish(MarketplaceEvent::DeliveryStatusUpdated(
                DeliveryStatusUpdatedData {
                    courier_id: courier.id(),
                    order_id,
                    status,
                    proof_of_delivery,
                },
            ))
            .await;
        Ok(order)
    }

    /// Creates an offline, unverified profile for an account.
    #[tracing::instrument(skip(self))]
    pub async fn register_courier(
        &self,
        account_id: AccountId,
        commission_rate: f64,
        zone_id: Option<ZoneId>,
    ) -> Result<CourierProfile> {
        if let Some(zone_id) = zone_id {
            self.zones.get_zone(zone_id).await?;
        }
        if self
            .couriers
            .get_by_key(&CourierProfile::account_key(account_id))
            .await?
            .is_some()
        {
            return Err(CourierError::AlreadyRegistered { account_id }.into());
        }

        let courier = CourierProfile::register(account_id, commission_rate, zone_id)?;
        let courier = self.couriers.insert(courier).await?;
        tracing::info!(courier_id = %courier.id(), "courier registered");
        Ok(courier)
    }

    pub async fn approve_verification(&self, courier_id: CourierId) -> Result<CourierProfile> {
        self.set_verification(courier_id, VerificationStatus::Approved)
            .await
    }

    pub async fn reject_verification(&self, courier_id: CourierId) -> Result<CourierProfile> {
        self.set_verification(courier_id, VerificationStatus::Rejected)
            .await
    }

    async fn set_verification(
        &self,
        courier_id: CourierId,
        status: VerificationStatus,
    ) -> Result<CourierProfile> {
        let courier = self
            .couriers
            .update(courier_id, |courier| {
                courier.set_verification(status);
                Ok::<_, CourierError>(())
            })
            .await?;
        tracing::info!(%courier_id, %status, "courier verification changed");
        Ok(courier)
    }

    pub async fn update_location(
        &self,
        courier_id: CourierId,
        location: GeoPoint,
    ) -> Result<CourierProfile> {
        Ok(self
            .couriers
            .update(courier_id, |courier| {
                courier.update_location(location);
                Ok::<_, CourierError>(())
            })
            .await?)
    }

    /// Sets available, offline or on break. Refused while deliveries are active.
    #[tracing::instrument(skip(self))]
    pub async fn set_availability(
        &self,
        courier_id: CourierId,
        status: CourierStatus,
    ) -> Result<CourierProfile> {
        let mut courier = self.couriers.load(courier_id).await?;
        let was_on_duty = courier.is_on_duty();
        courier.set_availability(status)?;
        let courier = self.couriers.save(courier).await?;

        self.zones
            .courier_duty_changed(courier.zone_id(), was_on_duty, courier.is_on_duty())
            .await?;
        Ok(courier)
    }

    #[tracing::instrument(skip(self))]
    pub async fn suspend(
        &self,
        courier_id: CourierId,
        suspended_by: Option<AccountId>,
        reason: String,
    ) -> Result<CourierProfile> {
        let courier = self
            .couriers
            .update(courier_id, |courier| courier.suspend(reason.clone()))
            .await?;
        tracing::warn!(%courier_id, %reason, "courier suspended");

        self.bus
            .publish(MarketplaceEvent::CourierSuspended(CourierSuspensionData {
                courier_id,
                suspended_by,
                reason: Some(reason),
            }))
            .await;
        Ok(courier)
    }

    #[tracing::instrument(skip(self))]
    pub async fn unsuspend(
        &self,
        courier_id: CourierId,
        unsuspended_by: Option<AccountId>,
    ) -> Result<CourierProfile> {
        let courier = self
            .couriers
            .update(courier_id, CourierProfile::unsuspend)
            .await?;
        tracing::info!(%courier_id, "courier unsuspended");

        self.bus
            .publish(MarketplaceEvent::CourierUnsuspended(CourierSuspensionData {
                courier_id,
                suspended_by: unsuspended_by,
                reason: None,
            }))
            .await;
        Ok(courier)
    }
}

/// Courier hand-offs happen only while the order waits for pickup.
fn ensure_ready(order: &Order) -> Result<()> {
    if order.status() != OrderStatus::Ready {
        return Err(OrderError::NotReady {
            status: order.status(),
        }
        .into());
    }
    Ok(())
}
