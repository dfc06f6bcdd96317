//! Integration tests: the full fulfillment flow over an in-memory store.
//!
//! Orders are placed, paid, assigned, accepted and delivered through the
//! public services, and the resulting documents and events are checked.

use std::sync::Arc;

use async_trait::async_trait;
use common::{AccountId, CustomerId, GeoPoint, Money, StoreId};
use document_store::{
    DocumentQuery, DocumentStore, InMemoryDocumentStore, StoreError, StoredDocument, UniqueKey,
    Version,
};
use domain::{
    CourierProfile, CourierStatus, DeliveryAddress, DeliveryZone, Document, ErrorKind, Order,
    OrderItem, OrderPaymentStatus, OrderStatus, PaymentMethod, PaymentStatus, PricingOverrides,
    Repository, TimeWindow, ZoneBoundary, ZonePricing,
};
use event_bus::{EventBus, EventLog, MarketplaceEvent};
use fulfillment::{
    CoordinatorConfig, InMemoryRetryQueue, Marketplace, NewOrder, NewZone, SettlementFailureHook,
};
use tokio::sync::RwLock;

/// Store that can be told to fail replaces in one collection.
#[derive(Clone, Default)]
struct FlakyStore {
    inner: InMemoryDocumentStore,
    fail_replace_in: Arc<RwLock<Option<String>>>,
}

impl FlakyStore {
    async fn set_fail_on_replace(&self, collection: Option<&str>) {
        *self.fail_replace_in.write().await = collection.map(str::to_string);
    }
}

#[async_trait]
impl DocumentStore for FlakyStore {
    async fn insert(&self, document: StoredDocument) -> document_store::Result<Version> {
        self.inner.insert(document).await
    }

    async fn replace(
        &self,
        document: StoredDocument,
        expected: Version,
    ) -> document_store::Result<Version> {
        if self.fail_replace_in.read().await.as_deref() == Some(document.collection.as_str()) {
            return Err(StoreError::InvalidDocument("injected failure".to_string()));
        }
        self.inner.replace(document, expected).await
    }

    async fn delete(
        &self,
        collection: &str,
        id: uuid::Uuid,
        expected: Version,
    ) -> document_store::Result<()> {
        self.inner.delete(collection, id, expected).await
    }

    async fn get(
        &self,
        collection: &str,
        id: uuid::Uuid,
    ) -> document_store::Result<Option<StoredDocument>> {
        self.inner.get(collection, id).await
    }

    async fn get_by_key(
        &self,
        collection: &str,
        key: &UniqueKey,
    ) -> document_store::Result<Option<StoredDocument>> {
        self.inner.get_by_key(collection, key).await
    }

    async fn find(
        &self,
        collection: &str,
        query: DocumentQuery,
    ) -> document_store::Result<Vec<StoredDocument>> {
        self.inner.find(collection, query).await
    }
}

struct Harness {
    store: FlakyStore,
    market: Marketplace<FlakyStore>,
    log: EventLog,
    retries: InMemoryRetryQueue,
    zone: DeliveryZone,
    store_id: StoreId,
}

fn zone_pricing() -> ZonePricing {
    ZonePricing {
        delivery_fee: Money::new(5_000),
        min_order_amount: Money::new(10_000),
        free_delivery_threshold: Some(Money::new(100_000)),
        estimated_time: TimeWindow::new(20, 40),
    }
}

/// A 0.2 degree square around (106.70, 10.77).
fn city_boundary() -> ZoneBoundary {
    ZoneBoundary::from_outer(vec![
        [106.6, 10.67],
        [106.8, 10.67],
        [106.8, 10.87],
        [106.6, 10.87],
        [106.6, 10.67],
    ])
    .unwrap()
}

async fn harness() -> Harness {
    let store = FlakyStore::default();
    let log = EventLog::new();
    let retries = InMemoryRetryQueue::new();
    let market = Marketplace::builder(store.clone())
        .event_bus(EventBus::builder().subscribe(Arc::new(log.clone())).build())
        .settlement_hook(Arc::new(retries.clone()) as Arc<dyn SettlementFailureHook>)
        .config(CoordinatorConfig::default())
        .build();

    let zone = market
        .zones()
        .create_zone(NewZone::new("City", zone_pricing()).with_boundary(city_boundary()))
        .await
        .unwrap();
    let store_id = StoreId::new();
    market
        .zones()
        .register_store_zone(store_id, zone.id(), PricingOverrides::default(), 0)
        .await
        .unwrap();

    Harness {
        store,
        market,
        log,
        retries,
        zone,
        store_id,
    }
}

impl Harness {
    fn new_order(&self, price: i64, location: Option<GeoPoint>) -> NewOrder {
        let mut address = DeliveryAddress::new("Le Loi 1", "Saigon");
        address.location = location;
        NewOrder {
            customer_id: CustomerId::new(),
            store_id: self.store_id,
            items: vec![OrderItem::new("pho", "Pho", Money::new(price), 1)],
            delivery_address: address,
            zone_id: None,
            discount: Money::zero(),
            tax: Money::zero(),
            placed_by: None,
        }
    }

    async fn place(&self, price: i64) -> Order {
        self.market
            .orders()
            .place_order(self.new_order(price, Some(GeoPoint::new(106.70, 10.77))))
            .await
            .unwrap()
    }

    async fn ready(&self, price: i64) -> Order {
        let order = self.place(price).await;
        self.market
            .orders()
            .update_status(order.id(), OrderStatus::Ready, None, None)
            .await
            .unwrap()
    }

    /// An approved, available courier at `location`.
    async fn courier_at(&self, location: GeoPoint) -> (AccountId, CourierProfile) {
        let account_id = AccountId::new();
        let couriers = self.market.couriers();
        let courier = couriers
            .register_courier(account_id, 80.0, Some(self.zone.id()))
            .await
            .unwrap();
        couriers.approve_verification(courier.id()).await.unwrap();
        couriers
            .update_location(courier.id(), location)
            .await
            .unwrap();
        let courier = couriers
            .set_availability(courier.id(), CourierStatus::Available)
            .await
            .unwrap();
        (account_id, courier)
    }

    async fn accepted(&self, price: i64) -> (Order, AccountId, CourierProfile) {
        let order = self.ready(price).await;
        let (account_id, courier) = self.courier_at(GeoPoint::new(106.71, 10.78)).await;
        self.market
            .couriers()
            .assign(order.id(), courier.id(), None)
            .await
            .unwrap();
        let courier = self
            .market
            .couriers()
            .accept(account_id, order.id(), None)
            .await
            .unwrap();
        (order, account_id, courier)
    }

    async fn deliver(&self, account_id: AccountId, order: &Order) -> Order {
        let couriers = self.market.couriers();
        for status in [
            OrderStatus::PickedUp,
            OrderStatus::Delivering,
            OrderStatus::Delivered,
        ] {
            couriers
                .update_delivery_status(account_id, order.id(), status, None)
                .await
                .unwrap();
        }
        self.market.orders().get_order(order.id()).await.unwrap()
    }
}

mod placement {
    use super::*;

    #[tokio::test]
    async fn test_order_is_priced_and_zone_counted() {
        let h = harness().await;
        let order = h.place(50_000).await;

        assert_eq!(order.status(), OrderStatus::Pending);
        assert_eq!(order.zone_id(), Some(h.zone.id()));
        assert_eq!(order.delivery_fee(), Money::new(5_000));
        assert_eq!(order.total(), Money::new(55_000));
        assert!(order.order_number().starts_with("ORD-"));
        assert_eq!(order.status_history().len(), 1);

        let zone = h.market.zones().get_zone(h.zone.id()).await.unwrap();
        assert_eq!(zone.total_orders(), 1);
        assert_eq!(h.log.names().await, vec!["order.placed"]);
    }

    #[tokio::test]
    async fn test_free_delivery_over_threshold() {
        let h = harness().await;
        let order = h.place(120_000).await;
        assert_eq!(order.delivery_fee(), Money::zero());
        assert_eq!(order.total(), Money::new(120_000));
    }

    #[tokio::test]
    async fn test_below_minimum_is_rejected() {
        let h = harness().await;
        let err = h
            .market
            .orders()
            .place_order(h.new_order(5_000, Some(GeoPoint::new(106.70, 10.77))))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BadRequest);
    }

    #[tokio::test]
    async fn test_outside_every_zone_is_rejected() {
        let h = harness().await;
        let err = h
            .market
            .orders()
            .place_order(h.new_order(50_000, Some(GeoPoint::new(0.0, 0.0))))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BadRequest);
    }

    #[tokio::test]
    async fn test_oversized_amounts_are_rejected() {
        let h = harness().await;
        let mut new = h.new_order(i64::MAX, Some(GeoPoint::new(106.70, 10.77)));
        new.items[0].quantity = 2;
        let err = h.market.orders().place_order(new).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BadRequest);

        // The item alone fits (and ships free); adding tax does not.
        let mut new = h.new_order(i64::MAX, Some(GeoPoint::new(106.70, 10.77)));
        new.tax = Money::new(1);
        let err = h.market.orders().place_order(new).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BadRequest);
    }

    #[tokio::test]
    async fn test_discount_above_total_is_rejected() {
        let h = harness().await;
        let mut new = h.new_order(50_000, Some(GeoPoint::new(106.70, 10.77)));
        // 50_000 subtotal + 5_000 delivery
        new.discount = Money::new(55_001);
        let err = h.market.orders().place_order(new).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BadRequest);

        let zone = h.market.zones().get_zone(h.zone.id()).await.unwrap();
        assert_eq!(zone.total_orders(), 0);
    }

    #[tokio::test]
    async fn test_uncovered_store_is_rejected() {
        let h = harness().await;
        let mut new = h.new_order(50_000, Some(GeoPoint::new(106.70, 10.77)));
        new.store_id = StoreId::new();

        let err = h.market.orders().place_order(new).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BadRequest);
    }

    #[tokio::test]
    async fn test_explicit_zone_without_location() {
        let h = harness().await;
        let mut new = h.new_order(50_000, None);
        new.zone_id = Some(h.zone.id());

        let order = h.market.orders().place_order(new).await.unwrap();
        assert_eq!(order.zone_id(), Some(h.zone.id()));

        let err = h
            .market
            .orders()
            .place_order(h.new_order(50_000, None))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BadRequest);
    }
}

mod status {
    use super::*;

    #[tokio::test]
    async fn test_each_transition_adds_one_history_entry() {
        let h = harness().await;
        let order = h.place(50_000).await;
        let orders = h.market.orders();

        for status in [
            OrderStatus::Confirmed,
            OrderStatus::Preparing,
            OrderStatus::Ready,
        ] {
            let before = orders.get_order(order.id()).await.unwrap();
            let after = orders
                .update_status(order.id(), status, None, None)
                .await
                .unwrap();
            assert_eq!(
                after.status_history().len(),
                before.status_history().len() + 1
            );
            assert_eq!(after.status_history().last().unwrap().status, status);
        }
    }

    #[tokio::test]
    async fn test_backwards_is_conflict_and_delivery_steps_are_refused() {
        let h = harness().await;
        let order = h.ready(50_000).await;
        let orders = h.market.orders();

        let err = orders
            .update_status(order.id(), OrderStatus::Confirmed, None, None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);

        let err = orders
            .update_status(order.id(), OrderStatus::Delivered, None, None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BadRequest);

        let unchanged = orders.get_order(order.id()).await.unwrap();
        assert_eq!(unchanged.status(), OrderStatus::Ready);
        assert_eq!(unchanged.version(), order.version());
    }

    #[tokio::test]
    async fn test_stale_write_is_conflict() {
        let h = harness().await;
        let order = h.place(50_000).await;
        let repo: Repository<FlakyStore, Order> = Repository::new(h.store.clone());

        let stale = repo.load(order.id()).await.unwrap();
        h.market
            .orders()
            .update_status(order.id(), OrderStatus::Confirmed, None, None)
            .await
            .unwrap();

        let err = repo.save(stale).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn test_cancel_releases_courier() {
        let h = harness().await;
        let (order, _, courier) = h.accepted(50_000).await;
        assert_eq!(courier.status(), CourierStatus::Busy);

        let cancelled = h
            .market
            .orders()
            .cancel(order.id(), None, "store closed".to_string())
            .await
            .unwrap();
        assert_eq!(cancelled.status(), OrderStatus::Cancelled);
        assert_eq!(cancelled.cancellation_reason(), Some("store closed"));

        let courier = h.market.couriers().get_courier(courier.id()).await.unwrap();
        assert!(courier.active_deliveries().is_empty());
        assert_eq!(courier.status(), CourierStatus::Available);

        let err = h
            .market
            .orders()
            .update_status(order.id(), OrderStatus::Confirmed, None, None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }
}

mod couriers {
    use super::*;

    #[tokio::test]
    async fn test_candidates_within_radius_nearest_first() {
        let h = harness().await;
        let order = h.ready(50_000).await;

        let (_, far) = h.courier_at(GeoPoint::new(106.75, 10.77)).await;
        let (_, near) = h.courier_at(GeoPoint::new(106.701, 10.771)).await;
        let (_, outside) = h.courier_at(GeoPoint::new(107.5, 10.77)).await;
        let (_, suspended) = h.courier_at(GeoPoint::new(106.70, 10.77)).await;
        h.market
            .couriers()
            .suspend(suspended.id(), None, "complaints".to_string())
            .await
            .unwrap();

        let candidates = h.market.couriers().find_candidates(order.id()).await.unwrap();
        let ids: Vec<_> = candidates.iter().map(|c| c.courier.id()).collect();
        assert_eq!(ids, vec![near.id(), far.id()]);
        assert!(!ids.contains(&outside.id()));
        assert!(candidates[0].distance_m.unwrap() < candidates[1].distance_m.unwrap());
    }

    #[tokio::test]
    async fn test_candidates_fall_back_without_location() {
        let h = harness().await;
        let mut new = h.new_order(50_000, None);
        new.zone_id = Some(h.zone.id());
        let order = h.market.orders().place_order(new).await.unwrap();
        let (_, anywhere) = h.courier_at(GeoPoint::new(0.0, 0.0)).await;

        let candidates = h.market.couriers().find_candidates(order.id()).await.unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].courier.id(), anywhere.id());
        assert!(candidates[0].distance_m.is_none());
    }

    #[tokio::test]
    async fn test_assign_requires_ready_and_eligible_courier() {
        let h = harness().await;
        let pending = h.place(50_000).await;
        let (_, courier) = h.courier_at(GeoPoint::new(106.70, 10.77)).await;

        let err = h
            .market
            .couriers()
            .assign(pending.id(), courier.id(), None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BadRequest);

        let ready = h.ready(50_000).await;
        h.market
            .couriers()
            .suspend(courier.id(), None, "late".to_string())
            .await
            .unwrap();
        let err = h
            .market
            .couriers()
            .assign(ready.id(), courier.id(), None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BadRequest);

        h.market.couriers().unsuspend(courier.id(), None).await.unwrap();
        let assigned = h
            .market
            .couriers()
            .assign(ready.id(), courier.id(), None)
            .await
            .unwrap();
        assert_eq!(assigned.courier_id(), Some(courier.id()));

        let names = h.log.names().await;
        assert!(names.contains(&"courier.suspended".to_string()));
        assert!(names.contains(&"courier.unsuspended".to_string()));
        assert_eq!(names.last().map(String::as_str), Some("order.assigned.to.courier"));
    }

    #[tokio::test]
    async fn test_accept_by_other_courier_is_unauthorized_and_mutates_nothing() {
        let h = harness().await;
        let order = h.ready(50_000).await;
        let (_, assigned) = h.courier_at(GeoPoint::new(106.70, 10.77)).await;
        let (intruder_account, intruder) = h.courier_at(GeoPoint::new(106.70, 10.77)).await;
        let order = h
            .market
            .couriers()
            .assign(order.id(), assigned.id(), None)
            .await
            .unwrap();

        let err = h
            .market
            .couriers()
            .accept(intruder_account, order.id(), None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);

        let err = h
            .market
            .couriers()
            .accept(AccountId::new(), order.id(), None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);

        let after = h.market.orders().get_order(order.id()).await.unwrap();
        assert_eq!(after.version(), order.version());
        let intruder_after = h.market.couriers().get_courier(intruder.id()).await.unwrap();
        assert_eq!(intruder_after.version(), intruder.version());
        assert!(intruder_after.active_deliveries().is_empty());
    }

    #[tokio::test]
    async fn test_reject_unassigns() {
        let h = harness().await;
        let order = h.ready(50_000).await;
        let (account_id, courier) = h.courier_at(GeoPoint::new(106.70, 10.77)).await;
        h.market
            .couriers()
            .assign(order.id(), courier.id(), None)
            .await
            .unwrap();

        let order = h
            .market
            .couriers()
            .reject(account_id, order.id(), "too far".to_string())
            .await
            .unwrap();
        assert_eq!(order.courier_id(), None);

        let events = h.log.for_order(order.id()).await;
        match &events.last().unwrap().payload {
            MarketplaceEvent::CourierOrderRejected(data) => {
                assert_eq!(data.courier_id, courier.id());
                assert_eq!(data.reason, "too far");
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_accepted_order_stays_with_its_courier() {
        let h = harness().await;
        let (order, first_account, first) = h.accepted(50_000).await;
        let (second_account, second) = h.courier_at(GeoPoint::new(106.70, 10.77)).await;

        let err = h
            .market
            .couriers()
            .assign(order.id(), second.id(), None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
        let unchanged = h.market.orders().get_order(order.id()).await.unwrap();
        assert_eq!(unchanged.courier_id(), Some(first.id()));

        h.market
            .couriers()
            .reject(first_account, order.id(), "bike broke down".to_string())
            .await
            .unwrap();
        h.market
            .couriers()
            .assign(order.id(), second.id(), None)
            .await
            .unwrap();
        h.market
            .couriers()
            .accept(second_account, order.id(), None)
            .await
            .unwrap();

        let first = h.market.couriers().get_courier(first.id()).await.unwrap();
        assert!(first.active_deliveries().is_empty());
        assert_eq!(first.status(), CourierStatus::Available);
        let second = h.market.couriers().get_courier(second.id()).await.unwrap();
        assert_eq!(second.active_deliveries(), &[order.id()]);
        assert_eq!(second.status(), CourierStatus::Busy);
    }

    #[tokio::test]
    async fn test_unaccepted_order_can_be_reassigned() {
        let h = harness().await;
        let order = h.ready(50_000).await;
        let (_, first) = h.courier_at(GeoPoint::new(106.70, 10.77)).await;
        let (_, second) = h.courier_at(GeoPoint::new(106.70, 10.77)).await;

        h.market
            .couriers()
            .assign(order.id(), first.id(), None)
            .await
            .unwrap();
        let order = h
            .market
            .couriers()
            .assign(order.id(), second.id(), None)
            .await
            .unwrap();
        assert_eq!(order.courier_id(), Some(second.id()));
    }

    #[tokio::test]
    async fn test_reject_after_pickup_is_refused() {
        let h = harness().await;
        let (order, account_id, courier) = h.accepted(50_000).await;
        h.market
            .couriers()
            .update_delivery_status(account_id, order.id(), OrderStatus::PickedUp, None)
            .await
            .unwrap();

        let err = h
            .market
            .couriers()
            .reject(account_id, order.id(), "changed my mind".to_string())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BadRequest);

        let order = h.market.orders().get_order(order.id()).await.unwrap();
        assert_eq!(order.courier_id(), Some(courier.id()));
        let courier = h.market.couriers().get_courier(courier.id()).await.unwrap();
        assert_eq!(courier.active_deliveries(), &[order.id()]);
    }

    #[tokio::test]
    async fn test_courier_cannot_report_store_statuses() {
        let h = harness().await;
        let (order, account_id, _) = h.accepted(50_000).await;

        let err = h
            .market
            .couriers()
            .update_delivery_status(account_id, order.id(), OrderStatus::Preparing, None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BadRequest);
    }

    #[tokio::test]
    async fn test_zone_counts_on_duty_couriers() {
        let h = harness().await;
        let (_, courier) = h.courier_at(GeoPoint::new(106.70, 10.77)).await;
        let zone = h.market.zones().get_zone(h.zone.id()).await.unwrap();
        assert_eq!(zone.active_couriers(), 1);

        h.market
            .couriers()
            .set_availability(courier.id(), CourierStatus::OnBreak)
            .await
            .unwrap();
        let zone = h.market.zones().get_zone(h.zone.id()).await.unwrap();
        assert_eq!(zone.active_couriers(), 0);
    }

    #[tokio::test]
    async fn test_busy_courier_cannot_go_offline() {
        let h = harness().await;
        let (_, _, courier) = h.accepted(50_000).await;

        let err = h
            .market
            .couriers()
            .set_availability(courier.id(), CourierStatus::Offline)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn test_account_registers_once() {
        let h = harness().await;
        let account_id = AccountId::new();
        h.market
            .couriers()
            .register_courier(account_id, 80.0, None)
            .await
            .unwrap();

        let err = h
            .market
            .couriers()
            .register_courier(account_id, 80.0, None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }
}

mod delivery {
    use super::*;

    #[tokio::test]
    async fn test_delivery_settles_cash_and_frees_courier() {
        let h = harness().await;
        let (order, account_id, courier) = h.accepted(50_000).await;
        h.market
            .payments()
            .create(order.id(), PaymentMethod::Cash)
            .await
            .unwrap();
        assert_eq!(courier.active_deliveries(), &[order.id()]);

        let delivered = h.deliver(account_id, &order).await;

        assert_eq!(delivered.status(), OrderStatus::Delivered);
        assert!(delivered.actual_delivery_time().is_some());
        assert_eq!(delivered.payment_status(), OrderPaymentStatus::Paid);

        let payment = h
            .market
            .payments()
            .get_by_order(order.id())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(payment.status(), PaymentStatus::Completed);
        assert_eq!(payment.confirmed_by(), Some(account_id));

        let courier = h.market.couriers().get_courier(courier.id()).await.unwrap();
        assert_eq!(courier.status(), CourierStatus::Available);
        assert!(courier.active_deliveries().is_empty());
        assert_eq!(courier.total_deliveries(), 1);
        // 80% of the 5000 delivery fee
        assert_eq!(courier.total_earnings(), Money::new(4_000));

        let names: Vec<String> = h
            .log
            .for_order(order.id())
            .await
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(
            names,
            vec![
                "order.placed",
                "order.status.updated",
                "order.assigned.to.courier",
                "courier.order.accepted",
                "delivery.status.updated",
                "delivery.status.updated",
                "payment.completed",
                "delivery.status.updated",
            ]
        );
        assert!(h.retries.is_empty().await);
    }

    #[tokio::test]
    async fn test_delivery_without_accept_keeps_offline_courier_off_duty() {
        let h = harness().await;
        let order = h.ready(50_000).await;
        let account_id = AccountId::new();
        let couriers = h.market.couriers();
        let courier = couriers
            .register_courier(account_id, 80.0, Some(h.zone.id()))
            .await
            .unwrap();
        couriers.approve_verification(courier.id()).await.unwrap();
        couriers.assign(order.id(), courier.id(), None).await.unwrap();

        let delivered = h.deliver(account_id, &order).await;
        assert_eq!(delivered.status(), OrderStatus::Delivered);

        let courier = couriers.get_courier(courier.id()).await.unwrap();
        assert_eq!(courier.status(), CourierStatus::Offline);
        assert_eq!(courier.total_deliveries(), 1);
        let zone = h.market.zones().get_zone(h.zone.id()).await.unwrap();
        assert_eq!(zone.active_couriers(), 0);
    }

    #[tokio::test]
    async fn test_card_payment_is_left_alone() {
        let h = harness().await;
        let (order, account_id, _) = h.accepted(50_000).await;
        h.market
            .payments()
            .process(order.id(), PaymentMethod::Card, Default::default())
            .await
            .unwrap();

        let delivered = h.deliver(account_id, &order).await;

        assert_eq!(delivered.payment_status(), OrderPaymentStatus::Pending);
        let payment = h
            .market
            .payments()
            .get_by_order(order.id())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(payment.status(), PaymentStatus::Processing);
        assert!(h.retries.is_empty().await);
    }

    #[tokio::test]
    async fn test_settlement_failure_goes_to_hook_and_delivery_stands() {
        let h = harness().await;
        let (order, account_id, courier) = h.accepted(50_000).await;
        h.market
            .payments()
            .create(order.id(), PaymentMethod::Cash)
            .await
            .unwrap();
        let couriers = h.market.couriers();
        couriers
            .update_delivery_status(account_id, order.id(), OrderStatus::PickedUp, None)
            .await
            .unwrap();

        h.store.set_fail_on_replace(Some("payments")).await;
        let delivered = couriers
            .update_delivery_status(
                account_id,
                order.id(),
                OrderStatus::Delivered,
                Some("photo-1".to_string()),
            )
            .await
            .unwrap();
        h.store.set_fail_on_replace(None).await;

        assert_eq!(delivered.status(), OrderStatus::Delivered);
        assert_eq!(delivered.payment_status(), OrderPaymentStatus::Pending);
        let courier = couriers.get_courier(courier.id()).await.unwrap();
        assert_eq!(courier.total_deliveries(), 1);

        let failures = h.retries.drain().await;
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].order_id, order.id());
        assert_eq!(failures[0].confirmer, Some(account_id));
        assert_eq!(failures[0].kind, ErrorKind::Internal);

        // A retry from the queue completes the settlement.
        let payment = h
            .market
            .payments()
            .confirm_cash_by_order_id(failures[0].order_id, failures[0].confirmer)
            .await
            .unwrap();
        assert_eq!(payment.status(), PaymentStatus::Completed);
        let order = h.market.orders().get_order(order.id()).await.unwrap();
        assert_eq!(order.payment_status(), OrderPaymentStatus::Paid);
    }
}
