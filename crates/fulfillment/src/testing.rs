//! Shared fixtures for unit tests.

use std::sync::Arc;

use common::{CustomerId, Money, StoreId};
use document_store::InMemoryDocumentStore;
use domain::{
    DeliveryAddress, Order, OrderDraft, OrderItem, Repository, TimeWindow, ZoneBoundary,
    ZonePricing,
};
use event_bus::{EventBus, EventLog};

use crate::payments::PaymentLedger;
use crate::zones::ZoneService;

pub struct TestContext {
    pub store: InMemoryDocumentStore,
    pub ledger: PaymentLedger<InMemoryDocumentStore>,
    pub zones: ZoneService<InMemoryDocumentStore>,
    pub orders: Repository<InMemoryDocumentStore, Order>,
    pub log: EventLog,
}

pub fn setup() -> TestContext {
    let store = InMemoryDocumentStore::new();
    let log = EventLog::new();
    let bus = EventBus::builder().subscribe(Arc::new(log.clone())).build();

    TestContext {
        ledger: PaymentLedger::new(store.clone(), bus),
        zones: ZoneService::new(store.clone()),
        orders: Repository::new(store.clone()),
        store,
        log,
    }
}

/// Stores an order whose total equals `price`.
pub async fn place_order(store: &InMemoryDocumentStore, price: i64) -> Order {
    let order = Order::place(
        OrderDraft {
            customer_id: CustomerId::new(),
            store_id: StoreId::new(),
            items: vec![OrderItem::new("sku-1", "Meal", Money::new(price), 1)],
            delivery_address: DeliveryAddress::new("Main St 1", "Town"),
            zone_id: None,
            delivery_fee: Money::zero(),
            discount: Money::zero(),
            tax: Money::zero(),
        },
        None,
    )
    .unwrap();
    Repository::new(store.clone()).insert(order).await.unwrap()
}

pub fn pricing() -> ZonePricing {
    ZonePricing {
        delivery_fee: Money::new(5_000),
        min_order_amount: Money::zero(),
        free_delivery_threshold: None,
        estimated_time: TimeWindow::new(20, 40),
    }
}

/// A closed square ring with its south-west corner at (`lng`, `lat`).
pub fn square(lng: f64, lat: f64, size: f64) -> ZoneBoundary {
    ZoneBoundary::from_outer(vec![
        [lng, lat],
        [lng + size, lat],
        [lng + size, lat + size],
        [lng, lat + size],
        [lng, lat],
    ])
    .unwrap()
}
