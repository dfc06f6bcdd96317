//! Wiring of the fulfillment services over one store and one bus.

use std::sync::Arc;

use document_store::DocumentStore;
use event_bus::EventBus;

use crate::config::CoordinatorConfig;
use crate::couriers::CourierCoordinator;
use crate::lifecycle::OrderLifecycle;
use crate::orders::OrderService;
use crate::payments::PaymentLedger;
use crate::settlement::{LogOnlyHook, SettlementFailureHook};
use crate::zones::ZoneService;

/// All fulfillment services, sharing a store, an event bus and a settlement hook.
pub struct Marketplace<S: DocumentStore> {
    orders: OrderService<S>,
    payments: PaymentLedger<S>,
    couriers: CourierCoordinator<S>,
    zones: ZoneService<S>,
    bus: EventBus,
}

impl<S: DocumentStore + Clone> Clone for Marketplace<S> {
    fn clone(&self) -> Self {
        Self {
            orders: self.orders.clone(),
            payments: self.payments.clone(),
            couriers: self.couriers.clone(),
            zones: self.zones.clone(),
            bus: self.bus.clone(),
        }
    }
}

impl<S: DocumentStore + Clone> Marketplace<S> {
    pub fn builder(store: S) -> MarketplaceBuilder<S> {
        MarketplaceBuilder {
            store,
            bus: EventBus::empty(),
            settlement_hook: Arc::new(LogOnlyHook),
            config: CoordinatorConfig::default(),
        }
    }

    pub fn orders(&self) -> &OrderService<S> {
        &self.orders
    }

    pub fn payments(&self) -> &PaymentLedger<S> {
        &self.payments
    }

    pub fn couriers(&self) -> &CourierCoordinator<S> {
        &self.couriers
    }

    pub fn zones(&self) -> &ZoneService<S> {
        &self.zones
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }
}

pub struct MarketplaceBuilder<S: DocumentStore> {
    store: S,
    bus: EventBus,
    settlement_hook: Arc<dyn SettlementFailureHook>,
    config: CoordinatorConfig,
}

impl<S: DocumentStore + Clone> MarketplaceBuilder<S> {
    pub fn event_bus(mut self, bus: EventBus) -> Self {
        self.bus = bus;
        self
    }

    pub fn settlement_hook(mut self, hook: Arc<dyn SettlementFailureHook>) -> Self {
        self.settlement_hook = hook;
        self
    }

    pub fn config(mut self, config: CoordinatorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Marketplace<S> {
        let zones = ZoneService::new(self.store.clone());
        let payments = PaymentLedger::new(self.store.clone(), self.bus.clone());
        let lifecycle = OrderLifecycle::new(self.store.clone(), payments.clone(), self.settlement_hook);
        let orders = OrderService::new(
            self.store.clone(),
            zones.clone(),
            lifecycle.clone(),
            self.bus.clone(),
        );
        let couriers = CourierCoordinator::new(
            self.store,
            zones.clone(),
            lifecycle,
            self.bus.clone(),
            self.config,
        );

        Marketplace {
            orders,
            payments,
            couriers,
            zones,
            bus: self.bus,
        }
    }
}
