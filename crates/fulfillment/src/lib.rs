//! Order fulfillment and payment reconciliation.
//!
//! The services here coordinate the order, payment and courier documents:
//! - [`OrderService`] places orders and applies store status changes
//! - [`PaymentLedger`] runs the payment lifecycle and mirrors it onto orders
//! - [`CourierCoordinator`] matches couriers and drives deliveries
//! - [`ZoneService`] owns delivery zones, store coverage and pricing
//!
//! Every status write goes through [`OrderLifecycle::advance`]. When an
//! order is delivered its open cash payment is confirmed; if that fails the
//! delivery still stands and the failure goes to a [`SettlementFailureHook`].

pub mod config;
pub mod couriers;
pub mod error;
pub mod lifecycle;
pub mod marketplace;
pub mod orders;
pub mod payments;
pub mod settlement;
pub mod zones;

#[cfg(test)]
pub(crate) mod testing;

pub use config::CoordinatorConfig;
pub use couriers::{CourierCandidate, CourierCoordinator};
pub use error::{ErrorResponse, FulfillmentError, Result};
pub use lifecycle::OrderLifecycle;
pub use marketplace::{Marketplace, MarketplaceBuilder};
pub use orders::{NewOrder, OrderService};
pub use payments::PaymentLedger;
pub use settlement::{
    InMemoryRetryQueue, LogOnlyHook, SettlementFailure, SettlementFailureHook,
};
pub use zones::{NearbyZone, NewZone, ZoneService, ZoneUpdate};
