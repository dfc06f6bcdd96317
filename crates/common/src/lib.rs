//! Shared types for the marketplace fulfillment coordinator.
//!
//! - Typed identifiers for every entity the coordinator touches
//! - [`Money`] amounts in minor currency units
//! - [`GeoPoint`] coordinates with haversine distance

pub mod geo_point;
pub mod ids;
pub mod money;

pub use geo_point::GeoPoint;
pub use ids::{
    AccountId, CourierId, CustomerId, OrderId, PaymentId, StoreId, StoreZoneId, ZoneId,
};
pub use money::Money;
