//! Delivery zones, store coverage and delivery pricing.

mod boundary;
mod model;
mod pricing;
mod store_zone;

pub use boundary::ZoneBoundary;
pub use model::{DeliveryZone, TimeWindow, ZonePricing, ZoneStatus};
pub use pricing::FeeQuote;
pub use store_zone::{PricingOverrides, StoreDeliveryZone};

use common::{Money, StoreId, ZoneId};
use thiserror::Error;

use crate::error::ErrorKind;

/// Errors that can occur during zone and pricing operations.
#[derive(Debug, Error)]
pub enum ZoneError {
    #[error("Zone name is required")]
    NameRequired,

    #[error("Invalid zone pricing: {reason}")]
    InvalidPricing { reason: String },

    #[error("Invalid zone boundary: {reason}")]
    InvalidBoundary { reason: String },

    /// The order is too small for delivery into the zone.
    #[error("Minimum order amount is {minimum}, got {amount}")]
    BelowMinimumOrder { amount: Money, minimum: Money },

    #[error("Zone name '{name}' is already taken")]
    NameTaken { name: String },

    #[error("Zone {zone_id} has child zones")]
    HasChildren { zone_id: ZoneId },

    #[error("Store {store_id} does not deliver to zone {zone_id}")]
    NotCovered { store_id: StoreId, zone_id: ZoneId },

    #[error("Store {store_id} is already registered for zone {zone_id}")]
    AlreadyCovered { store_id: StoreId, zone_id: ZoneId },

    #[error("Zone {zone_id} is not active")]
    Inactive { zone_id: ZoneId },

    /// No active zone contains the delivery location.
    #[error("No delivery zone covers ({lng}, {lat})")]
    NoZoneAtLocation { lng: f64, lat: f64 },

    /// The new parent is the zone itself or one of its descendants.
    #[error("A zone cannot be nested under itself")]
    ParentCycle,
}

impl ZoneError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ZoneError::NameTaken { .. }
            | ZoneError::HasChildren { .. }
            | ZoneError::AlreadyCovered { .. } => ErrorKind::Conflict,
            ZoneError::NameRequired
            | ZoneError::InvalidPricing { .. }
            | ZoneError::InvalidBoundary { .. }
            | ZoneError::BelowMinimumOrder { .. }
            | ZoneError::NotCovered { .. }
            | ZoneError::Inactive { .. }
            | ZoneError::NoZoneAtLocation { .. }
            | ZoneError::ParentCycle => ErrorKind::BadRequest,
        }
    }
}
