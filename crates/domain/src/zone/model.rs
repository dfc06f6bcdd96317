//! Delivery zone document.

use chrono::{DateTime, Utc};
use common::{GeoPoint, Money, ZoneId};
use document_store::{UniqueKey, Version};
use serde::{Deserialize, Serialize};

use crate::document::Document;

use super::{ZoneBoundary, ZoneError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ZoneStatus {
    #[default]
    Active,
    Inactive,
    Suspended,
}

/// Estimated delivery time range in minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub min_minutes: u32,
    pub max_minutes: u32,
}

impl TimeWindow {
    pub fn new(min_minutes: u32, max_minutes: u32) -> Self {
        Self {
            min_minutes,
            max_minutes,
        }
    }
}

/// Default delivery pricing of a zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZonePricing {
    pub delivery_fee: Money,
    pub min_order_amount: Money,

    /// Orders at or above this amount deliver for free.
    pub free_delivery_threshold: Option<Money>,

    pub estimated_time: TimeWindow,
}

impl ZonePricing {
    pub fn validate(&self) -> Result<(), ZoneError> {
        let negative = self.delivery_fee.is_negative()
            || self.min_order_amount.is_negative()
            || self.free_delivery_threshold.is_some_and(|t| t.is_negative());
        if negative {
            return Err(ZoneError::InvalidPricing {
                reason: "amounts must not be negative".to_string(),
            });
        }
        if self.estimated_time.min_minutes > self.estimated_time.max_minutes {
            return Err(ZoneError::InvalidPricing {
                reason: format!(
                    "estimated time {}-{} minutes is inverted",
                    self.estimated_time.min_minutes, self.estimated_time.max_minutes
                ),
            });
        }
        Ok(())
    }
}

/// A geographic delivery zone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryZone {
    id: ZoneId,

    #[serde(skip)]
    version: Version,

    parent_id: Option<ZoneId>,
    name: String,
    description: Option<String>,
    pricing: ZonePricing,
    boundary: Option<ZoneBoundary>,
    center: Option<GeoPoint>,
    status: ZoneStatus,

    // Maintained by the coordinator as orders, stores and couriers come and go.
    total_orders: u64,
    active_stores: u32,
    active_couriers: u32,

    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Document for DeliveryZone {
    type Id = ZoneId;

    fn collection() -> &'static str {
        "zones"
    }

    fn document_type() -> &'static str {
        "Zone"
    }

    fn id(&self) -> ZoneId {
        self.id
    }

    fn version(&self) -> Version {
        self.version
    }

    fn set_version(&mut self, version: Version) {
        self.version = version;
    }

    fn unique_keys(&self) -> Vec<UniqueKey> {
        vec![DeliveryZone::name_key(&self.name)]
    }
}

impl DeliveryZone {
    pub fn name_key(name: &str) -> UniqueKey {
        UniqueKey::new("name", name)
    }

    pub fn new(
        name: impl Into<String>,
        parent_id: Option<ZoneId>,
        pricing: ZonePricing,
    ) -> Result<Self, ZoneError> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(ZoneError::NameRequired);
        }
        pricing.validate()?;

        let now = Utc::now();
        Ok(Self {
            id: ZoneId::new(),
            version: Version::initial(),
            parent_id,
            name,
            description: None,
            pricing,
            boundary: None,
            center: None,
            status: ZoneStatus::Active,
            total_orders: 0,
            active_stores: 0,
            active_couriers: 0,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_boundary(mut self, boundary: ZoneBoundary) -> Self {
        self.set_boundary(boundary);
        self
    }
}

// Query methods
impl DeliveryZone {
    pub fn parent_id(&self) -> Option<ZoneId> {
        self.parent_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn pricing(&self) -> &ZonePricing {
        &self.pricing
    }

    pub fn boundary(&self) -> Option<&ZoneBoundary> {
        self.boundary.as_ref()
    }

    pub fn center(&self) -> Option<GeoPoint> {
        self.center
    }

    pub fn status(&self) -> ZoneStatus {
        self.status
    }

    pub fn is_active(&self) -> bool {
        self.status == ZoneStatus::Active
    }

    pub fn total_orders(&self) -> u64 {
        self.total_orders
    }

    pub fn active_stores(&self) -> u32 {
        self.active_stores
    }

    pub fn active_couriers(&self) -> u32 {
        self.active_couriers
    }

    /// Returns true if the zone has a polygon containing `point`.
    pub fn contains(&self, point: &GeoPoint) -> bool {
        self.boundary
            .as_ref()
            .is_some_and(|boundary| boundary.contains(point))
    }

    /// Distance in metres from the zone center.
    pub fn distance_to(&self, point: &GeoPoint) -> Option<f64> {
        self.center.map(|center| center.distance_m(point))
    }
}

// Mutations
impl DeliveryZone {
    pub fn rename(&mut self, name: impl Into<String>) -> Result<(), ZoneError> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(ZoneError::NameRequired);
        }
        self.name = name;
        self.touch();
        Ok(())
    }

    pub fn set_description(&mut self, description: Option<String>) {
        self.description = description;
        self.touch();
    }

    pub fn set_pricing(&mut self, pricing: ZonePricing) -> Result<(), ZoneError> {
        pricing.validate()?;
        self.pricing = pricing;
        self.touch();
        Ok(())
    }

    pub fn set_parent(&mut self, parent_id: Option<ZoneId>) -> Result<(), ZoneError> {
        if parent_id == Some(self.id) {
            return Err(ZoneError::ParentCycle);
        }
        self.parent_id = parent_id;
        self.touch();
        Ok(())
    }

    /// Sets the polygon and recomputes the center from it.
    pub fn set_boundary(&mut self, boundary: ZoneBoundary) {
        self.center = boundary.center();
        self.boundary = Some(boundary);
        self.touch();
    }

    pub fn set_status(&mut self, status: ZoneStatus) {
        self.status = status;
        self.touch();
    }

    pub fn record_order(&mut self) {
        self.total_orders += 1;
        self.touch();
    }

    pub fn store_activated(&mut self) {
        self.active_stores += 1;
        self.touch();
    }

    pub fn store_deactivated(&mut self) {
        self.active_stores = self.active_stores.saturating_sub(1);
        self.touch();
    }

    pub fn courier_on_duty(&mut self) {
        self.active_couriers += 1;
        self.touch();
    }

    pub fn courier_off_duty(&mut self) {
        self.active_couriers = self.active_couriers.saturating_sub(1);
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
