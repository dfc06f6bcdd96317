//! Store coverage of delivery zones.

use chrono::{DateTime, Utc};
use common::{Money, StoreId, StoreZoneId, ZoneId};
use document_store::{UniqueKey, Version};
use serde::{Deserialize, Serialize};

use crate::document::Document;

use super::ZoneError;

/// Per-store pricing that replaces the zone default field by field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PricingOverrides {
    pub delivery_fee: Option<Money>,
    pub min_order_amount: Option<Money>,
    pub free_delivery_threshold: Option<Money>,
    pub estimated_time_min: Option<u32>,
    pub estimated_time_max: Option<u32>,
}

impl PricingOverrides {
    pub fn validate(&self) -> Result<(), ZoneError> {
        let negative = [
            self.delivery_fee,
            self.min_order_amount,
            self.free_delivery_threshold,
        ]
        .into_iter()
        .flatten()
        .any(|amount| amount.is_negative());
        if negative {
            return Err(ZoneError::InvalidPricing {
                reason: "override amounts must not be negative".to_string(),
            });
        }
        if let (Some(min), Some(max)) = (self.estimated_time_min, self.estimated_time_max)
            && min > max
        {
            return Err(ZoneError::InvalidPricing {
                reason: format!("estimated time {min}-{max} minutes is inverted"),
            });
        }
        Ok(())
    }
}

/// Registration of a store as delivering into a zone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreDeliveryZone {
    id: StoreZoneId,

    #[serde(skip)]
    version: Version,

    store_id: StoreId,
    zone_id: ZoneId,
    overrides: PricingOverrides,

    /// Higher priority zones are listed first for the store.
    priority: i32,

    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Document for StoreDeliveryZone {
    type Id = StoreZoneId;

    fn collection() -> &'static str {
        "store_zones"
    }

    fn document_type() -> &'static str {
        "StoreDeliveryZone"
    }

    fn id(&self) -> StoreZoneId {
        self.id
    }

    fn version(&self) -> Version {
        self.version
    }

    fn set_version(&mut self, version: Version) {
        self.version = version;
    }

    fn unique_keys(&self) -> Vec<UniqueKey> {
        vec![StoreDeliveryZone::pair_key(self.store_id, self.zone_id)]
    }
}

impl StoreDeliveryZone {
    /// Unique key of a (store, zone) pair.
    pub fn pair_key(store_id: StoreId, zone_id: ZoneId) -> UniqueKey {
        UniqueKey::new("store_zone", format!("{store_id}:{zone_id}"))
    }

    pub fn new(
        store_id: StoreId,
        zone_id: ZoneId,
        overrides: PricingOverrides,
        priority: i32,
    ) -> Result<Self, ZoneError> {
        overrides.validate()?;
        let now = Utc::now();
        Ok(Self {
            id: StoreZoneId::new(),
            version: Version::initial(),
            store_id,
            zone_id,
            overrides,
            priority,
            is_active: true,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn store_id(&self) -> StoreId {
        self.store_id
    }

    pub fn zone_id(&self) -> ZoneId {
        self.zone_id
    }

    pub fn overrides(&self) -> &PricingOverrides {
        &self.overrides
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn set_overrides(&mut self, overrides: PricingOverrides) -> Result<(), ZoneError> {
        overrides.validate()?;
        self.overrides = overrides;
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn set_priority(&mut self, priority: i32) {
        self.priority = priority;
        self.updated_at = Utc::now();
    }

    /// Returns true if the flag actually changed.
    pub fn set_active(&mut self, active: bool) -> bool {
        if self.is_active == active {
            return false;
        }
        self.is_active = active;
        self.updated_at = Utc::now();
        true
    }
}
