//! Delivery zones, store coverage and delivery pricing.

use std::collections::HashSet;

use common::{GeoPoint, Money, StoreId, ZoneId};
use document_store::{DocumentQuery, DocumentStore};
use domain::{
    DeliveryZone, Document, FeeQuote, PricingOverrides, Repository, StoreDeliveryZone,
    ZoneBoundary, ZoneError, ZonePricing, ZoneStatus,
};

use crate::error::Result;

/// Input for [`ZoneService::create_zone`].
#[derive(Debug, Clone)]
pub struct NewZone {
    pub name: String,
    pub parent_id: Option<ZoneId>,
    pub description: Option<String>,
    pub pricing: ZonePricing,
    pub boundary: Option<ZoneBoundary>,
}

impl NewZone {
    pub fn new(name: impl Into<String>, pricing: ZonePricing) -> Self {
        Self {
            name: name.into(),
            parent_id: None,
            description: None,
            pricing,
            boundary: None,
        }
    }

    pub fn with_boundary(mut self, boundary: ZoneBoundary) -> Self {
        self.boundary = Some(boundary);
        self
    }

    pub fn within(mut self, parent_id: ZoneId) -> Self {
        self.parent_id = Some(parent_id);
        self
    }
}

/// Changes applied by [`ZoneService::update_zone`]. `None` leaves a field as is.
#[derive(Debug, Clone, Default)]
pub struct ZoneUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub pricing: Option<ZonePricing>,
    pub parent_id: Option<ZoneId>,
}

/// A zone whose center lies near a point.
#[derive(Debug, Clone)]
pub struct NearbyZone {
    pub zone: DeliveryZone,
    pub distance_m: f64,
}

/// Zone CRUD, store coverage and fee calculation.
pub struct ZoneService<S: DocumentStore> {
    zones: Repository<S, DeliveryZone>,
    store_zones: Repository<S, StoreDeliveryZone>,
}

impl<S: DocumentStore + Clone> Clone for ZoneService<S> {
    fn clone(&self) -> Self {
        Self {
            zones: self.zones.clone(),
            store_zones: self.store_zones.clone(),
        }
    }
}

impl<S: DocumentStore + Clone> ZoneService<S> {
    pub fn new(store: S) -> Self {
        Self {
            zones: Repository::new(store.clone()),
            store_zones: Repository::new(store),
        }
    }

    pub async fn get_zone(&self, zone_id: ZoneId) -> Result<DeliveryZone> {
        Ok(self.zones.load(zone_id).await?)
    }

    async fn ensure_name_free(&self, name: &str, owner: Option<ZoneId>) -> Result<()> {
        let name = name.trim();
        match self.zones.get_by_key(&DeliveryZone::name_key(name)).await? {
            Some(existing) if Some(existing.id()) != owner => Err(ZoneError::NameTaken {
                name: name.to_string(),
            }
            .into()),
            _ => Ok(()),
        }
    }

    #[tracing::instrument(skip(self, new), fields(name = %new.name))]
    pub async fn create_zone(&self, new: NewZone) -> Result<DeliveryZone> {
        if let Some(parent_id) = new.parent_id {
            self.zones.load(parent_id).await?;
        }
        self.ensure_name_free(&new.name, None).await?;

        let mut zone = DeliveryZone::new(new.name, new.parent_id, new.pricing)?;
        if let Some(description) = new.description {
            zone = zone.with_description(description);
        }
        if let Some(boundary) = new.boundary {
            zone = zone.with_boundary(boundary);
        }

        let zone = self.zones.insert(zone).await?;
        tracing::info!(zone_id = %zone.id(), "zone created");
        Ok(zone)
    }

    #[tracing::instrument(skip(self, update))]
    pub async fn update_zone(&self, zone_id: ZoneId, update: ZoneUpdate) -> Result<DeliveryZone> {
        if let Some(name) = &update.name {
            self.ensure_name_free(name, Some(zone_id)).await?;
        }
        if let Some(parent_id) = update.parent_id {
            self.ensure_not_descendant(zone_id, parent_id).await?;
        }

        Ok(self
            .zones
            .update(zone_id, |zone| {
                if let Some(name) = update.name {
                    zone.rename(name)?;
                }
                if let Some(description) = update.description {
                    zone.set_description(Some(description));
                }
                if let Some(pricing) = update.pricing {
                    zone.set_pricing(pricing)?;
                }
                if let Some(parent_id) = update.parent_id {
                    zone.set_parent(Some(parent_id))?;
                }
                Ok::<_, ZoneError>(())
            })
            .await?)
    }

    /// Walks up from `parent_id` and fails if `zone_id` is among its ancestors.
    async fn ensure_not_descendant(&self, zone_id: ZoneId, parent_id: ZoneId) -> Result<()> {
        let mut seen = HashSet::new();
        let mut next = Some(parent_id);
        while let Some(id) = next {
            if id == zone_id {
                return Err(ZoneError::ParentCycle.into());
            }
            if !seen.insert(id) {
                break;
            }
            next = self.zones.load(id).await?.parent_id();
        }
        Ok(())
    }

    /// Sets the zone polygon; the center becomes the average of its outer ring.
    pub async fn set_boundary(&self, zone_id: ZoneId, boundary: ZoneBoundary) -> Result<DeliveryZone> {
        Ok(self
            .zones
            .update(zone_id, |zone| {
                zone.set_boundary(boundary);
                Ok::<_, ZoneError>(())
            })
            .await?)
    }

    pub async fn set_zone_status(&self, zone_id: ZoneId, status: ZoneStatus) -> Result<DeliveryZone> {
        let zone = self
            .zones
            .update(zone_id, |zone| {
                zone.set_status(status);
                Ok::<_, ZoneError>(())
            })
            .await?;
        tracing::info!(%zone_id, ?status, "zone status changed");
        Ok(zone)
    }

    /// Lists zones by name: all of them, or the children of `parent_id`.
    pub async fn list_zones(&self, parent_id: Option<ZoneId>) -> Result<Vec<DeliveryZone>> {
        let query = match parent_id {
            Some(parent_id) => DocumentQuery::new().eq("parent_id", parent_id),
            None => DocumentQuery::new(),
        };
        let mut zones = self.zones.find(query).await?;
        zones.sort_by(|a, b| a.name().cmp(b.name()));
        Ok(zones)
    }

    /// Deletes a zone. Zones with children cannot be deleted.
    #[tracing::instrument(skip(self))]
    pub async fn delete_zone(&self, zone_id: ZoneId) -> Result<()> {
        let zone = self.zones.load(zone_id).await?;
        let children = self
            .zones
            .find(DocumentQuery::new().eq("parent_id", zone_id).limit(1))
            .await?;
        if !children.is_empty() {
            return Err(ZoneError::HasChildren { zone_id }.into());
        }
        self.zones.delete(&zone).await?;
        tracing::info!(%zone_id, "zone deleted");
        Ok(())
    }

    async fn adjust_zone<F>(&self, zone_id: ZoneId, change: F) -> Result<DeliveryZone>
    where
        F: FnOnce(&mut DeliveryZone),
    {
        Ok(self
            .zones
            .update(zone_id, |zone| {
                change(zone);
                Ok::<_, ZoneError>(())
            })
            .await?)
    }

    pub(crate) async fn record_order(&self, zone_id: ZoneId) -> Result<()> {
        self.adjust_zone(zone_id, DeliveryZone::record_order).await?;
        Ok(())
    }

    /// Keeps a zone's active courier count in step with a duty change.
    pub(crate) async fn courier_duty_changed(
        &self,
        zone_id: Option<ZoneId>,
        was_on_duty: bool,
        is_on_duty: bool,
    ) -> Result<()> {
        let Some(zone_id) = zone_id else {
            return Ok(());
        };
        match (was_on_duty, is_on_duty) {
            (false, true) => {
                self.adjust_zone(zone_id, DeliveryZone::courier_on_duty)
                    .await?;
            }
            (true, false) => {
                self.adjust_zone(zone_id, DeliveryZone::courier_off_duty)
                    .await?;
            }
            _ => {}
        }
        Ok(())
    }

    async fn coverage(&self, store_id: StoreId, zone_id: ZoneId) -> Result<Option<StoreDeliveryZone>> {
        Ok(self
            .store_zones
            .get_by_key(&StoreDeliveryZone::pair_key(store_id, zone_id))
            .await?)
    }

    async fn load_coverage(&self, store_id: StoreId, zone_id: ZoneId) -> Result<StoreDeliveryZone> {
        self.coverage(store_id, zone_id)
            .await?
            .ok_or_else(|| ZoneError::NotCovered { store_id, zone_id }.into())
    }

    /// Registers a store as delivering into a zone.
    #[tracing::instrument(skip(self, overrides))]
    pub async fn register_store_zone(
        &self,
        store_id: StoreId,
        zone_id: ZoneId,
        overrides: PricingOverrides,
        priority: i32,
    ) -> Result<StoreDeliveryZone> {
        self.zones.load(zone_id).await?;
        if self.coverage(store_id, zone_id).await?.is_some() {
            return Err(ZoneError::AlreadyCovered { store_id, zone_id }.into());
        }

        let coverage = StoreDeliveryZone::new(store_id, zone_id, overrides, priority)?;
        let coverage = self.store_zones.insert(coverage).await?;
        self.adjust_zone(zone_id, DeliveryZone::store_activated)
            .await?;

        tracing::info!("store registered for zone");
        Ok(coverage)
    }

    pub async fn update_store_zone(
        &self,
        store_id: StoreId,
        zone_id: ZoneId,
        overrides: Option<PricingOverrides>,
        priority: Option<i32>,
    ) -> Result<StoreDeliveryZone> {
        let mut coverage = self.load_coverage(store_id, zone_id).await?;
        if let Some(overrides) = overrides {
            coverage.set_overrides(overrides)?;
        }
        if let Some(priority) = priority {
            coverage.set_priority(priority);
        }
        Ok(self.store_zones.save(coverage).await?)
    }

    /// Turns a store's coverage of a zone on or off.
    pub async fn set_store_zone_active(
        &self,
        store_id: StoreId,
        zone_id: ZoneId,
        active: bool,
    ) -> Result<StoreDeliveryZone> {
        let mut coverage = self.load_coverage(store_id, zone_id).await?;
        if !coverage.set_active(active) {
            return Ok(coverage);
        }

        let coverage = self.store_zones.save(coverage).await?;
        if active {
            self.adjust_zone(zone_id, DeliveryZone::store_activated)
                .await?;
        } else {
            self.adjust_zone(zone_id, DeliveryZone::store_deactivated)
                .await?;
        }
        Ok(coverage)
    }

    /// A store's zones, highest priority first.
    pub async fn list_store_zones(&self, store_id: StoreId) -> Result<Vec<StoreDeliveryZone>> {
        let mut zones = self
            .store_zones
            .find(DocumentQuery::new().eq("store_id", store_id))
            .await?;
        zones.sort_by(|a, b| b.priority().cmp(&a.priority()));
        Ok(zones)
    }

    /// Returns true if the store actively delivers into the zone.
    pub async fn check_coverage(&self, store_id: StoreId, zone_id: ZoneId) -> Result<bool> {
        Ok(self
            .coverage(store_id, zone_id)
            .await?
            .is_some_and(|c| c.is_active()))
    }

    /// Prices delivery of an order from a store into a zone.
    #[tracing::instrument(skip(self))]
    pub async fn calculate_fee(
        &self,
        store_id: StoreId,
        zone_id: ZoneId,
        order_amount: Money,
    ) -> Result<FeeQuote> {
        let zone = self.zones.load(zone_id).await?;
        let coverage = self.coverage(store_id, zone_id).await?;
        let quote = FeeQuote::calculate(&zone, coverage.as_ref(), order_amount)?;

        metrics::counter!("delivery_fee_quotes_total", "free" => quote.is_free.to_string())
            .increment(1);
        tracing::debug!(fee = %quote.delivery_fee, is_free = quote.is_free, "delivery fee quoted");
        Ok(quote)
    }

    async fn active_zones(&self) -> Result<Vec<DeliveryZone>> {
        Ok(self
            .zones
            .find(DocumentQuery::new().eq("status", ZoneStatus::Active))
            .await?)
    }

    /// The first active zone, by name, whose polygon contains the point.
    pub async fn find_zone_by_location(&self, point: GeoPoint) -> Result<Option<DeliveryZone>> {
        let mut zones = self.active_zones().await?;
        zones.sort_by(|a, b| a.name().cmp(b.name()));
        Ok(zones.into_iter().find(|zone| zone.contains(&point)))
    }

    /// Active zones whose center lies within `radius_m` metres, nearest first.
    pub async fn find_nearby_zones(&self, point: GeoPoint, radius_m: f64) -> Result<Vec<NearbyZone>> {
        let mut nearby: Vec<NearbyZone> = self
            .active_zones()
            .await?
            .into_iter()
            .filter_map(|zone| {
                let distance_m = zone.distance_to(&point)?;
                (distance_m <= radius_m).then_some(NearbyZone { zone, distance_m })
            })
            .collect();
        nearby.sort_by(|a, b| a.distance_m.total_cmp(&b.distance_m));
        Ok(nearby)
    }
}
