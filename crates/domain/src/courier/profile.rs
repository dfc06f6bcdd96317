use chrono::{DateTime, Utc};
use common::{AccountId, CourierId, GeoPoint, Money, OrderId, ZoneId};
use document_store::{UniqueKey, Version};
use serde::{Deserialize, Serialize};

use crate::document::Document;

use super::CourierError;

/// Work status of a courier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CourierStatus {
    Available,
    Busy,
    #[default]
    Offline,
    OnBreak,
}

impl std::fmt::Display for CourierStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            CourierStatus::Available => "available",
            CourierStatus::Busy => "busy",
            CourierStatus::Offline => "offline",
            CourierStatus::OnBreak => "on_break",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl std::fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            VerificationStatus::Pending => "pending",
            VerificationStatus::Approved => "approved",
            VerificationStatus::Rejected => "rejected",
        };
        write!(f, "{s}")
    }
}

/// A courier's working profile.
///
/// `status` is `busy` exactly when `active_deliveries` is non-empty, as
/// long as all changes go through these methods.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourierProfile {
    id: CourierId,

    #[serde(skip)]
    version: Version,

    account_id: AccountId,
    status: CourierStatus,
    verification_status: VerificationStatus,
    is_suspended: bool,
    suspension_reason: Option<String>,
    active_deliveries: Vec<OrderId>,

    /// Share of the delivery fee paid to the courier, in percent.
    commission_rate: f64,

    total_deliveries: u32,
    total_earnings: Money,
    location: Option<GeoPoint>,
    location_updated_at: Option<DateTime<Utc>>,

    /// Home zone, whose on-duty courier count this profile contributes to.
    zone_id: Option<ZoneId>,

    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Document for CourierProfile {
    type Id = CourierId;

    fn collection() -> &'static str {
        "couriers"
    }

    fn document_type() -> &'static str {
        "Courier"
    }

    fn id(&self) -> CourierId {
        self.id
    }

    fn version(&self) -> Version {
        self.version
    }

    fn set_version(&mut self, version: Version) {
        self.version = version;
    }

    fn unique_keys(&self) -> Vec<UniqueKey> {
        vec![CourierProfile::account_key(self.account_id)]
    }
}

impl CourierProfile {
    pub fn account_key(account_id: AccountId) -> UniqueKey {
        UniqueKey::new("account_id", account_id)
    }

    /// Registers an offline, unverified courier.
    pub fn register(
        account_id: AccountId,
        commission_rate: f64,
        zone_id: Option<ZoneId>,
    ) -> Result<Self, CourierError> {
        if !(0.0..=100.0).contains(&commission_rate) {
            return Err(CourierError::InvalidCommissionRate {
                rate: commission_rate,
            });
        }

        let now = Utc::now();
        Ok(Self {
            id: CourierId::new(),
            version: Version::initial(),
            account_id,
            status: CourierStatus::Offline,
            verification_status: VerificationStatus::Pending,
            is_suspended: false,
            suspension_reason: None,
            active_deliveries: Vec::new(),
            commission_rate,
            total_deliveries: 0,
            total_earnings: Money::zero(),
            location: None,
            location_updated_at: None,
            zone_id,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn account_id(&self) -> AccountId {
        self.account_id
    }

    pub fn status(&self) -> CourierStatus {
        self.status
    }

    pub fn verification_status(&self) -> VerificationStatus {
        self.verification_status
    }

    pub fn is_suspended(&self) -> bool {
        self.is_suspended
    }

    pub fn suspension_reason(&self) -> Option<&str> {
        self.suspension_reason.as_deref()
    }

    pub fn active_deliveries(&self) -> &[OrderId] {
        &self.active_deliveries
    }

    pub fn commission_rate(&self) -> f64 {
        self.commission_rate
    }

    pub fn total_deliveries(&self) -> u32 {
        self.total_deliveries
    }

    pub fn total_earnings(&self) -> Money {
        self.total_earnings
    }

    pub fn location(&self) -> Option<GeoPoint> {
        self.location
    }

    pub fn zone_id(&self) -> Option<ZoneId> {
        self.zone_id
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// On duty couriers count towards their home zone's active couriers.
    pub fn is_on_duty(&self) -> bool {
        matches!(self.status, CourierStatus::Available | CourierStatus::Busy)
    }

    /// Distance in metres from the courier's last known location.
    pub fn distance_to(&self, point: &GeoPoint) -> Option<f64> {
        self.location.map(|location| location.distance_m(point))
    }

    /// Fails unless the courier may be given orders.
    pub fn can_be_assigned(&self) -> Result<(), CourierError> {
        if self.is_suspended {
            return Err(CourierError::Suspended {
                courier_id: self.id,
            });
        }
        if self.verification_status != VerificationStatus::Approved {
            return Err(CourierError::NotVerified {
                courier_id: self.id,
                status: self.verification_status,
            });
        }
        Ok(())
    }

    /// Takes on an order and becomes busy.
    pub fn accept_delivery(&mut self, order_id: OrderId) -> Result<(), CourierError> {
        self.can_be_assigned()?;
        if !self.active_deliveries.contains(&order_id) {
            self.active_deliveries.push(order_id);
        }
        self.status = CourierStatus::Busy;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Records a finished delivery and returns the courier's earnings for it.
    ///
    /// Earnings are `delivery_fee * commission_rate / 100`. The courier
    /// becomes available once no deliveries remain, if it was busy.
    pub fn complete_delivery(&mut self, order_id: OrderId, delivery_fee: Money) -> Money {
        let earnings = delivery_fee.percent(self.commission_rate);
        self.active_deliveries.retain(|id| *id != order_id);
        self.total_deliveries += 1;
        self.total_earnings += earnings;
        if self.active_deliveries.is_empty() && self.status == CourierStatus::Busy {
            self.status = CourierStatus::Available;
        }
        self.updated_at = Utc::now();
        earnings
    }

    /// Drops an order without counting it as delivered.
    ///
    /// Returns false if the order was not among the active deliveries.
    pub fn release_delivery(&mut self, order_id: OrderId) -> bool {
        let before = self.active_deliveries.len();
        self.active_deliveries.retain(|id| *id != order_id);
        if self.active_deliveries.len() == before {
            return false;
        }
        if self.active_deliveries.is_empty() && self.status == CourierStatus::Busy {
            self.status = CourierStatus::Available;
        }
        self.updated_at = Utc::now();
        true
    }

    pub fn set_availability(&mut self, status: CourierStatus) -> Result<(), CourierError> {
        if status == CourierStatus::Busy {
            return Err(CourierError::InvalidAvailability { status });
        }
        if !self.active_deliveries.is_empty() {
            return Err(CourierError::HasActiveDeliveries {
                count: self.active_deliveries.len(),
            });
        }
        self.status = status;
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn set_verification(&mut self, status: VerificationStatus) {
        self.verification_status = status;
        self.updated_at = Utc::now();
    }

    pub fn update_location(&mut self, location: GeoPoint) {
        let now = Utc::now();
        self.location = Some(location);
        self.location_updated_at = Some(now);
        self.updated_at = now;
    }

    pub fn suspend(&mut self, reason: String) -> Result<(), CourierError> {
        if self.is_suspended {
            return Err(CourierError::AlreadySuspended {
                courier_id: self.id,
            });
        }
        self.is_suspended = true;
        self.suspension_reason = Some(reason);
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn unsuspend(&mut self) -> Result<(), CourierError> {
        if !self.is_suspended {
            return Err(CourierError::NotSuspended {
                courier_id: self.id,
            });
        }
        self.is_suspended = false;
        self.suspension_reason = None;
        self.updated_at = Utc::now();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approved(rate: f64) -> CourierProfile {
        let mut courier = CourierProfile::register(AccountId::new(), rate, None).unwrap();
        courier.set_verification(VerificationStatus::Approved);
        courier.set_availability(CourierStatus::Available).unwrap();
        courier
    }

    #[test]
    fn test_register_defaults() {
        let courier = CourierProfile::register(AccountId::new(), 80.0, None).unwrap();
        assert_eq!(courier.status(), CourierStatus::Offline);
        assert_eq!(courier.verification_status(), VerificationStatus::Pending);
        assert!(!courier.is_suspended());
        assert!(courier.can_be_assigned().is_err());
    }

    #[test]
    fn test_register_rejects_bad_rate() {
        assert!(matches!(
            CourierProfile::register(AccountId::new(), 120.0, None),
            Err(CourierError::InvalidCommissionRate { .. })
        ));
    }

    #[test]
    fn test_accept_then_complete_delivery() {
        let mut courier = approved(80.0);
        let order = OrderId::new();

        courier.accept_delivery(order).unwrap();
        assert_eq!(courier.status(), CourierStatus::Busy);
        assert_eq!(courier.active_deliveries(), &[order]);

        let earnings = courier.complete_delivery(order, Money::new(5_000));
        assert_eq!(earnings, Money::new(4_000));
        assert_eq!(courier.status(), CourierStatus::Available);
        assert!(courier.active_deliveries().is_empty());
        assert_eq!(courier.total_deliveries(), 1);
        assert_eq!(courier.total_earnings(), Money::new(4_000));
    }

    #[test]
    fn test_completing_unaccepted_delivery_keeps_status() {
        let mut courier = CourierProfile::register(AccountId::new(), 80.0, None).unwrap();
        courier.set_verification(VerificationStatus::Approved);
        assert_eq!(courier.status(), CourierStatus::Offline);

        courier.complete_delivery(OrderId::new(), Money::new(5_000));

        assert_eq!(courier.status(), CourierStatus::Offline);
        assert!(!courier.is_on_duty());
        assert_eq!(courier.total_deliveries(), 1);
    }

    #[test]
    fn test_stays_busy_while_deliveries_remain() {
        let mut courier = approved(50.0);
        let first = OrderId::new();
        let second = OrderId::new();
        courier.accept_delivery(first).unwrap();
        courier.accept_delivery(second).unwrap();

        courier.complete_delivery(first, Money::new(1_000));
        assert_eq!(courier.status(), CourierStatus::Busy);
        assert_eq!(courier.active_deliveries(), &[second]);
    }

    #[test]
    fn test_accept_is_idempotent_per_order() {
        let mut courier = approved(50.0);
        let order = OrderId::new();
        courier.accept_delivery(order).unwrap();
        courier.accept_delivery(order).unwrap();
        assert_eq!(courier.active_deliveries().len(), 1);
    }

    #[test]
    fn test_release_delivery() {
        let mut courier = approved(50.0);
        let order = OrderId::new();
        courier.accept_delivery(order).unwrap();

        assert!(courier.release_delivery(order));
        assert_eq!(courier.status(), CourierStatus::Available);
        assert_eq!(courier.total_deliveries(), 0);
        assert!(!courier.release_delivery(order));
    }

    #[test]
    fn test_availability_locked_while_busy() {
        let mut courier = approved(50.0);
        courier.accept_delivery(OrderId::new()).unwrap();

        assert!(matches!(
            courier.set_availability(CourierStatus::Offline),
            Err(CourierError::HasActiveDeliveries { count: 1 })
        ));
        assert!(matches!(
            courier.set_availability(CourierStatus::Busy),
            Err(CourierError::InvalidAvailability { .. })
        ));
    }

    #[test]
    fn test_suspension_blocks_assignment() {
        let mut courier = approved(50.0);
        courier.suspend("late deliveries".to_string()).unwrap();

        assert!(matches!(
            courier.can_be_assigned(),
            Err(CourierError::Suspended { .. })
        ));
        assert!(courier.accept_delivery(OrderId::new()).is_err());
        assert!(courier.suspend("again".to_string()).is_err());

        courier.unsuspend().unwrap();
        assert!(courier.can_be_assigned().is_ok());
        assert!(courier.suspension_reason().is_none());
        assert!(courier.unsuspend().is_err());
    }

    #[test]
    fn test_queried_fields_serialize_flat() {
        let courier = approved(50.0);
        let body = serde_json::to_value(&courier).unwrap();
        assert_eq!(body["status"], "available");
        assert_eq!(body["is_suspended"], false);
        assert_eq!(body["verification_status"], "approved");
    }
}
