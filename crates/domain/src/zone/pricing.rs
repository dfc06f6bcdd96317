//! Delivery fee calculation.

use common::Money;
use serde::{Deserialize, Serialize};

use super::{DeliveryZone, StoreDeliveryZone, TimeWindow, ZoneError};

/// Delivery price for one order into one zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeQuote {
    pub delivery_fee: Money,
    pub is_free: bool,
    pub min_order_amount: Money,
    pub free_delivery_threshold: Option<Money>,
    pub estimated_time: TimeWindow,
}

impl FeeQuote {
    /// Prices delivery of an order worth `order_amount`.
    ///
    /// Each field of an active store registration overrides the zone
    /// default independently. Fails when the order is below the minimum;
    /// delivery is free at or above the free-delivery threshold.
    pub fn calculate(
        zone: &DeliveryZone,
        coverage: Option<&StoreDeliveryZone>,
        order_amount: Money,
    ) -> Result<Self, ZoneError> {
        let defaults = zone.pricing();
        let overrides = coverage
            .filter(|c| c.is_active())
            .map(|c| *c.overrides())
            .unwrap_or_default();

        let fee = overrides.delivery_fee.unwrap_or(defaults.delivery_fee);
        let min_order_amount = overrides
            .min_order_amount
            .unwrap_or(defaults.min_order_amount);
        let free_delivery_threshold = overrides
            .free_delivery_threshold
            .or(defaults.free_delivery_threshold);
        let estimated_time = TimeWindow::new(
            overrides
                .estimated_time_min
                .unwrap_or(defaults.estimated_time.min_minutes),
            overrides
                .estimated_time_max
                .unwrap_or(defaults.estimated_time.max_minutes),
        );

        if order_amount < min_order_amount {
            return Err(ZoneError::BelowMinimumOrder {
                amount: order_amount,
                minimum: min_order_amount,
            });
        }

        let is_free = free_delivery_threshold.is_some_and(|threshold| order_amount >= threshold);

        Ok(Self {
            delivery_fee: if is_free { Money::zero() } else { fee },
            is_free,
            min_order_amount,
            free_delivery_threshold,
            estimated_time,
        })
    }
}
