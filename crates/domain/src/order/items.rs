//! Value objects for the order domain.

use chrono::{DateTime, Utc};
use common::{AccountId, GeoPoint, Money};
use serde::{Deserialize, Serialize};

use super::{OrderError, OrderStatus};

/// A line item, snapshotted at placement time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    /// Catalogue identifier of the product.
    pub product_id: String,

    /// Product name at the time of ordering.
    pub name: String,

    /// Price per unit at the time of ordering.
    pub unit_price: Money,

    pub quantity: u32,
}

impl OrderItem {
    pub fn new(
        product_id: impl Into<String>,
        name: impl Into<String>,
        unit_price: Money,
        quantity: u32,
    ) -> Self {
        Self {
            product_id: product_id.into(),
            name: name.into(),
            unit_price,
            quantity,
        }
    }

    /// Returns the total price for this item (quantity * unit_price).
    pub fn line_total(&self) -> Result<Money, OrderError> {
        self.unit_price
            .checked_multiply(self.quantity)
            .ok_or(OrderError::AmountOverflow)
    }

    /// Validates `items` and returns their subtotal.
    pub fn subtotal_of(items: &[OrderItem]) -> Result<Money, OrderError> {
        if items.is_empty() {
            return Err(OrderError::NoItems);
        }

        for item in items {
            if item.quantity == 0 {
                return Err(OrderError::InvalidQuantity {
                    product_id: item.product_id.clone(),
                });
            }
            if item.unit_price.is_negative() {
                return Err(OrderError::InvalidPrice {
                    product_id: item.product_id.clone(),
                    price: item.unit_price,
                });
            }
        }

        let line_totals = items
            .iter()
            .map(OrderItem::line_total)
            .collect::<Result<Vec<_>, _>>()?;
        Money::checked_sum(line_totals).ok_or(OrderError::AmountOverflow)
    }
}

/// Monetary totals of an order.
///
/// `total == subtotal + delivery_fee + tax - discount` always holds, and the
/// total is never negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OrderTotals {
    pub subtotal: Money,
    pub delivery_fee: Money,
    pub discount: Money,
    pub tax: Money,
    pub total: Money,
}

impl OrderTotals {
    pub fn compute(
        subtotal: Money,
        delivery_fee: Money,
        discount: Money,
        tax: Money,
    ) -> Result<Self, OrderError> {
        let gross = Money::checked_sum([subtotal, delivery_fee, tax])
            .ok_or(OrderError::AmountOverflow)?;
        if discount > gross {
            return Err(OrderError::DiscountExceedsTotal { discount, gross });
        }

        Ok(Self {
            subtotal,
            delivery_fee,
            discount,
            tax,
            total: gross.checked_sub(discount).ok_or(OrderError::AmountOverflow)?,
        })
    }
}

/// Where the order is delivered to.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DeliveryAddress {
    pub street: String,
    pub city: String,
    pub notes: Option<String>,

    /// Geocoded location, when known. Enables zone lookup by location and
    /// nearest-courier search.
    pub location: Option<GeoPoint>,
}

impl DeliveryAddress {
    pub fn new(street: impl Into<String>, city: impl Into<String>) -> Self {
        Self {
            street: street.into(),
            city: city.into(),
            notes: None,
            location: None,
        }
    }

    pub fn at(mut self, location: GeoPoint) -> Self {
        self.location = Some(location);
        self
    }
}

/// One entry of an order's status history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusChange {
    pub status: OrderStatus,
    pub at: DateTime<Utc>,
    pub actor: Option<AccountId>,
    pub note: Option<String>,
}
