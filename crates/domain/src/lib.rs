//! Domain layer of the marketplace fulfillment coordinator.
//!
//! This crate provides:
//! - The [`Document`] trait and a typed [`Repository`] over a document store
//! - Orders with their forward-only status state machine
//! - Payments with their settlement and refund rules
//! - Courier profiles
//! - Delivery zones, store coverage and the delivery fee engine

pub mod courier;
pub mod document;
pub mod error;
pub mod order;
pub mod payment;
pub mod repository;
pub mod zone;

pub use courier::{CourierError, CourierProfile, CourierStatus, VerificationStatus};
pub use document::Document;
pub use error::{DomainError, ErrorKind};
pub use order::{
    DeliveryAddress, Order, OrderDraft, OrderError, OrderItem, OrderPaymentStatus, OrderStatus,
    OrderTotals, StatusChange,
};
pub use payment::{
    BreakdownPart, Payment, PaymentError, PaymentMethod, PaymentStatus, ProcessingDetails, Refund,
};
pub use repository::Repository;
pub use zone::{
    DeliveryZone, FeeQuote, PricingOverrides, StoreDeliveryZone, TimeWindow, ZoneBoundary,
    ZoneError, ZonePricing, ZoneStatus,
};
