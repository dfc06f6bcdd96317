//! In-process event bus for marketplace domain events.
//!
//! - [`MarketplaceEvent`] names every event the coordinator emits
//! - [`EventBus`] delivers events synchronously to registered [`Subscriber`]s
//! - [`EventLog`] and [`LoggingSubscriber`] are ready-made subscribers

pub mod bus;
pub mod envelope;
pub mod error;
pub mod event_log;
pub mod events;
pub mod logging;
pub mod subscriber;

pub use bus::{EventBus, EventBusBuilder};
pub use envelope::{EventEnvelope, EventId};
pub use error::{EventBusError, Result};
pub use event_log::EventLog;
pub use events::{
    CourierOrderAcceptedData, CourierOrderRejectedData, CourierSuspensionData,
    DeliveryStatusUpdatedData, MarketplaceEvent, OrderAssignedData, OrderPlacedData,
    OrderStatusUpdatedData, PaymentEventData,
};
pub use logging::LoggingSubscriber;
pub use subscriber::Subscriber;
