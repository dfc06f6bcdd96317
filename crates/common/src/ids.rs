//! Typed identifiers.
//!
//! Each identifier wraps a UUID so that an order id can never be passed
//! where a payment id is expected.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Creates an identifier from an existing UUID.
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the underlying UUID.
            pub fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self)
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id!(
    /// Identifier of an order.
    OrderId
);

define_id!(
    /// Identifier of a payment record.
    PaymentId
);

define_id!(
    /// Identifier of a courier profile.
    ///
    /// Distinct from [`AccountId`]: a courier authenticates with an account
    /// and the coordinator resolves the account to its profile.
    CourierId
);

define_id!(
    /// Identifier of an authenticated account (customer, store owner, courier or admin).
    AccountId
);

define_id!(
    /// Identifier of a customer.
    CustomerId
);

define_id!(
    /// Identifier of a store.
    StoreId
);

define_id!(
    /// Identifier of a delivery zone.
    ZoneId
);

define_id!(
    /// Identifier of a store / delivery zone coverage row.
    StoreZoneId
);
