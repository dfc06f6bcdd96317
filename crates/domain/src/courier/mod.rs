//! Courier profiles.

mod profile;

pub use profile::{CourierProfile, CourierStatus, VerificationStatus};

use common::{AccountId, CourierId};
use thiserror::Error;

use crate::error::ErrorKind;

/// Errors that can occur during courier operations.
#[derive(Debug, Error)]
pub enum CourierError {
    #[error("Courier {courier_id} is suspended")]
    Suspended { courier_id: CourierId },

    #[error("Courier {courier_id} is not verified (verification {status})")]
    NotVerified {
        courier_id: CourierId,
        status: VerificationStatus,
    },

    #[error("Courier {courier_id} is already suspended")]
    AlreadySuspended { courier_id: CourierId },

    #[error("Courier {courier_id} is not suspended")]
    NotSuspended { courier_id: CourierId },

    /// Availability cannot change while deliveries are in progress.
    #[error("Courier has {count} active deliveries")]
    HasActiveDeliveries { count: usize },

    /// `busy` follows active deliveries and cannot be set by hand.
    #[error("Availability cannot be set to {status}")]
    InvalidAvailability { status: CourierStatus },

    #[error("Commission rate {rate} must be between 0 and 100")]
    InvalidCommissionRate { rate: f64 },

    /// The account has no courier profile.
    #[error("Account {account_id} has no courier profile")]
    NoProfile { account_id: AccountId },

    #[error("Account {account_id} already has a courier profile")]
    AlreadyRegistered { account_id: AccountId },
}

impl CourierError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CourierError::Suspended { .. }
            | CourierError::NotVerified { .. }
            | CourierError::InvalidAvailability { .. }
            | CourierError::InvalidCommissionRate { .. } => ErrorKind::BadRequest,
            CourierError::AlreadySuspended { .. }
            | CourierError::NotSuspended { .. }
            | CourierError::HasActiveDeliveries { .. }
            | CourierError::AlreadyRegistered { .. } => ErrorKind::Conflict,
            CourierError::NoProfile { .. } => ErrorKind::Unauthorized,
        }
    }
}
