//! Domain error types.

use std::fmt;

use document_store::StoreError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::courier::CourierError;
use crate::order::OrderError;
use crate::payment::PaymentError;
use crate::zone::ZoneError;

/// Coarse classification of a failure, as seen by callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    NotFound,
    Conflict,
    BadRequest,
    Unauthorized,
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::Conflict => "CONFLICT",
            ErrorKind::BadRequest => "BAD_REQUEST",
            ErrorKind::Unauthorized => "UNAUTHORIZED",
            ErrorKind::Internal => "INTERNAL",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Errors that can occur during domain operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// An error occurred in the document store.
    #[error("Document store error: {0}")]
    Store(#[from] StoreError),

    #[error("Order error: {0}")]
    Order(#[from] OrderError),

    #[error("Payment error: {0}")]
    Payment(#[from] PaymentError),

    #[error("Courier error: {0}")]
    Courier(#[from] CourierError),

    #[error("Zone error: {0}")]
    Zone(#[from] ZoneError),

    /// Document not found.
    #[error("{document_type} not found: {id}")]
    NotFound {
        document_type: &'static str,
        id: String,
    },

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DomainError {
    pub fn not_found(document_type: &'static str, id: impl ToString) -> Self {
        DomainError::NotFound {
            document_type,
            id: id.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            DomainError::Store(e) => store_error_kind(e),
            DomainError::Order(e) => e.kind(),
            DomainError::Payment(e) => e.kind(),
            DomainError::Courier(e) => e.kind(),
            DomainError::Zone(e) => e.kind(),
            DomainError::NotFound { .. } => ErrorKind::NotFound,
            DomainError::Serialization(_) => ErrorKind::Internal,
        }
    }
}

fn store_error_kind(error: &StoreError) -> ErrorKind {
    match error {
        StoreError::ConcurrencyConflict { .. }
        | StoreError::DocumentExists { .. }
        | StoreError::DuplicateKey { .. } => ErrorKind::Conflict,
        StoreError::NotFound { .. } => ErrorKind::NotFound,
        StoreError::InvalidDocument(_)
        | StoreError::Database(_)
        | StoreError::Migration(_)
        | StoreError::Serialization(_) => ErrorKind::Internal,
    }
}
