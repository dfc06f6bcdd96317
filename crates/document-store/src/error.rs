use thiserror::Error;
use uuid::Uuid;

use crate::Version;

/// Errors that can occur when interacting with the document store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The expected version did not match the stored version.
    #[error(
        "Concurrency conflict for {collection}/{id}: expected version {expected}, found {actual}"
    )]
    ConcurrencyConflict {
        collection: String,
        id: Uuid,
        expected: Version,
        actual: Version,
    },

    /// A document with the same id already exists in the collection.
    #[error("Document already exists: {collection}/{id}")]
    DocumentExists { collection: String, id: Uuid },

    /// Another document already holds this unique key.
    #[error("Duplicate key in {collection}: {key} = {value}")]
    DuplicateKey {
        collection: String,
        key: String,
        value: String,
    },

    /// The document does not exist.
    #[error("Document not found: {collection}/{id}")]
    NotFound { collection: String, id: Uuid },

    /// The document failed validation before being written.
    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for document store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
