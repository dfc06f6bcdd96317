//! Versioned document persistence.
//!
//! Documents are JSON bodies grouped into collections. Every write is a
//! compare-and-swap on the document [`Version`]; a stale writer gets
//! [`StoreError::ConcurrencyConflict`] instead of overwriting a newer
//! revision. Unique keys (e.g. one payment per order) are enforced by the
//! store atomically with the write that claims them.

pub mod document;
pub mod error;
pub mod memory;
pub mod postgres;
pub mod query;
pub mod store;

pub use document::{StoredDocument, UniqueKey, Version};
pub use error::{Result, StoreError};
pub use memory::InMemoryDocumentStore;
pub use postgres::PostgresDocumentStore;
pub use query::{DocumentQuery, FieldFilter};
pub use store::{DocumentStore, DocumentStoreExt};
