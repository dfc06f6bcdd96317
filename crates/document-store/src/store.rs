use async_trait::async_trait;
use uuid::Uuid;

use crate::{DocumentQuery, Result, StoreError, StoredDocument, UniqueKey, Version};

/// Core trait for document store implementations.
///
/// All implementations must be thread-safe (Send + Sync). Writes never
/// span more than one document; callers that touch several documents in
/// one operation write them one after another.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Inserts a new document and claims its unique keys.
    ///
    /// Fails with `DocumentExists` if the id is taken and `DuplicateKey` if
    /// any unique key is held by another document. Returns the assigned
    /// version ([`Version::first`]).
    async fn insert(&self, document: StoredDocument) -> Result<Version>;

    /// Replaces an existing document if it is still at `expected`.
    ///
    /// Fails with `NotFound` if the document is missing and
    /// `ConcurrencyConflict` if another writer got there first. Unique keys
    /// are swapped atomically with the body. Returns the new version.
    async fn replace(&self, document: StoredDocument, expected: Version) -> Result<Version>;

    /// Deletes a document if it is still at `expected`, releasing its keys.
    async fn delete(&self, collection: &str, id: Uuid, expected: Version) -> Result<()>;

    /// Retrieves a document by id.
    async fn get(&self, collection: &str, id: Uuid) -> Result<Option<StoredDocument>>;

    /// Retrieves the document holding a unique key.
    async fn get_by_key(&self, collection: &str, key: &UniqueKey)
    -> Result<Option<StoredDocument>>;

    /// Retrieves documents matching a query, in insertion order.
    async fn find(&self, collection: &str, query: DocumentQuery) -> Result<Vec<StoredDocument>>;
}

/// Extension trait providing convenience methods for document stores.
#[async_trait]
pub trait DocumentStoreExt: DocumentStore {
    /// Checks if a document exists.
    async fn exists(&self, collection: &str, id: Uuid) -> Result<bool> {
        Ok(self.get(collection, id).await?.is_some())
    }

    /// Returns the first document matching a query.
    async fn find_one(
        &self,
        collection: &str,
        query: DocumentQuery,
    ) -> Result<Option<StoredDocument>> {
        Ok(self.find(collection, query.limit(1)).await?.into_iter().next())
    }

    /// Counts documents matching a query.
    async fn count(&self, collection: &str, query: DocumentQuery) -> Result<usize> {
        Ok(self.find(collection, query).await?.len())
    }
}

// Blanket implementation for all DocumentStore implementations
impl<T: DocumentStore + ?Sized> DocumentStoreExt for T {}

/// Records a lost compare-and-swap race.
pub(crate) fn record_conflict(collection: &str, id: Uuid, expected: Version, actual: Version) {
    metrics::counter!("document_store_conflicts_total", "collection" => collection.to_string())
        .increment(1);
    tracing::debug!(%collection, %id, %expected, %actual, "document version conflict");
}

/// Validates a document before it is written.
pub fn validate_document(document: &StoredDocument) -> Result<()> {
    if document.collection.is_empty() {
        return Err(StoreError::InvalidDocument(
            "collection name must not be empty".to_string(),
        ));
    }

    if !document.body.is_object() {
        return Err(StoreError::InvalidDocument(format!(
            "body of {}/{} must be a JSON object",
            document.collection, document.id
        )));
    }

    for (i, key) in document.unique_keys.iter().enumerate() {
        if key.name.is_empty() {
            return Err(StoreError::InvalidDocument(
                "unique key name must not be empty".to_string(),
            ));
        }
        if document.unique_keys[..i].iter().any(|k| k.name == key.name) {
            return Err(StoreError::InvalidDocument(format!(
                "unique key '{}' declared twice",
                key.name
            )));
        }
    }

    Ok(())
}
