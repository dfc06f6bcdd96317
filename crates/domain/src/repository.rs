//! Typed access to documents in a [`DocumentStore`].

use std::marker::PhantomData;

use document_store::{DocumentQuery, DocumentStore, StoredDocument, UniqueKey, Version};

use crate::document::Document;
use crate::error::DomainError;

/// Repository for one document type.
///
/// Reads decode the stored JSON body and stamp the stored version onto the
/// document. Writes are compare-and-swap on that version, so a document
/// loaded before a concurrent write cannot overwrite it.
pub struct Repository<S, D>
where
    S: DocumentStore,
    D: Document,
{
    store: S,
    _phantom: PhantomData<D>,
}

impl<S, D> Clone for Repository<S, D>
where
    S: DocumentStore + Clone,
    D: Document,
{
    fn clone(&self) -> Self {
        Self::new(self.store.clone())
    }
}

impl<S, D> Repository<S, D>
where
    S: DocumentStore,
    D: Document,
{
    /// Creates a new repository over the given store.
    pub fn new(store: S) -> Self {
        Self {
            store,
            _phantom: PhantomData,
        }
    }

    /// Returns a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    fn decode(stored: StoredDocument) -> Result<D, DomainError> {
        let mut document: D = stored.decode()?;
        document.set_version(stored.version);
        Ok(document)
    }

    fn encode(document: &D) -> Result<StoredDocument, DomainError> {
        Ok(
            StoredDocument::from_body(D::collection(), document.id().into(), document)?
                .with_unique_keys(document.unique_keys()),
        )
    }

    /// Gets a document by id, returning None if it doesn't exist.
    pub async fn get(&self, id: D::Id) -> Result<Option<D>, DomainError> {
        self.store
            .get(D::collection(), id.into())
            .await?
            .map(Self::decode)
            .transpose()
    }

    /// Loads a document by id, failing with `NotFound` if it doesn't exist.
    pub async fn load(&self, id: D::Id) -> Result<D, DomainError> {
        self.get(id)
            .await?
            .ok_or_else(|| DomainError::not_found(D::document_type(), id))
    }

    /// Gets the document holding a unique key.
    pub async fn get_by_key(&self, key: &UniqueKey) -> Result<Option<D>, DomainError> {
        self.store
            .get_by_key(D::collection(), key)
            .await?
            .map(Self::decode)
            .transpose()
    }

    /// Finds documents matching a query, in insertion order.
    pub async fn find(&self, query: DocumentQuery) -> Result<Vec<D>, DomainError> {
        self.store
            .find(D::collection(), query)
            .await?
            .into_iter()
            .map(Self::decode)
            .collect()
    }

    /// Inserts a new document and returns it at its first version.
    pub async fn insert(&self, mut document: D) -> Result<D, DomainError> {
        let version = self.store.insert(Self::encode(&document)?).await?;
        document.set_version(version);
        tracing::debug!(
            collection = D::collection(),
            id = %document.id(),
            "document inserted"
        );
        Ok(document)
    }

    /// Writes a document back if the stored copy is still at the version it
    /// was loaded at.
    pub async fn save(&self, mut document: D) -> Result<D, DomainError> {
        let expected = document.version();
        let version = self
            .store
            .replace(Self::encode(&document)?, expected)
            .await?;
        document.set_version(version);
        tracing::debug!(
            collection = D::collection(),
            id = %document.id(),
            %version,
            "document saved"
        );
        Ok(document)
    }

    /// Loads a document, applies `change` and saves it.
    ///
    /// Nothing is written if `change` fails.
    pub async fn update<F, E>(&self, id: D::Id, change: F) -> Result<D, DomainError>
    where
        F: FnOnce(&mut D) -> Result<(), E>,
        DomainError: From<E>,
    {
        let mut document = self.load(id).await?;
        change(&mut document)?;
        self.save(document).await
    }

    /// Deletes a document if the stored copy is still at its version.
    pub async fn delete(&self, document: &D) -> Result<(), DomainError> {
        self.store
            .delete(D::collection(), document.id().into(), document.version())
            .await?;
        Ok(())
    }

    /// Returns the stored version of a document, if present.
    pub async fn version_of(&self, id: D::Id) -> Result<Option<Version>, DomainError> {
        Ok(self
            .store
            .get(D::collection(), id.into())
            .await?
            .map(|stored| stored.version))
    }
}
