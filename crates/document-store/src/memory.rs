use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    DocumentQuery, Result, StoreError, StoredDocument, UniqueKey, Version,
    store::{DocumentStore, record_conflict, validate_document},
};

type DocumentKey = (String, Uuid);
type IndexKey = (String, String, String);

struct Entry {
    seq: u64,
    document: StoredDocument,
}

#[derive(Default)]
struct Inner {
    documents: HashMap<DocumentKey, Entry>,
    keys: HashMap<IndexKey, Uuid>,
    next_seq: u64,
}

impl Inner {
    fn index_key(collection: &str, key: &UniqueKey) -> IndexKey {
        (collection.to_string(), key.name.clone(), key.value.clone())
    }

    /// Fails if any key of `document` is held by a different document.
    fn check_keys(&self, document: &StoredDocument) -> Result<()> {
        for key in &document.unique_keys {
            if let Some(holder) = self.keys.get(&Self::index_key(&document.collection, key))
                && *holder != document.id
            {
                return Err(StoreError::DuplicateKey {
                    collection: document.collection.clone(),
                    key: key.name.clone(),
                    value: key.value.clone(),
                });
            }
        }
        Ok(())
    }

    fn release_keys(&mut self, collection: &str, keys: &[UniqueKey]) {
        for key in keys {
            self.keys.remove(&Self::index_key(collection, key));
        }
    }

    fn claim_keys(&mut self, document: &StoredDocument) {
        for key in &document.unique_keys {
            self.keys
                .insert(Self::index_key(&document.collection, key), document.id);
        }
    }
}

/// In-memory document store for tests and single-process deployments.
///
/// Provides the same compare-and-swap and unique key semantics as the
/// PostgreSQL implementation. Clones share the same underlying data.
#[derive(Clone, Default)]
pub struct InMemoryDocumentStore {
    inner: Arc<RwLock<Inner>>,
}

impl InMemoryDocumentStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of documents across all collections.
    pub async fn document_count(&self) -> usize {
        self.inner.read().await.documents.len()
    }

    /// Clears all documents and keys.
    pub async fn clear(&self) {
        let mut inner = self.inner.write().await;
        inner.documents.clear();
        inner.keys.clear();
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn insert(&self, mut document: StoredDocument) -> Result<Version> {
        validate_document(&document)?;

        let mut inner = self.inner.write().await;
        let key = (document.collection.clone(), document.id);

        if inner.documents.contains_key(&key) {
            return Err(StoreError::DocumentExists {
                collection: document.collection,
                id: document.id,
            });
        }
        inner.check_keys(&document)?;

        document.version = Version::first();
        document.updated_at = Utc::now();
        inner.claim_keys(&document);

        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.documents.insert(key, Entry { seq, document });

        Ok(Version::first())
    }

    async fn replace(&self, mut document: StoredDocument, expected: Version) -> Result<Version> {
        validate_document(&document)?;

        let mut inner = self.inner.write().await;
        let key = (document.collection.clone(), document.id);

        let (seq, actual, old_keys) = match inner.documents.get(&key) {
            Some(entry) => (
                entry.seq,
                entry.document.version,
                entry.document.unique_keys.clone(),
            ),
            None => {
                return Err(StoreError::NotFound {
                    collection: document.collection,
                    id: document.id,
                });
            }
        };

        if actual != expected {
            record_conflict(&document.collection, document.id, expected, actual);
            return Err(StoreError::ConcurrencyConflict {
                collection: document.collection,
                id: document.id,
                expected,
                actual,
            });
        }
        inner.check_keys(&document)?;

        let new_version = expected.next();
        document.version = new_version;
        document.updated_at = Utc::now();

        inner.release_keys(&document.collection, &old_keys);
        inner.claim_keys(&document);
        inner.documents.insert(key, Entry { seq, document });

        Ok(new_version)
    }

    async fn delete(&self, collection: &str, id: Uuid, expected: Version) -> Result<()> {
        let mut inner = self.inner.write().await;
        let key = (collection.to_string(), id);

        let (actual, keys) = match inner.documents.get(&key) {
            Some(entry) => (entry.document.version, entry.document.unique_keys.clone()),
            None => {
                return Err(StoreError::NotFound {
                    collection: collection.to_string(),
                    id,
                });
            }
        };

        if actual != expected {
            record_conflict(collection, id, expected, actual);
            return Err(StoreError::ConcurrencyConflict {
                collection: collection.to_string(),
                id,
                expected,
                actual,
            });
        }

        inner.release_keys(collection, &keys);
        inner.documents.remove(&key);
        Ok(())
    }

    async fn get(&self, collection: &str, id: Uuid) -> Result<Option<StoredDocument>> {
        let inner = self.inner.read().await;
        Ok(inner
            .documents
            .get(&(collection.to_string(), id))
            .map(|entry| entry.document.clone()))
    }

    async fn get_by_key(
        &self,
        collection: &str,
        key: &UniqueKey,
    ) -> Result<Option<StoredDocument>> {
        let inner = self.inner.read().await;
        let document = inner
            .keys
            .get(&Inner::index_key(collection, key))
            .and_then(|id| inner.documents.get(&(collection.to_string(), *id)))
            .map(|entry| entry.document.clone());
        Ok(document)
    }

    async fn find(&self, collection: &str, query: DocumentQuery) -> Result<Vec<StoredDocument>> {
        let inner = self.inner.read().await;
        let mut matches: Vec<&Entry> = inner
            .documents
            .values()
            .filter(|entry| {
                entry.document.collection == collection && query.matches(&entry.document.body)
            })
            .collect();

        matches.sort_by_key(|entry| entry.seq);

        let documents = matches
            .into_iter()
            .skip(query.offset.unwrap_or(0))
            .take(query.limit.unwrap_or(usize::MAX))
            .map(|entry| entry.document.clone())
            .collect();

        Ok(documents)
    }
}
