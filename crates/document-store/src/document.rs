use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Revision number of a stored document, used for compare-and-swap writes.
///
/// A document that has never been written is at version 0; the first
/// insert produces version 1 and every successful replace increments it.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Version(i64);

impl Version {
    /// Creates a new version from a raw value.
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// Returns the version (0) of a document that has not been stored yet.
    pub fn initial() -> Self {
        Self(0)
    }

    /// Returns the version (1) assigned by the first insert.
    pub fn first() -> Self {
        Self(1)
    }

    /// Returns true for a document that has not been stored yet.
    pub fn is_initial(&self) -> bool {
        self.0 == 0
    }

    /// Returns the next version.
    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }

    /// Returns the raw version value.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for Version {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<Version> for i64 {
    fn from(version: Version) -> Self {
        version.0
    }
}

/// A unique key claimed by a document within its collection.
///
/// Composite keys are flattened into `value` by the caller, e.g.
/// `"{store_id}:{zone_id}"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UniqueKey {
    pub name: String,
    pub value: String,
}

impl UniqueKey {
    pub fn new(name: impl Into<String>, value: impl ToString) -> Self {
        Self {
            name: name.into(),
            value: value.to_string(),
        }
    }
}

/// A document as persisted by a [`DocumentStore`](crate::DocumentStore).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredDocument {
    /// The collection the document belongs to (e.g. "orders").
    pub collection: String,

    /// Identifier, unique within the collection.
    pub id: Uuid,

    /// Stored revision. Ignored on insert and replace; the store assigns it.
    pub version: Version,

    /// The document body. Must be a JSON object.
    pub body: serde_json::Value,

    /// Unique keys held by this document.
    pub unique_keys: Vec<UniqueKey>,

    /// When the document was last written.
    pub updated_at: DateTime<Utc>,
}

impl StoredDocument {
    /// Creates a document from a raw JSON body.
    pub fn new(collection: impl Into<String>, id: Uuid, body: serde_json::Value) -> Self {
        Self {
            collection: collection.into(),
            id,
            version: Version::initial(),
            body,
            unique_keys: Vec::new(),
            updated_at: Utc::now(),
        }
    }

    /// Creates a document by serializing `body`.
    pub fn from_body<T: Serialize>(
        collection: impl Into<String>,
        id: Uuid,
        body: &T,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self::new(collection, id, serde_json::to_value(body)?))
    }

    /// Adds a unique key.
    pub fn with_unique_key(mut self, key: UniqueKey) -> Self {
        self.unique_keys.push(key);
        self
    }

    /// Replaces the unique keys.
    pub fn with_unique_keys(mut self, keys: Vec<UniqueKey>) -> Self {
        self.unique_keys = keys;
        self
    }

    /// Deserializes the body.
    pub fn decode<T: serde::de::DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.body.clone())
    }
}
