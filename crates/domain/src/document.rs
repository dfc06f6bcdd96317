//! Core trait for persisted domain documents.

use document_store::{UniqueKey, Version};
use serde::{Serialize, de::DeserializeOwned};
use uuid::Uuid;

/// Trait for domain entities persisted as versioned documents.
///
/// A document is loaded whole, mutated in memory through its own methods
/// and written back with a compare-and-swap on [`Document::version`]. The
/// version is not part of the serialized body; the repository sets it from
/// the store after every read and write.
pub trait Document: Serialize + DeserializeOwned + Send + Sync + Sized {
    /// Typed identifier of the document.
    type Id: Copy + Into<Uuid> + From<Uuid> + std::fmt::Display + Send + Sync;

    /// Returns the collection the document is stored in.
    fn collection() -> &'static str;

    /// Returns the human-readable type name used in error messages.
    fn document_type() -> &'static str;

    /// Returns the document's identifier.
    fn id(&self) -> Self::Id;

    /// Returns the stored version the document was loaded at.
    ///
    /// [`Version::initial`] for a document that has not been inserted yet.
    fn version(&self) -> Version;

    /// Sets the stored version.
    fn set_version(&mut self, version: Version);

    /// Returns the unique keys the document claims in its collection.
    fn unique_keys(&self) -> Vec<UniqueKey> {
        Vec::new()
    }
}
