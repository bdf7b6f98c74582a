//! Storage backend trait definition.

use crate::error::StoreResult;
use crate::types::{CollectionRef, Document, DocumentRef};
use std::future::Future;

/// A raw CRUD backend for document collections.
///
/// Backends perform plain request/response storage work against a named
/// collection; they carry no ordering or conflict semantics and emit no
/// change events (the [`crate::Store`] wrapper does that). All calls are
/// asynchronous and may suspend.
///
/// # Invariants
///
/// - `set` is an idempotent upsert: writing the same document twice has
///   the same observable effect as writing it once
/// - `update` fails for a missing collection or document instead of
///   creating either
/// - identifiers returned by `add`/`add_many` are unique within the
///   backend instance
///
/// # Implementors
///
/// - [`crate::MemoryBackend`] - instance-owned in-memory arena
/// - [`crate::ItemBackend`] - layered on a flat key/value string store
pub trait StoreBackend: Send + Sync {
    /// Fetches a document, or `None` if it does not exist.
    fn get(&self, doc: &DocumentRef) -> impl Future<Output = StoreResult<Option<Document>>> + Send;

    /// Creates or replaces a document, returning the stored state.
    fn set(
        &self,
        doc: &DocumentRef,
        data: Document,
    ) -> impl Future<Output = StoreResult<Document>> + Send;

    /// Merges top-level fields into an existing document, returning the
    /// merged state.
    fn update(
        &self,
        doc: &DocumentRef,
        patch: Document,
    ) -> impl Future<Output = StoreResult<Document>> + Send;

    /// Deletes a document.
    fn delete(&self, doc: &DocumentRef) -> impl Future<Output = StoreResult<()>> + Send;

    /// Adds a document under a freshly generated identifier.
    fn add(
        &self,
        collection: &CollectionRef,
        data: Document,
    ) -> impl Future<Output = StoreResult<String>> + Send;

    /// Adds several documents under freshly generated identifiers.
    fn add_many(
        &self,
        collection: &CollectionRef,
        data: Vec<Document>,
    ) -> impl Future<Output = StoreResult<Vec<String>>> + Send;

    /// Writes several documents under explicit identifiers.
    fn set_many(
        &self,
        collection: &CollectionRef,
        entries: Vec<(String, Document)>,
    ) -> impl Future<Output = StoreResult<()>> + Send;

    /// Fetches every document in a collection as `(id, state)` pairs.
    fn get_all(
        &self,
        collection: &CollectionRef,
    ) -> impl Future<Output = StoreResult<Vec<(String, Document)>>> + Send;

    /// Lists the document identifiers in a collection.
    fn document_ids(
        &self,
        collection: &CollectionRef,
    ) -> impl Future<Output = StoreResult<Vec<String>>> + Send;

    /// Removes every document in a collection.
    fn clear(&self, collection: &CollectionRef) -> impl Future<Output = StoreResult<()>> + Send;

    /// Lists the known collections.
    fn collections(&self) -> impl Future<Output = StoreResult<Vec<CollectionRef>>> + Send;
}
