//! Store facade: typed dispatch and change-event fan-out.

use crate::action::{ActionOutput, StoreAction};
use crate::backend::StoreBackend;
use crate::error::StoreResult;
use crate::feed::DocumentFeed;
use crate::types::{CollectionRef, Document, DocumentEvent, DocumentRef};
use std::sync::Arc;
use tracing::trace;

/// The document store facade.
///
/// A `Store` owns a backend and a [`DocumentFeed`]. Every operation is a
/// [`StoreAction`] dispatched through [`apply`](Self::apply); the typed
/// helpers (`get_doc`, `set_doc`, ...) route through the same paths.
/// Write operations emit change events on the feed after the backend
/// call succeeds, which is what the synchronization driver subscribes
/// to.
pub struct Store<B> {
    backend: B,
    feed: Arc<DocumentFeed>,
}

impl<B: StoreBackend> Store<B> {
    /// Wraps a backend in a store with a fresh feed.
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            feed: Arc::new(DocumentFeed::new()),
        }
    }

    /// Returns the underlying backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Returns a handle to the store's change feed.
    ///
    /// The feed is shared: handles stay valid for the life of the store
    /// and multiple subscribers observe the same stream independently.
    #[must_use]
    pub fn feed(&self) -> Arc<DocumentFeed> {
        Arc::clone(&self.feed)
    }

    /// Dispatches a store action.
    ///
    /// Matching is exhaustive over [`StoreAction`]; there is no runtime
    /// default case.
    pub async fn apply(&self, action: StoreAction) -> StoreResult<ActionOutput> {
        trace!(action = action.kind(), "dispatching store action");
        match action {
            StoreAction::Get { doc } => Ok(ActionOutput::Document(self.get_doc(&doc).await?)),
            StoreAction::Set { doc, data } => {
                Ok(ActionOutput::Written(self.set_doc(&doc, data).await?))
            }
            StoreAction::Update { doc, patch } => {
                Ok(ActionOutput::Written(self.update_doc(&doc, patch).await?))
            }
            StoreAction::Delete { doc } => {
                self.delete_doc(&doc).await?;
                Ok(ActionOutput::Deleted)
            }
            StoreAction::AddDoc { collection, data } => {
                let doc = self.add_doc(&collection, data).await?;
                Ok(ActionOutput::DocumentId(doc.document_id))
            }
            StoreAction::AddDocs { collection, data } => {
                let docs = self.add_docs(&collection, data).await?;
                Ok(ActionOutput::DocumentIds(
                    docs.into_iter().map(|doc| doc.document_id).collect(),
                ))
            }
            StoreAction::SetDocs {
                collection,
                entries,
            } => {
                self.set_docs(&collection, entries).await?;
                Ok(ActionOutput::Done)
            }
            StoreAction::GetDocs { collection } => {
                Ok(ActionOutput::Entries(self.get_docs(&collection).await?))
            }
            StoreAction::Docs { collection } => Ok(ActionOutput::DocumentIds(
                self.document_ids(&collection).await?,
            )),
            StoreAction::Clear { collection } => {
                self.clear(&collection).await?;
                Ok(ActionOutput::Done)
            }
        }
    }

    /// Fetches a document, or `None` if it does not exist.
    pub async fn get_doc(&self, doc: &DocumentRef) -> StoreResult<Option<Document>> {
        self.backend.get(doc).await
    }

    /// Creates or replaces a document and emits an update event.
    pub async fn set_doc(&self, doc: &DocumentRef, data: Document) -> StoreResult<Document> {
        let stored = self.backend.set(doc, data).await?;
        self.feed.emit(&DocumentEvent::Updated {
            doc: doc.clone(),
            state: stored.clone(),
        });
        Ok(stored)
    }

    /// Merges fields into an existing document and emits an update event
    /// carrying the merged state.
    pub async fn update_doc(&self, doc: &DocumentRef, patch: Document) -> StoreResult<Document> {
        let merged = self.backend.update(doc, patch).await?;
        self.feed.emit(&DocumentEvent::Updated {
            doc: doc.clone(),
            state: merged.clone(),
        });
        Ok(merged)
    }

    /// Deletes a document and emits a removal event.
    pub async fn delete_doc(&self, doc: &DocumentRef) -> StoreResult<()> {
        self.backend.delete(doc).await?;
        self.feed.emit(&DocumentEvent::Removed { doc: doc.clone() });
        Ok(())
    }

    /// Adds a document under a generated identifier, emitting an update
    /// event, and returns its reference.
    pub async fn add_doc(
        &self,
        collection: &CollectionRef,
        data: Document,
    ) -> StoreResult<DocumentRef> {
        let document_id = self.backend.add(collection, data.clone()).await?;
        let doc = collection.doc(document_id);
        self.feed.emit(&DocumentEvent::Updated {
            doc: doc.clone(),
            state: data,
        });
        Ok(doc)
    }

    /// Adds several documents, emitting one update event per document.
    pub async fn add_docs(
        &self,
        collection: &CollectionRef,
        data: Vec<Document>,
    ) -> StoreResult<Vec<DocumentRef>> {
        let document_ids = self.backend.add_many(collection, data.clone()).await?;
        let docs: Vec<DocumentRef> = document_ids
            .into_iter()
            .map(|id| collection.doc(id))
            .collect();
        for (doc, state) in docs.iter().zip(data) {
            self.feed.emit(&DocumentEvent::Updated {
                doc: doc.clone(),
                state,
            });
        }
        Ok(docs)
    }

    /// Writes several documents under explicit identifiers, emitting one
    /// update event per document.
    pub async fn set_docs(
        &self,
        collection: &CollectionRef,
        entries: Vec<(String, Document)>,
    ) -> StoreResult<()> {
        self.backend.set_many(collection, entries.clone()).await?;
        for (document_id, state) in entries {
            self.feed.emit(&DocumentEvent::Updated {
                doc: collection.doc(document_id),
                state,
            });
        }
        Ok(())
    }

    /// Fetches every document in a collection.
    pub async fn get_docs(
        &self,
        collection: &CollectionRef,
    ) -> StoreResult<Vec<(String, Document)>> {
        self.backend.get_all(collection).await
    }

    /// Lists the document identifiers in a collection.
    pub async fn document_ids(&self, collection: &CollectionRef) -> StoreResult<Vec<String>> {
        self.backend.document_ids(collection).await
    }

    /// Removes every document in a collection.
    ///
    /// Clearing is not document-granular; no per-document events are
    /// emitted.
    pub async fn clear(&self, collection: &CollectionRef) -> StoreResult<()> {
        trace!(collection = %collection, "clearing collection");
        self.backend.clear(collection).await
    }

    /// Lists the known collections.
    pub async fn collections(&self) -> StoreResult<Vec<CollectionRef>> {
        self.backend.collections().await
    }
}
