//! In-memory storage backend.

use crate::backend::StoreBackend;
use crate::error::{StoreError, StoreResult};
use crate::types::{CollectionRef, Document, DocumentRef};
use parking_lot::RwLock;
use std::collections::HashMap;

type Arena = HashMap<String, HashMap<String, Document>>;
type IdGenerator = Box<dyn Fn() -> String + Send + Sync>;

/// An in-memory storage backend.
///
/// Documents live in a two-level arena, `collection_id -> document_id ->
/// Document`, owned by the backend instance: dropping the backend drops
/// the data, and two instances never share state.
///
/// Suitable for tests, caches and the local side of a synchronization
/// pair. Reads of a missing collection create it empty rather than
/// failing; `update` is the exception and fails for missing targets.
pub struct MemoryBackend {
    arena: RwLock<Arena>,
    generate_id: IdGenerator,
}

impl MemoryBackend {
    /// Creates an empty backend generating uuid-v4 document identifiers.
    #[must_use]
    pub fn new() -> Self {
        Self::with_id_generator(|| uuid::Uuid::new_v4().to_string())
    }

    /// Creates an empty backend with a custom identifier generator.
    ///
    /// Useful for deterministic tests.
    pub fn with_id_generator<F>(generate_id: F) -> Self
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        Self {
            arena: RwLock::new(HashMap::new()),
            generate_id: Box::new(generate_id),
        }
    }

    /// Returns the number of documents across all collections.
    #[must_use]
    pub fn document_count(&self) -> usize {
        self.arena.read().values().map(HashMap::len).sum()
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl StoreBackend for MemoryBackend {
    async fn get(&self, doc: &DocumentRef) -> StoreResult<Option<Document>> {
        let mut arena = self.arena.write();
        let collection = arena.entry(doc.collection_id.clone()).or_default();
        Ok(collection.get(&doc.document_id).cloned())
    }

    async fn set(&self, doc: &DocumentRef, data: Document) -> StoreResult<Document> {
        let mut arena = self.arena.write();
        let collection = arena.entry(doc.collection_id.clone()).or_default();
        collection.insert(doc.document_id.clone(), data.clone());
        Ok(data)
    }

    async fn update(&self, doc: &DocumentRef, patch: Document) -> StoreResult<Document> {
        let mut arena = self.arena.write();
        let collection = arena
            .get_mut(&doc.collection_id)
            .ok_or_else(|| StoreError::missing_collection(&doc.collection()))?;
        let current = collection
            .get_mut(&doc.document_id)
            .ok_or_else(|| StoreError::missing_document(doc))?;
        for (field, value) in patch {
            current.insert(field, value);
        }
        Ok(current.clone())
    }

    async fn delete(&self, doc: &DocumentRef) -> StoreResult<()> {
        let mut arena = self.arena.write();
        if let Some(collection) = arena.get_mut(&doc.collection_id) {
            collection.remove(&doc.document_id);
        }
        Ok(())
    }

    async fn add(&self, collection: &CollectionRef, data: Document) -> StoreResult<String> {
        let document_id = (self.generate_id)();
        let mut arena = self.arena.write();
        arena
            .entry(collection.collection_id.clone())
            .or_default()
            .insert(document_id.clone(), data);
        Ok(document_id)
    }

    async fn add_many(
        &self,
        collection: &CollectionRef,
        data: Vec<Document>,
    ) -> StoreResult<Vec<String>> {
        let mut arena = self.arena.write();
        let documents = arena.entry(collection.collection_id.clone()).or_default();
        let ids = data
            .into_iter()
            .map(|document| {
                let document_id = (self.generate_id)();
                documents.insert(document_id.clone(), document);
                document_id
            })
            .collect();
        Ok(ids)
    }

    async fn set_many(
        &self,
        collection: &CollectionRef,
        entries: Vec<(String, Document)>,
    ) -> StoreResult<()> {
        let mut arena = self.arena.write();
        let documents = arena.entry(collection.collection_id.clone()).or_default();
        for (document_id, document) in entries {
            documents.insert(document_id, document);
        }
        Ok(())
    }

    async fn get_all(&self, collection: &CollectionRef) -> StoreResult<Vec<(String, Document)>> {
        let mut arena = self.arena.write();
        let documents = arena.entry(collection.collection_id.clone()).or_default();
        let mut entries: Vec<_> = documents
            .iter()
            .map(|(id, document)| (id.clone(), document.clone()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(entries)
    }

    async fn document_ids(&self, collection: &CollectionRef) -> StoreResult<Vec<String>> {
        let arena = self.arena.read();
        let mut ids: Vec<String> = arena
            .get(&collection.collection_id)
            .map(|documents| documents.keys().cloned().collect())
            .unwrap_or_default();
        ids.sort();
        Ok(ids)
    }

    async fn clear(&self, collection: &CollectionRef) -> StoreResult<()> {
        let mut arena = self.arena.write();
        if let Some(documents) = arena.get_mut(&collection.collection_id) {
            documents.clear();
        }
        Ok(())
    }

    async fn collections(&self) -> StoreResult<Vec<CollectionRef>> {
        let arena = self.arena.read();
        let mut collections: Vec<CollectionRef> =
            arena.keys().map(|id| CollectionRef::new(id.clone())).collect();
        collections.sort_by(|a, b| a.collection_id.cmp(&b.collection_id));
        Ok(collections)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: serde_json::Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    fn seq_ids() -> MemoryBackend {
        let counter = std::sync::atomic::AtomicUsize::new(0);
        MemoryBackend::with_id_generator(move || {
            let n = counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            format!("doc-{n}")
        })
    }

    #[tokio::test]
    async fn get_missing_returns_none() {
        let backend = MemoryBackend::new();
        let state = backend.get(&DocumentRef::new("people", "p1")).await.unwrap();
        assert!(state.is_none());
    }

    #[tokio::test]
    async fn set_then_get_roundtrip() {
        let backend = MemoryBackend::new();
        let target = DocumentRef::new("people", "p1");
        let state = doc(json!({"name": "Kevin", "age": 23}));

        backend.set(&target, state.clone()).await.unwrap();
        assert_eq!(backend.get(&target).await.unwrap(), Some(state));
    }

    #[tokio::test]
    async fn set_is_idempotent() {
        let backend = MemoryBackend::new();
        let target = DocumentRef::new("people", "p1");
        let state = doc(json!({"name": "Kevin"}));

        backend.set(&target, state.clone()).await.unwrap();
        backend.set(&target, state.clone()).await.unwrap();
        assert_eq!(backend.get(&target).await.unwrap(), Some(state));
        assert_eq!(backend.document_count(), 1);
    }

    #[tokio::test]
    async fn update_merges_top_level_fields() {
        let backend = MemoryBackend::new();
        let target = DocumentRef::new("people", "p1");
        backend
            .set(&target, doc(json!({"name": "Kevin", "age": 23})))
            .await
            .unwrap();

        let merged = backend
            .update(&target, doc(json!({"age": 24})))
            .await
            .unwrap();
        assert_eq!(merged, doc(json!({"name": "Kevin", "age": 24})));
    }

    #[tokio::test]
    async fn update_missing_document_fails() {
        let backend = MemoryBackend::new();
        let missing_collection = backend
            .update(&DocumentRef::new("people", "p1"), doc(json!({"age": 1})))
            .await;
        assert!(matches!(
            missing_collection,
            Err(StoreError::MissingCollection { .. })
        ));

        backend
            .set(&DocumentRef::new("people", "p2"), doc(json!({"a": 1})))
            .await
            .unwrap();
        let missing_document = backend
            .update(&DocumentRef::new("people", "p1"), doc(json!({"age": 1})))
            .await;
        assert!(matches!(
            missing_document,
            Err(StoreError::MissingDocument { .. })
        ));
    }

    #[tokio::test]
    async fn delete_missing_is_a_noop() {
        let backend = MemoryBackend::new();
        backend.delete(&DocumentRef::new("people", "p1")).await.unwrap();
    }

    #[tokio::test]
    async fn add_generates_distinct_ids() {
        let backend = seq_ids();
        let people = CollectionRef::new("people");

        let id1 = backend.add(&people, doc(json!({"n": 1}))).await.unwrap();
        let id2 = backend.add(&people, doc(json!({"n": 2}))).await.unwrap();
        assert_ne!(id1, id2);
        assert_eq!(
            backend.document_ids(&people).await.unwrap(),
            vec!["doc-0".to_string(), "doc-1".to_string()]
        );
    }

    #[tokio::test]
    async fn set_many_and_get_all() {
        let backend = MemoryBackend::new();
        let people = CollectionRef::new("people");
        backend
            .set_many(
                &people,
                vec![
                    ("p1".into(), doc(json!({"n": 1}))),
                    ("p2".into(), doc(json!({"n": 2}))),
                ],
            )
            .await
            .unwrap();

        let entries = backend.get_all(&people).await.unwrap();
        assert_eq!(
            entries,
            vec![
                ("p1".to_string(), doc(json!({"n": 1}))),
                ("p2".to_string(), doc(json!({"n": 2}))),
            ]
        );
    }

    #[tokio::test]
    async fn clear_empties_but_keeps_collection() {
        let backend = MemoryBackend::new();
        let people = CollectionRef::new("people");
        backend
            .set(&people.doc("p1"), doc(json!({"n": 1})))
            .await
            .unwrap();

        backend.clear(&people).await.unwrap();
        assert!(backend.get_all(&people).await.unwrap().is_empty());
        assert_eq!(backend.collections().await.unwrap(), vec![people]);
    }
}
