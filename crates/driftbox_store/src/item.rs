//! Document store layered on a flat key/value string store.
//!
//! Hosts that only expose a flat string-to-string storage surface (a
//! browser's local storage, a mobile platform's async storage, an
//! embedded KV file) implement [`ItemStore`]; [`ItemBackend`] lays a
//! document store on top of it with three kinds of keys:
//!
//! - one registry key holding the JSON list of collection ids
//! - one key per collection holding the JSON list of its document ids
//! - one key per document holding its JSON payload

use crate::backend::StoreBackend;
use crate::error::{StoreError, StoreResult};
use crate::types::{CollectionRef, Document, DocumentRef};
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::future::Future;

/// A flat, asynchronous string-to-string store.
///
/// The contract deliberately has no removal primitive; hosts that cannot
/// delete keys can still implement it, and [`ItemBackend`] treats the
/// id lists as the source of truth instead.
pub trait ItemStore: Send + Sync {
    /// Fetches the value stored under a key.
    fn get_item(&self, key: &str) -> impl Future<Output = StoreResult<Option<String>>> + Send;

    /// Stores a value under a key, replacing any previous value.
    fn set_item(&self, key: &str, value: String) -> impl Future<Output = StoreResult<()>> + Send;

    /// Fetches several keys at once, pairing each with its value.
    fn multi_get(
        &self,
        keys: &[String],
    ) -> impl Future<Output = StoreResult<Vec<(String, Option<String>)>>> + Send;

    /// Stores several key/value pairs at once.
    fn multi_set(
        &self,
        entries: Vec<(String, String)>,
    ) -> impl Future<Output = StoreResult<()>> + Send;
}

type KeyFn<R> = Box<dyn Fn(&R) -> String + Send + Sync>;

/// Key layout for an [`ItemBackend`].
pub struct ItemLayout {
    registry_key: String,
    collection_key: KeyFn<CollectionRef>,
    document_key: KeyFn<DocumentRef>,
}

impl ItemLayout {
    /// The default layout: every key prefixed with a store name.
    ///
    /// Registry key `{name}`, collection keys `{name}/{collection_id}`,
    /// document keys `{name}/{collection_id}/{document_id}`.
    #[must_use]
    pub fn prefixed(name: impl Into<String>) -> Self {
        let name = name.into();
        let coll_name = name.clone();
        let doc_name = name.clone();
        Self {
            registry_key: name,
            collection_key: Box::new(move |collection| {
                format!("{coll_name}/{}", collection.collection_id)
            }),
            document_key: Box::new(move |doc| {
                format!("{doc_name}/{}/{}", doc.collection_id, doc.document_id)
            }),
        }
    }

    /// A fully custom layout.
    pub fn new<C, D>(registry_key: impl Into<String>, collection_key: C, document_key: D) -> Self
    where
        C: Fn(&CollectionRef) -> String + Send + Sync + 'static,
        D: Fn(&DocumentRef) -> String + Send + Sync + 'static,
    {
        Self {
            registry_key: registry_key.into(),
            collection_key: Box::new(collection_key),
            document_key: Box::new(document_key),
        }
    }
}

/// A document backend over any [`ItemStore`].
///
/// `set` is an upsert that registers the document id; `update` fails for
/// a missing document; `delete` fails with
/// [`StoreError::Unsupported`] because the flat-store contract cannot
/// remove keys.
pub struct ItemBackend<S> {
    items: S,
    layout: ItemLayout,
    generate_id: Box<dyn Fn() -> String + Send + Sync>,
}

impl<S: ItemStore> ItemBackend<S> {
    /// Creates a backend with the default prefixed layout and uuid-v4
    /// document identifiers.
    pub fn new(items: S, name: impl Into<String>) -> Self {
        Self::with_layout(items, ItemLayout::prefixed(name))
    }

    /// Creates a backend with a custom key layout.
    pub fn with_layout(items: S, layout: ItemLayout) -> Self {
        Self {
            items,
            layout,
            generate_id: Box::new(|| uuid::Uuid::new_v4().to_string()),
        }
    }

    /// Replaces the document identifier generator.
    #[must_use]
    pub fn with_id_generator<F>(mut self, generate_id: F) -> Self
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        self.generate_id = Box::new(generate_id);
        self
    }

    /// Returns the underlying item store.
    pub fn items(&self) -> &S {
        &self.items
    }

    async fn read_json<T: DeserializeOwned>(&self, key: &str) -> StoreResult<Option<T>> {
        match self.items.get_item(key).await? {
            Some(text) => Ok(Some(serde_json::from_str(&text)?)),
            None => Ok(None),
        }
    }

    async fn write_json<T: Serialize>(&self, key: &str, value: &T) -> StoreResult<()> {
        self.items
            .set_item(key, serde_json::to_string(value)?)
            .await
    }

    /// Adds a collection id to the registry list, if absent.
    async fn register_collection(&self, collection: &CollectionRef) -> StoreResult<()> {
        let mut ids: Vec<String> = self
            .read_json(&self.layout.registry_key)
            .await?
            .unwrap_or_default();
        if !ids.contains(&collection.collection_id) {
            ids.push(collection.collection_id.clone());
            self.write_json(&self.layout.registry_key, &ids).await?;
        }
        Ok(())
    }

    /// Adds document ids to a collection's id list, skipping known ones.
    async fn register_documents(
        &self,
        collection: &CollectionRef,
        new_ids: &[String],
    ) -> StoreResult<()> {
        let key = (self.layout.collection_key)(collection);
        let mut ids: Vec<String> = self.read_json(&key).await?.unwrap_or_default();
        for id in new_ids {
            if !ids.contains(id) {
                ids.push(id.clone());
            }
        }
        self.write_json(&key, &ids).await
    }

    async fn registered_documents(
        &self,
        collection: &CollectionRef,
    ) -> StoreResult<Option<Vec<String>>> {
        self.read_json(&(self.layout.collection_key)(collection))
            .await
    }
}

impl<S: ItemStore> StoreBackend for ItemBackend<S> {
    async fn get(&self, doc: &DocumentRef) -> StoreResult<Option<Document>> {
        self.read_json(&(self.layout.document_key)(doc)).await
    }

    async fn set(&self, doc: &DocumentRef, data: Document) -> StoreResult<Document> {
        self.register_collection(&doc.collection()).await?;
        self.register_documents(&doc.collection(), std::slice::from_ref(&doc.document_id))
            .await?;
        self.write_json(&(self.layout.document_key)(doc), &data)
            .await?;
        Ok(data)
    }

    async fn update(&self, doc: &DocumentRef, patch: Document) -> StoreResult<Document> {
        let key = (self.layout.document_key)(doc);
        let mut current: Document = self
            .read_json(&key)
            .await?
            .ok_or_else(|| StoreError::missing_document(doc))?;
        for (field, value) in patch {
            current.insert(field, value);
        }
        self.write_json(&key, &current).await?;
        Ok(current)
    }

    async fn delete(&self, _doc: &DocumentRef) -> StoreResult<()> {
        Err(StoreError::unsupported("delete on item-backed store"))
    }

    async fn add(&self, collection: &CollectionRef, data: Document) -> StoreResult<String> {
        let document_id = (self.generate_id)();
        self.set(&collection.doc(document_id.clone()), data).await?;
        Ok(document_id)
    }

    async fn add_many(
        &self,
        collection: &CollectionRef,
        data: Vec<Document>,
    ) -> StoreResult<Vec<String>> {
        let entries: Vec<(String, Document)> = data
            .into_iter()
            .map(|document| ((self.generate_id)(), document))
            .collect();
        let ids: Vec<String> = entries.iter().map(|(id, _)| id.clone()).collect();
        self.set_many(collection, entries).await?;
        Ok(ids)
    }

    async fn set_many(
        &self,
        collection: &CollectionRef,
        entries: Vec<(String, Document)>,
    ) -> StoreResult<()> {
        self.register_collection(collection).await?;
        let ids: Vec<String> = entries.iter().map(|(id, _)| id.clone()).collect();
        self.register_documents(collection, &ids).await?;

        let mut payloads = Vec::with_capacity(entries.len());
        for (document_id, document) in &entries {
            payloads.push((
                (self.layout.document_key)(&collection.doc(document_id.clone())),
                serde_json::to_string(document)?,
            ));
        }
        self.items.multi_set(payloads).await
    }

    async fn get_all(&self, collection: &CollectionRef) -> StoreResult<Vec<(String, Document)>> {
        let ids = self
            .registered_documents(collection)
            .await?
            .ok_or_else(|| StoreError::missing_collection(collection))?;

        let keys: Vec<String> = ids
            .iter()
            .map(|id| (self.layout.document_key)(&collection.doc(id.clone())))
            .collect();
        let values = self.items.multi_get(&keys).await?;

        let mut entries = Vec::with_capacity(ids.len());
        for (id, (_, value)) in ids.into_iter().zip(values) {
            if let Some(text) = value {
                entries.push((id, serde_json::from_str(&text)?));
            }
        }
        Ok(entries)
    }

    async fn document_ids(&self, collection: &CollectionRef) -> StoreResult<Vec<String>> {
        self.registered_documents(collection)
            .await?
            .ok_or_else(|| StoreError::missing_collection(collection))
    }

    async fn clear(&self, collection: &CollectionRef) -> StoreResult<()> {
        // Payload keys cannot be removed from the flat store; the id list
        // is the source of truth, so clearing it orphans the payloads.
        self.write_json(&(self.layout.collection_key)(collection), &Vec::<String>::new())
            .await
    }

    async fn collections(&self) -> StoreResult<Vec<CollectionRef>> {
        let ids: Vec<String> = self
            .read_json(&self.layout.registry_key)
            .await?
            .unwrap_or_default();
        Ok(ids.into_iter().map(CollectionRef::new).collect())
    }
}

/// An [`ItemStore`] backed by an in-memory map, for tests and ephemeral
/// stores.
#[derive(Debug, Default)]
pub struct MemoryItemStore {
    items: RwLock<HashMap<String, String>>,
}

impl MemoryItemStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the raw key/value map.
    #[must_use]
    pub fn snapshot(&self) -> HashMap<String, String> {
        self.items.read().clone()
    }
}

impl ItemStore for MemoryItemStore {
    async fn get_item(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.items.read().get(key).cloned())
    }

    async fn set_item(&self, key: &str, value: String) -> StoreResult<()> {
        self.items.write().insert(key.to_string(), value);
        Ok(())
    }

    async fn multi_get(&self, keys: &[String]) -> StoreResult<Vec<(String, Option<String>)>> {
        let items = self.items.read();
        Ok(keys
            .iter()
            .map(|key| (key.clone(), items.get(key).cloned()))
            .collect())
    }

    async fn multi_set(&self, entries: Vec<(String, String)>) -> StoreResult<()> {
        let mut items = self.items.write();
        for (key, value) in entries {
            items.insert(key, value);
        }
        Ok(())
    }
}
