//! End-to-end capture and replay tests.

use driftbox_clock::{HybridLogicalClock, ReplicaId};
use driftbox_engine::{
    replay, subscribe, ConvergentTracker, DeltaTrackingBox, EngineError, StateTrackingBox,
};
use driftbox_store::{
    CollectionRef, Document, DocumentRef, MemoryBackend, Store, StoreBackend, StoreError,
    StoreResult,
};
use driftbox_testkit::fixtures::{memory_store, object, person};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

fn sync_clock() -> HybridLogicalClock {
    HybridLogicalClock::new(ReplicaId::new("sync-1"))
}

#[tokio::test]
async fn delta_replay_merges_concurrent_field_updates() {
    init_tracing();
    let source = memory_store();
    let target = memory_store();
    let tracker = Arc::new(Mutex::new(DeltaTrackingBox::new(sync_clock())));

    let handle = subscribe(&source, Arc::clone(&tracker), None);

    let people = CollectionRef::new("people");
    let doc = source.add_doc(&people, person("Kevin", 23)).await.unwrap();
    // Two independent updates touching disjoint fields.
    source
        .update_doc(&doc, object(serde_json::json!({"age": 24})))
        .await
        .unwrap();
    source
        .update_doc(&doc, object(serde_json::json!({"name": "Bob"})))
        .await
        .unwrap();

    let report = replay(&target, &tracker).await.unwrap();
    assert_eq!(report.applied, 1);

    let replayed = target.get_doc(&doc).await.unwrap().unwrap();
    // Both updates survive: highest-clock value per field.
    assert_eq!(replayed, person("Bob", 24));

    handle.cancel();
}

#[tokio::test]
async fn state_replay_keeps_the_last_whole_document() {
    init_tracing();
    let source = memory_store();
    let target = memory_store();
    let tracker = Arc::new(Mutex::new(StateTrackingBox::new(sync_clock())));

    let handle = subscribe(&source, Arc::clone(&tracker), None);

    let people = CollectionRef::new("people");
    let doc = source.add_doc(&people, person("Kevin", 23)).await.unwrap();
    source
        .update_doc(&doc, object(serde_json::json!({"age": 24})))
        .await
        .unwrap();
    source
        .update_doc(&doc, object(serde_json::json!({"name": "Bob"})))
        .await
        .unwrap();

    replay(&target, &tracker).await.unwrap();

    // Whole-document LWW: the final emitted state wins wholesale.
    let replayed = target.get_doc(&doc).await.unwrap().unwrap();
    assert_eq!(replayed, person("Bob", 24));

    handle.cancel();
}

#[tokio::test]
async fn cancelled_subscription_stops_capturing() {
    init_tracing();
    let source = memory_store();
    let tracker = Arc::new(Mutex::new(StateTrackingBox::new(sync_clock())));

    let handle = subscribe(&source, Arc::clone(&tracker), None);

    let doc = DocumentRef::new("people", "p1");
    source.set_doc(&doc, person("Kevin", 23)).await.unwrap();
    assert_eq!(tracker.lock().tracked_len(), 1);

    assert!(handle.cancel());

    source.set_doc(&doc, person("Bob", 24)).await.unwrap();
    source
        .set_doc(&DocumentRef::new("people", "p2"), person("Eve", 30))
        .await
        .unwrap();

    // Nothing after the cancel reached the tracker.
    let tracker = tracker.lock();
    assert_eq!(tracker.tracked_len(), 1);
    let snapshot = tracker.latest().unwrap();
    assert_eq!(snapshot[0].state, person("Kevin", 23));
}

#[tokio::test]
async fn converged_callback_skips_duplicate_writes() {
    init_tracing();
    let source = memory_store();
    let tracker = Arc::new(Mutex::new(StateTrackingBox::new(sync_clock())));

    let fired = Arc::new(AtomicUsize::new(0));
    let fired_inner = Arc::clone(&fired);
    let handle = subscribe(
        &source,
        Arc::clone(&tracker),
        Some(Box::new(move |_, _, _| {
            fired_inner.fetch_add(1, Ordering::SeqCst);
        })),
    );

    let doc = DocumentRef::new("people", "p1");
    source.set_doc(&doc, person("Kevin", 23)).await.unwrap();
    // Identical state: the append is a no-op and must not notify.
    source.set_doc(&doc, person("Kevin", 23)).await.unwrap();
    source.set_doc(&doc, person("Kevin", 24)).await.unwrap();

    assert_eq!(fired.load(Ordering::SeqCst), 2);
    handle.cancel();
}

#[tokio::test]
async fn removal_events_are_not_captured() {
    init_tracing();
    let source = memory_store();
    let tracker = Arc::new(Mutex::new(DeltaTrackingBox::new(sync_clock())));

    let handle = subscribe(&source, Arc::clone(&tracker), None);

    let doc = DocumentRef::new("people", "p1");
    source.set_doc(&doc, person("Kevin", 23)).await.unwrap();
    source.delete_doc(&doc).await.unwrap();

    // The deletion is out of band: convergence still holds the write.
    let snapshot = tracker.lock().latest().unwrap();
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot[0].state, person("Kevin", 23));

    handle.cancel();
}

#[tokio::test]
async fn one_tracker_reconciles_two_stores() {
    init_tracing();
    let local = memory_store();
    let remote = memory_store();
    let target = memory_store();
    let tracker = Arc::new(Mutex::new(DeltaTrackingBox::new(sync_clock())));

    let local_handle = subscribe(&local, Arc::clone(&tracker), None);
    let remote_handle = subscribe(&remote, Arc::clone(&tracker), None);

    let doc = DocumentRef::new("people", "p1");
    local.set_doc(&doc, person("Kevin", 23)).await.unwrap();
    remote
        .set_doc(&doc, object(serde_json::json!({"name": "Kevin", "city": "Dar"})))
        .await
        .unwrap();

    replay(&target, &tracker).await.unwrap();

    let merged = target.get_doc(&doc).await.unwrap().unwrap();
    assert_eq!(
        merged,
        object(serde_json::json!({"name": "Kevin", "age": 23, "city": "Dar"}))
    );

    local_handle.cancel();
    remote_handle.cancel();
}

/// A backend that fails whole-document writes to one specific document.
struct FailingBackend {
    inner: MemoryBackend,
    poison_document_id: String,
}

impl StoreBackend for FailingBackend {
    async fn get(&self, doc: &DocumentRef) -> StoreResult<Option<Document>> {
        self.inner.get(doc).await
    }

    async fn set(&self, doc: &DocumentRef, data: Document) -> StoreResult<Document> {
        if doc.document_id == self.poison_document_id {
            return Err(StoreError::backend("disk full"));
        }
        self.inner.set(doc, data).await
    }

    async fn update(&self, doc: &DocumentRef, patch: Document) -> StoreResult<Document> {
        self.inner.update(doc, patch).await
    }

    async fn delete(&self, doc: &DocumentRef) -> StoreResult<()> {
        self.inner.delete(doc).await
    }

    async fn add(&self, collection: &CollectionRef, data: Document) -> StoreResult<String> {
        self.inner.add(collection, data).await
    }

    async fn add_many(
        &self,
        collection: &CollectionRef,
        data: Vec<Document>,
    ) -> StoreResult<Vec<String>> {
        self.inner.add_many(collection, data).await
    }

    async fn set_many(
        &self,
        collection: &CollectionRef,
        entries: Vec<(String, Document)>,
    ) -> StoreResult<()> {
        self.inner.set_many(collection, entries).await
    }

    async fn get_all(&self, collection: &CollectionRef) -> StoreResult<Vec<(String, Document)>> {
        self.inner.get_all(collection).await
    }

    async fn document_ids(&self, collection: &CollectionRef) -> StoreResult<Vec<String>> {
        self.inner.document_ids(collection).await
    }

    async fn clear(&self, collection: &CollectionRef) -> StoreResult<()> {
        self.inner.clear(collection).await
    }

    async fn collections(&self) -> StoreResult<Vec<CollectionRef>> {
        self.inner.collections().await
    }
}

#[tokio::test]
async fn replay_reports_partial_failure() {
    init_tracing();
    let source = memory_store();
    let tracker = Arc::new(Mutex::new(StateTrackingBox::new(sync_clock())));
    let handle = subscribe(&source, Arc::clone(&tracker), None);

    // Tracking keys sort as a-ok < boom < z-later, so replay applies one
    // document, fails on the second and never reaches the third.
    for id in ["a-ok", "boom", "z-later"] {
        source
            .set_doc(&DocumentRef::new("people", id), person(id, 1))
            .await
            .unwrap();
    }

    let target = Store::new(FailingBackend {
        inner: MemoryBackend::new(),
        poison_document_id: "boom".to_string(),
    });

    let err = replay(&target, &tracker).await.unwrap_err();
    match err {
        EngineError::Replay { doc, applied, .. } => {
            assert_eq!(doc, DocumentRef::new("people", "boom"));
            assert_eq!(applied, 1);
        }
        other => panic!("unexpected error: {other}"),
    }

    // The prefix before the failure was applied and stays applied.
    let applied_doc = target
        .get_doc(&DocumentRef::new("people", "a-ok"))
        .await
        .unwrap();
    assert!(applied_doc.is_some());
    let skipped_doc = target
        .get_doc(&DocumentRef::new("people", "z-later"))
        .await
        .unwrap();
    assert!(skipped_doc.is_none());

    handle.cancel();
}
