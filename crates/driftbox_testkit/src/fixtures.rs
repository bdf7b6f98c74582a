//! Test fixtures: documents, clocks and stores.

use driftbox_clock::{HybridLogicalClock, ReplicaId};
use driftbox_store::{Document, MemoryBackend, Store};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Builds a document from a JSON object literal.
///
/// # Panics
///
/// Panics if the value is not a JSON object.
#[must_use]
pub fn object(value: serde_json::Value) -> Document {
    value
        .as_object()
        .cloned()
        .expect("fixture value must be a JSON object")
}

/// A simple person document, the running example of the test suites.
#[must_use]
pub fn person(name: &str, age: u64) -> Document {
    object(json!({ "name": name, "age": age }))
}

/// A clock pinned to a fixed reading, for deterministic assertions.
#[must_use]
pub fn fixed_clock(replica: &str) -> HybridLogicalClock {
    HybridLogicalClock::at(ReplicaId::new(replica), 1_000, 0)
}

/// An in-memory store generating sequential `doc-N` identifiers.
#[must_use]
pub fn memory_store() -> Store<MemoryBackend> {
    let counter = AtomicUsize::new(0);
    Store::new(MemoryBackend::with_id_generator(move || {
        let n = counter.fetch_add(1, Ordering::SeqCst);
        format!("doc-{n}")
    }))
}
