//! # Driftbox Engine
//!
//! Tracking boxes and the synchronization driver.
//!
//! This crate wires the pieces together: a [`ConvergentTracker`] observes
//! one store's document-change stream and accumulates every write into
//! per-document convergent sets; [`replay`] pushes the tracker's converged
//! snapshot into another store. Two tracker strategies are provided:
//!
//! - [`StateTrackingBox`]: whole-document last-writer-wins
//! - [`DeltaTrackingBox`]: per-field last-writer-wins
//!
//! # Example
//!
//! ```rust,ignore
//! use driftbox_clock::{HybridLogicalClock, ReplicaId};
//! use driftbox_engine::{replay, subscribe, DeltaTrackingBox};
//! use driftbox_store::{MemoryBackend, Store};
//! use parking_lot::Mutex;
//! use std::sync::Arc;
//!
//! let source = Store::new(MemoryBackend::new());
//! let target = Store::new(MemoryBackend::new());
//!
//! let clock = HybridLogicalClock::new(ReplicaId::new("sync-1"));
//! let tracker = Arc::new(Mutex::new(DeltaTrackingBox::new(clock)));
//!
//! // Capture: every add/update on `source` flows into the tracker.
//! let handle = subscribe(&source, Arc::clone(&tracker), None);
//!
//! // ... writes happen against `source` ...
//!
//! // Replay: push the converged snapshot into `target`.
//! replay(&target, &tracker).await?;
//! handle.cancel();
//! ```
//!
//! Deletions are intentionally not part of convergence: `Removed` events
//! are ignored by the driver, so a document deleted on one replica can be
//! resurrected by a stale write replayed from another. This is a known
//! limitation of the design, not an oversight.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod driver;
mod error;
mod tracker;

pub use driver::{replay, subscribe, ConvergedCallback, ReplayReport, SubscriptionHandle};
pub use error::{EngineError, EngineResult};
pub use tracker::{
    default_key, ConvergentTracker, DeltaTrackingBox, KeyFn, StateTrackingBox, TrackedDocument,
};

pub use driftbox_clock::{HybridLogicalClock, ReplicaId};
