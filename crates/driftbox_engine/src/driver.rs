//! The synchronization driver: capture and replay.

use crate::error::{EngineError, EngineResult};
use crate::tracker::ConvergentTracker;
use driftbox_clock::HybridLogicalClock;
use driftbox_store::{
    Document, DocumentEvent, DocumentFeed, DocumentRef, Store, StoreBackend, SubscriptionId,
};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Callback fired when a captured write was actually stored, with the
/// clock it was stored under.
pub type ConvergedCallback = Box<dyn Fn(&DocumentRef, &Document, &HybridLogicalClock) + Send + Sync>;

/// Handle for a driver subscription.
///
/// Dropping the handle does not cancel the subscription; call
/// [`cancel`](Self::cancel) to stop capturing.
pub struct SubscriptionHandle {
    feed: Arc<DocumentFeed>,
    id: SubscriptionId,
}

impl SubscriptionHandle {
    /// Cancels the subscription immediately and synchronously.
    ///
    /// No further change events reach the tracker afterwards; store
    /// writes already in flight are unaffected. Returns false if the
    /// subscription was already gone.
    pub fn cancel(self) -> bool {
        self.feed.unsubscribe(self.id)
    }
}

/// Wires a store's document-change stream into a tracker.
///
/// Every `Updated` event (covering both adds and explicit updates) is
/// appended into the tracker. `Removed` events are intentionally not
/// captured: deletion is outside the convergence model and handled out
/// of band. When an append actually stores a write, the optional
/// `on_converged` callback fires with the reference, the captured state
/// and the assigned clock; duplicate writes are suppressed.
pub fn subscribe<B, T>(
    store: &Store<B>,
    tracker: Arc<Mutex<T>>,
    on_converged: Option<ConvergedCallback>,
) -> SubscriptionHandle
where
    B: StoreBackend,
    T: ConvergentTracker + Send + 'static,
{
    let feed = store.feed();
    let id = feed.subscribe(move |event| {
        let DocumentEvent::Updated { doc, state } = event else {
            trace!(doc = %event.doc(), "removal event ignored by convergence");
            return;
        };

        let assigned = tracker.lock().append(doc, state.clone(), None);
        match assigned {
            Some(clock) => {
                trace!(doc = %doc, clock = %clock, "captured document write");
                if let Some(callback) = &on_converged {
                    callback(doc, state, &clock);
                }
            }
            None => trace!(doc = %doc, "duplicate write suppressed"),
        }
    });

    debug!("tracker subscribed to store feed");
    SubscriptionHandle { feed, id }
}

/// Summary of a completed replay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayReport {
    /// How many documents were written to the target.
    pub applied: usize,
}

/// Replays a tracker's converged snapshot into a target store.
///
/// Takes a point-in-time snapshot of the tracker (the lock is released
/// before any write), then issues one whole-document `set` per tracked
/// document. Fire-and-forget per document: there is no transaction
/// spanning the replay, so a failure leaves every previously applied
/// document in place and is reported through
/// [`EngineError::Replay`] with the failing reference and the applied
/// count. No automatic retry.
pub async fn replay<B, T>(target: &Store<B>, tracker: &Mutex<T>) -> EngineResult<ReplayReport>
where
    B: StoreBackend,
    T: ConvergentTracker,
{
    let snapshot = tracker.lock().latest()?;
    debug!(documents = snapshot.len(), "replaying converged snapshot");

    let mut applied = 0;
    for entry in snapshot {
        trace!(doc = %entry.doc, clock = %entry.clock, "replaying document");
        target
            .set_doc(&entry.doc, entry.state)
            .await
            .map_err(|source| {
                warn!(doc = %entry.doc, applied, "replay write failed");
                EngineError::Replay {
                    doc: entry.doc.clone(),
                    applied,
                    source,
                }
            })?;
        applied += 1;
    }

    debug!(applied, "replay complete");
    Ok(ReplayReport { applied })
}
