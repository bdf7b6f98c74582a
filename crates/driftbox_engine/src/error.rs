//! Error types for the synchronization engine.

use driftbox_crdt::CrdtError;
use driftbox_store::{DocumentRef, StoreError};
use thiserror::Error;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors that can occur in tracking and replay.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A convergent-set invariant was violated (for example resolving a
    /// tracked document with no entries).
    #[error(transparent)]
    Crdt(#[from] CrdtError),

    /// A replay write failed.
    ///
    /// Replay is fire-and-forget per document: the `applied` documents
    /// before the failure were written to the target and are not rolled
    /// back; the failing document and everything after it were not.
    /// Retrying is left to the caller.
    #[error("replay failed at {doc} after {applied} applied documents: {source}")]
    Replay {
        /// The document whose write failed.
        doc: DocumentRef,
        /// How many documents were applied before the failure.
        applied: usize,
        /// The backend error, passed through unmodified.
        #[source]
        source: StoreError,
    },
}
