//! Error types for convergent sets.

use thiserror::Error;

/// Result type for convergent-set operations.
pub type CrdtResult<T> = Result<T, CrdtError>;

/// Errors that can occur in convergent-set operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CrdtError {
    /// `latest()`/`resolve()` was called on a set with no entries.
    ///
    /// A tracking key is only created on first append, so an empty set
    /// indicates a broken invariant in the caller; treat as fatal.
    #[error("convergent set has no entries")]
    EmptySet,

    /// Removal was attempted on an append-only set.
    ///
    /// Physical deletion of a document is outside the convergence model;
    /// the operation fails loudly instead of silently succeeding.
    #[error("removal is not supported: convergent sets are append-only")]
    RemoveUnsupported,
}
