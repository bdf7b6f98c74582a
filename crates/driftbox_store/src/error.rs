//! Error types for store operations.

use crate::types::{CollectionRef, DocumentRef};
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur in store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The addressed collection does not exist.
    #[error("collection not found: {collection_id}")]
    MissingCollection {
        /// The collection that was addressed.
        collection_id: String,
    },

    /// The addressed document does not exist.
    #[error("document not found: {collection_id}/{document_id}")]
    MissingDocument {
        /// The collection that was addressed.
        collection_id: String,
        /// The document that was addressed.
        document_id: String,
    },

    /// The backend does not support this operation.
    #[error("unsupported store operation: {operation}")]
    Unsupported {
        /// The rejected operation.
        operation: String,
    },

    /// A document payload could not be (de)serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A backend-specific failure.
    #[error("backend error: {message}")]
    Backend {
        /// Description of the failure.
        message: String,
    },
}

impl StoreError {
    /// Creates a missing-collection error.
    pub fn missing_collection(collection: &CollectionRef) -> Self {
        Self::MissingCollection {
            collection_id: collection.collection_id.clone(),
        }
    }

    /// Creates a missing-document error.
    pub fn missing_document(doc: &DocumentRef) -> Self {
        Self::MissingDocument {
            collection_id: doc.collection_id.clone(),
            document_id: doc.document_id.clone(),
        }
    }

    /// Creates an unsupported-operation error.
    pub fn unsupported(operation: impl Into<String>) -> Self {
        Self::Unsupported {
            operation: operation.into(),
        }
    }

    /// Creates a backend error.
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }
}
