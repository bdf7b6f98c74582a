//! Core addressing and event types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A document payload: a JSON object keyed by field name.
///
/// The store does not validate payloads against any schema.
pub type Document = serde_json::Map<String, serde_json::Value>;

/// Reference to a collection of documents.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CollectionRef {
    /// The collection identifier.
    pub collection_id: String,
}

impl CollectionRef {
    /// Creates a collection reference.
    pub fn new(collection_id: impl Into<String>) -> Self {
        Self {
            collection_id: collection_id.into(),
        }
    }

    /// Addresses a document within this collection.
    #[must_use]
    pub fn doc(&self, document_id: impl Into<String>) -> DocumentRef {
        DocumentRef {
            collection_id: self.collection_id.clone(),
            document_id: document_id.into(),
        }
    }
}

impl fmt::Display for CollectionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.collection_id)
    }
}

/// Reference to a single document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentRef {
    /// The collection the document lives in.
    pub collection_id: String,
    /// The document identifier.
    pub document_id: String,
}

impl DocumentRef {
    /// Creates a document reference.
    pub fn new(collection_id: impl Into<String>, document_id: impl Into<String>) -> Self {
        Self {
            collection_id: collection_id.into(),
            document_id: document_id.into(),
        }
    }

    /// Returns the reference of the containing collection.
    #[must_use]
    pub fn collection(&self) -> CollectionRef {
        CollectionRef::new(self.collection_id.clone())
    }
}

impl fmt::Display for DocumentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection_id, self.document_id)
    }
}

/// A change event emitted on the document feed.
///
/// Adds and explicit updates are emitted uniformly as [`Updated`]
/// (carrying the full post-write state); deletions as [`Removed`].
///
/// [`Updated`]: DocumentEvent::Updated
/// [`Removed`]: DocumentEvent::Removed
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentEvent {
    /// A document was created or its state replaced/merged.
    Updated {
        /// The document that changed.
        doc: DocumentRef,
        /// The full state after the write.
        state: Document,
    },
    /// A document was deleted.
    Removed {
        /// The document that was deleted.
        doc: DocumentRef,
    },
}

impl DocumentEvent {
    /// Returns the reference of the affected document.
    #[must_use]
    pub fn doc(&self) -> &DocumentRef {
        match self {
            DocumentEvent::Updated { doc, .. } | DocumentEvent::Removed { doc } => doc,
        }
    }
}
