//! Typed store actions and their outputs.

use crate::types::{CollectionRef, Document, DocumentRef};

/// A store operation as a closed sum type.
///
/// Every method call on [`crate::Store`] routes through exactly one of
/// these variants; dispatch matches exhaustively, so adding an operation
/// is a compile-time event rather than a runtime default-case error.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreAction {
    /// Fetch a document.
    Get {
        /// The document to fetch.
        doc: DocumentRef,
    },
    /// Write a whole document, creating or replacing it.
    Set {
        /// The document to write.
        doc: DocumentRef,
        /// The full new state.
        data: Document,
    },
    /// Merge fields into an existing document.
    Update {
        /// The document to update.
        doc: DocumentRef,
        /// The fields to merge in.
        patch: Document,
    },
    /// Delete a document.
    Delete {
        /// The document to delete.
        doc: DocumentRef,
    },
    /// Add a document under a generated identifier.
    AddDoc {
        /// The target collection.
        collection: CollectionRef,
        /// The document state.
        data: Document,
    },
    /// Add several documents under generated identifiers.
    AddDocs {
        /// The target collection.
        collection: CollectionRef,
        /// The document states.
        data: Vec<Document>,
    },
    /// Write several documents under explicit identifiers.
    SetDocs {
        /// The target collection.
        collection: CollectionRef,
        /// `(document_id, state)` pairs to write.
        entries: Vec<(String, Document)>,
    },
    /// Fetch all documents in a collection.
    GetDocs {
        /// The collection to read.
        collection: CollectionRef,
    },
    /// List the document identifiers in a collection.
    Docs {
        /// The collection to list.
        collection: CollectionRef,
    },
    /// Remove every document in a collection.
    Clear {
        /// The collection to clear.
        collection: CollectionRef,
    },
}

impl StoreAction {
    /// Returns the action's name, for logging and diagnostics.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            StoreAction::Get { .. } => "get",
            StoreAction::Set { .. } => "set",
            StoreAction::Update { .. } => "update",
            StoreAction::Delete { .. } => "delete",
            StoreAction::AddDoc { .. } => "add-doc",
            StoreAction::AddDocs { .. } => "add-docs",
            StoreAction::SetDocs { .. } => "set-docs",
            StoreAction::GetDocs { .. } => "get-docs",
            StoreAction::Docs { .. } => "docs",
            StoreAction::Clear { .. } => "clear",
        }
    }
}

/// The result of dispatching a [`StoreAction`].
#[derive(Debug, Clone, PartialEq)]
pub enum ActionOutput {
    /// A fetched document, or `None` if absent (`Get`).
    Document(Option<Document>),
    /// The full state after a write (`Set`, `Update`).
    Written(Document),
    /// A deletion completed (`Delete`).
    Deleted,
    /// The generated identifier of an added document (`AddDoc`).
    DocumentId(String),
    /// Document identifiers (`AddDocs`, `Docs`).
    DocumentIds(Vec<String>),
    /// `(document_id, state)` pairs (`GetDocs`).
    Entries(Vec<(String, Document)>),
    /// A bulk write or clear completed (`SetDocs`, `Clear`).
    Done,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_kinds() {
        let doc = DocumentRef::new("people", "p1");
        let coll = CollectionRef::new("people");
        assert_eq!(StoreAction::Get { doc: doc.clone() }.kind(), "get");
        assert_eq!(
            StoreAction::Clear {
                collection: coll.clone()
            }
            .kind(),
            "clear"
        );
        assert_eq!(
            StoreAction::SetDocs {
                collection: coll,
                entries: vec![],
            }
            .kind(),
            "set-docs"
        );
    }
}
