//! # Driftbox Store
//!
//! The document-store collaborator for Driftbox.
//!
//! This crate provides:
//! - [`Store`]: the addressing and dispatch layer turning typed
//!   [`StoreAction`]s into backend calls and fanning out change events
//! - [`StoreBackend`]: the trait raw CRUD backends implement
//! - [`MemoryBackend`]: an instance-owned two-level arena
//! - [`ItemBackend`]: a document store layered on any flat key/value
//!   string store ([`ItemStore`])
//! - [`DocumentFeed`]: a cancellable, multi-subscriber change feed
//!
//! The store has no ordering or conflict-resolution semantics of its own;
//! convergence lives in `driftbox_crdt` and `driftbox_engine`, which only
//! consume the change feed and the whole-document `set` operation from
//! here.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod action;
mod backend;
mod error;
mod feed;
mod item;
mod memory;
mod store;
mod types;

pub use action::{ActionOutput, StoreAction};
pub use backend::StoreBackend;
pub use error::{StoreError, StoreResult};
pub use feed::{DocumentFeed, SubscriptionId};
pub use item::{ItemBackend, ItemLayout, ItemStore, MemoryItemStore};
pub use memory::MemoryBackend;
pub use store::Store;
pub use types::{CollectionRef, Document, DocumentEvent, DocumentRef};
