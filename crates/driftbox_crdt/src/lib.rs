//! # Driftbox CRDT
//!
//! Convergent sets for last-writer-wins document merging.
//!
//! This crate provides the two accumulation strategies Driftbox uses to
//! converge concurrent writes to the same logical document:
//!
//! - [`StateSet`]: whole-document convergence. Every write is kept as a
//!   clocked snapshot and [`StateSet::latest`] resolves to the single
//!   snapshot with the greatest clock.
//! - [`DeltaSet`]: per-field convergence. Writes are exploded into one
//!   [`FieldUnit`] per top-level key and [`DeltaSet::resolve`] assembles a
//!   document from the winning value of each field, so concurrent writes
//!   touching disjoint fields both survive.
//!
//! Both sets are append-only: values are never removed, and every stored
//! entry's clock is minted from the set's own advancing reference clock so
//! the clock stream of a set stays strictly monotonic no matter what
//! clocks callers supply.
//!
//! All operations here are pure computation; nothing suspends.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod clocked;
mod delta_set;
mod error;
mod state_set;

pub use clocked::{split_fields, ClockedField, ClockedState, FieldUnit, StateMap};
pub use delta_set::DeltaSet;
pub use error::{CrdtError, CrdtResult};
pub use state_set::StateSet;
