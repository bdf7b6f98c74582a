//! # Driftbox Clock
//!
//! Hybrid logical clocks for Driftbox replicas.
//!
//! This crate provides:
//! - `HybridLogicalClock` for causally ordering writes across replicas
//! - `ReplicaId` for identifying writers
//! - Compact string and serde serialization with strict parsing
//!
//! This is a pure computation crate; the only ambient input is the system
//! wall clock, and every operation has a `*_at` variant that takes the
//! wall-clock reading explicitly.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod hlc;

pub use error::{ClockError, ClockResult};
pub use hlc::{HybridLogicalClock, ReplicaId};
