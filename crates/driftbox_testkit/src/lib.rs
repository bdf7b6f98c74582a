//! # Driftbox Testkit
//!
//! Test utilities for Driftbox.
//!
//! This crate provides:
//! - Document and store fixtures
//! - Property-based test generators using proptest

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
