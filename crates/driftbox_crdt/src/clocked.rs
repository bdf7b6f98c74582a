//! Clocked value types shared by both convergence strategies.

use driftbox_clock::HybridLogicalClock;
use serde_json::Value;

/// A document payload: a JSON object keyed by field name.
///
/// Payloads are opaque to the convergence layer apart from top-level
/// field decomposition; no schema is enforced.
pub type StateMap = serde_json::Map<String, Value>;

/// A whole-document snapshot paired with the clock it was stored under.
///
/// Equality between entries is defined over `state` only (deep JSON
/// equality); the clock never participates, which is what lets a set
/// detect "already have this exact value" without clock churn.
#[derive(Debug, Clone)]
pub struct ClockedState {
    /// The document snapshot.
    pub state: StateMap,
    /// The clock assigned when the snapshot was stored.
    pub clock: HybridLogicalClock,
}

impl ClockedState {
    /// Pairs a snapshot with a clock.
    #[must_use]
    pub fn new(state: StateMap, clock: HybridLogicalClock) -> Self {
        Self { state, clock }
    }

    /// Returns true if this entry holds the given snapshot.
    #[must_use]
    pub fn same_state(&self, state: &StateMap) -> bool {
        &self.state == state
    }
}

/// The smallest unit of document data: one top-level field and its value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldUnit {
    /// Field name.
    pub field: String,
    /// Field value.
    pub value: Value,
}

impl FieldUnit {
    /// Creates a field unit.
    #[must_use]
    pub fn new(field: impl Into<String>, value: Value) -> Self {
        Self {
            field: field.into(),
            value,
        }
    }
}

/// A field unit paired with the clock it was stored under.
#[derive(Debug, Clone)]
pub struct ClockedField {
    /// The field unit.
    pub unit: FieldUnit,
    /// The clock assigned when the unit was stored.
    pub clock: HybridLogicalClock,
}

impl ClockedField {
    /// Pairs a field unit with a clock.
    #[must_use]
    pub fn new(unit: FieldUnit, clock: HybridLogicalClock) -> Self {
        Self { unit, clock }
    }
}

/// Explodes a document into one [`FieldUnit`] per top-level key, in key
/// order.
#[must_use]
pub fn split_fields(state: &StateMap) -> Vec<FieldUnit> {
    state
        .iter()
        .map(|(field, value)| FieldUnit::new(field.clone(), value.clone()))
        .collect()
}
