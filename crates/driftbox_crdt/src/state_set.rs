//! Whole-document convergent set.

use crate::clocked::{ClockedState, StateMap};
use crate::error::{CrdtError, CrdtResult};
use driftbox_clock::HybridLogicalClock;
use std::cmp::Ordering;

/// An append-only set of clocked whole-document snapshots.
///
/// One `StateSet` tracks one logical document. Snapshots are deduplicated
/// by deep value equality, and every stored snapshot is stamped from the
/// set's own reference clock, so stored clocks are strictly increasing in
/// insertion order. [`latest`](Self::latest) resolves the set to the
/// snapshot with the greatest clock: whole-document last-writer-wins.
#[derive(Debug)]
pub struct StateSet {
    /// The set's advancing clock; seeded by the owning tracking box.
    reference_clock: HybridLogicalClock,
    /// Stored snapshots, deduplicated by state equality.
    entries: Vec<ClockedState>,
}

impl StateSet {
    /// Creates an empty set seeded with a reference clock.
    #[must_use]
    pub fn new(reference_clock: HybridLogicalClock) -> Self {
        Self {
            reference_clock,
            entries: Vec::new(),
        }
    }

    /// Returns the set's current reference clock.
    #[must_use]
    pub fn reference_clock(&self) -> &HybridLogicalClock {
        &self.reference_clock
    }

    /// Returns true if an entry with this exact snapshot is present.
    #[must_use]
    pub fn contains(&self, state: &StateMap) -> bool {
        self.entries.iter().any(|entry| entry.same_state(state))
    }

    /// Appends a snapshot, returning the clock it was stored under.
    ///
    /// If the snapshot is already present this is a no-op and returns
    /// `None`. Otherwise the stored clock is minted from the reference
    /// clock: a plain advance when no clock is supplied or the supplied
    /// clock carries nothing the set does not already know, a merge when
    /// the supplied clock is causally informative. The stored clock
    /// becomes the new reference clock, so it always exceeds every clock
    /// stored before it.
    pub fn add(
        &mut self,
        state: StateMap,
        supplied: Option<&HybridLogicalClock>,
    ) -> Option<HybridLogicalClock> {
        if self.contains(&state) {
            return None;
        }

        let assigned = self.stamp(supplied);
        self.entries.push(ClockedState::new(state, assigned.clone()));
        Some(assigned)
    }

    /// Absorbs clocked snapshots from another replica's set.
    ///
    /// Each entry goes through the same [`add`](Self::add) rule with its
    /// recorded clock as the supplied clock, so absorbed entries are
    /// re-stamped into this set's clock stream.
    pub fn absorb<I>(&mut self, entries: I)
    where
        I: IntoIterator<Item = ClockedState>,
    {
        for entry in entries {
            self.add(entry.state, Some(&entry.clock));
        }
    }

    /// Resolves the set to the snapshot with the greatest clock.
    ///
    /// # Errors
    ///
    /// Returns [`CrdtError::EmptySet`] if nothing has been appended; the
    /// owning box only creates sets on first append, so this is an
    /// invariant violation, not a recoverable condition.
    pub fn latest(&self) -> CrdtResult<&ClockedState> {
        self.entries
            .iter()
            .max_by(|a, b| a.clock.cmp(&b.clock))
            .ok_or(CrdtError::EmptySet)
    }

    /// Rejects removal: the set is append-only.
    ///
    /// # Errors
    ///
    /// Always returns [`CrdtError::RemoveUnsupported`].
    pub fn remove(&mut self, _state: &StateMap) -> CrdtResult<()> {
        Err(CrdtError::RemoveUnsupported)
    }

    /// Iterates over the stored snapshots in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &ClockedState> {
        self.entries.iter()
    }

    /// Returns the number of stored snapshots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing has been appended.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Mints the clock for a new entry and advances the reference clock.
    fn stamp(&mut self, supplied: Option<&HybridLogicalClock>) -> HybridLogicalClock {
        let assigned = match supplied {
            Some(clock) if self.reference_clock.causal_cmp(clock) != Ordering::Greater => {
                self.reference_clock.merge(clock)
            }
            _ => self.reference_clock.advance(),
        };
        self.reference_clock = assigned.clone();
        assigned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use driftbox_clock::ReplicaId;
    use proptest::prelude::*;
    use serde_json::json;

    fn doc(value: serde_json::Value) -> StateMap {
        value.as_object().cloned().unwrap()
    }

    fn seed() -> HybridLogicalClock {
        HybridLogicalClock::at(ReplicaId::new("box"), 1_000, 0)
    }

    #[test]
    fn add_assigns_increasing_clocks() {
        let mut set = StateSet::new(seed());
        let c1 = set.add(doc(json!({"n": 1})), None).unwrap();
        let c2 = set.add(doc(json!({"n": 2})), None).unwrap();
        let c3 = set.add(doc(json!({"n": 3})), None).unwrap();
        assert!(c1 < c2 && c2 < c3);
        assert_eq!(set.reference_clock(), &c3);
    }

    #[test]
    fn duplicate_state_is_a_noop() {
        let mut set = StateSet::new(seed());
        let state = doc(json!({"name": "Kevin", "age": 23}));
        assert!(set.add(state.clone(), None).is_some());

        // Same value again, even with a wildly different clock.
        let far_ahead = HybridLogicalClock::at(ReplicaId::new("other"), u64::MAX / 2, 9);
        assert!(set.add(state, Some(&far_ahead)).is_none());
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn informative_supplied_clock_is_merged() {
        let mut set = StateSet::new(seed());
        let ahead = HybridLogicalClock::at(ReplicaId::new("remote"), u64::MAX / 2, 3);
        let assigned = set.add(doc(json!({"n": 1})), Some(&ahead)).unwrap();
        // Merge adopts the remote timestamp; the entry is causally after it.
        assert_eq!(assigned.wall_ms(), u64::MAX / 2);
        assert!(assigned.causal_cmp(&ahead) == std::cmp::Ordering::Greater);
        assert_eq!(assigned.replica().as_str(), "box");
    }

    #[test]
    fn stale_supplied_clock_falls_back_to_advance() {
        let seed = HybridLogicalClock::at(ReplicaId::new("box"), u64::MAX / 2, 0);
        let mut set = StateSet::new(seed.clone());
        let stale = HybridLogicalClock::at(ReplicaId::new("remote"), 5, 5);
        let assigned = set.add(doc(json!({"n": 1})), Some(&stale)).unwrap();
        assert_eq!(assigned.wall_ms(), seed.wall_ms());
        assert_eq!(assigned.counter(), 1);
    }

    #[test]
    fn latest_returns_greatest_clock() {
        let mut set = StateSet::new(seed());
        for n in 0..5 {
            set.add(doc(json!({"n": n})), None);
        }
        let winner = set.latest().unwrap();
        let max = set.iter().map(|e| &e.clock).max().unwrap();
        assert_eq!(&winner.clock, max);
        assert_eq!(winner.state, doc(json!({"n": 4})));
    }

    #[test]
    fn latest_on_empty_set_fails() {
        let set = StateSet::new(seed());
        assert_eq!(set.latest().unwrap_err(), CrdtError::EmptySet);
    }

    #[test]
    fn remove_fails_loudly() {
        let mut set = StateSet::new(seed());
        set.add(doc(json!({"n": 1})), None);
        let err = set.remove(&doc(json!({"n": 1}))).unwrap_err();
        assert_eq!(err, CrdtError::RemoveUnsupported);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn absorb_restamps_foreign_entries() {
        let mut source = StateSet::new(HybridLogicalClock::at(ReplicaId::new("remote"), 2_000, 0));
        source.add(doc(json!({"n": 1})), None);
        source.add(doc(json!({"n": 2})), None);

        let mut target = StateSet::new(seed());
        target.absorb(source.iter().cloned());

        assert_eq!(target.len(), 2);
        // Re-stamped clocks carry the absorbing set's replica and are
        // causally after the source clocks.
        for (theirs, ours) in source.iter().zip(target.iter()) {
            assert_eq!(ours.clock.replica().as_str(), "box");
            assert!(ours.clock.causal_cmp(&theirs.clock) == std::cmp::Ordering::Greater);
        }
    }

    proptest! {
        // Whatever order distinct snapshots arrive in, `latest` agrees
        // with the clock maximum over the stored entries.
        #[test]
        fn latest_agrees_with_clock_maximum(
            order in Just((0u64..8).collect::<Vec<_>>()).prop_shuffle(),
        ) {
            let mut set = StateSet::new(seed());
            for n in order {
                set.add(doc(json!({"n": n})), None);
            }
            let winner = set.latest().unwrap();
            let max = set.iter().map(|e| &e.clock).max().unwrap();
            prop_assert_eq!(&winner.clock, max);
        }
    }
}
