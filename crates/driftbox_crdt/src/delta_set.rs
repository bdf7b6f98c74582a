//! Per-field convergent set.

use crate::clocked::{split_fields, ClockedField, FieldUnit, StateMap};
use crate::error::{CrdtError, CrdtResult};
use driftbox_clock::HybridLogicalClock;
use std::cmp::Ordering;
use std::collections::HashMap;

/// An append-only set of clocked field units.
///
/// One `DeltaSet` tracks one logical document at field granularity: a
/// document write is exploded into one [`FieldUnit`] per top-level key
/// before insertion, deduplicated by the `(field, value)` pair. Two
/// concurrent writes touching disjoint fields therefore both survive,
/// and [`resolve`](Self::resolve) assembles the winning value of every
/// field into a single document: last-writer-wins per field, strictly
/// more permissive than whole-document last-writer-wins.
///
/// Clock stamping follows the same rule as [`crate::StateSet`]: every
/// stored unit's clock comes from the set's own reference clock.
#[derive(Debug)]
pub struct DeltaSet {
    /// The set's advancing clock; seeded by the owning tracking box.
    reference_clock: HybridLogicalClock,
    /// Stored field units, deduplicated by `(field, value)`.
    entries: Vec<ClockedField>,
}

impl DeltaSet {
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

    /// Returns true if a unit with this exact `(field, value)` pair is
    /// present.
    #[must_use]
    pub fn contains(&self, unit: &FieldUnit) -> bool {
        self.entries.iter().any(|entry| &entry.unit == unit)
    }

    /// Appends one field unit, returning the clock it was stored under.
    ///
    /// Setting the same field to the same value twice is a no-op
    /// (`None`); the same field set to a different value coexists with
    /// the earlier unit until resolution.
    pub fn add(
        &mut self,
        unit: FieldUnit,
        supplied: Option<&HybridLogicalClock>,
    ) -> Option<HybridLogicalClock> {
        if self.contains(&unit) {
            return None;
        }

        let assigned = self.stamp(supplied);
        self.entries.push(ClockedField::new(unit, assigned.clone()));
        Some(assigned)
    }

    /// Appends a document write, exploded into its field units.
    ///
    /// Returns the greatest clock assigned to a newly stored unit, or
    /// `None` when every unit was already present. Stored clocks are
    /// strictly increasing, so that is the clock of the last unit added.
    pub fn add_state(
        &mut self,
        state: &StateMap,
        supplied: Option<&HybridLogicalClock>,
    ) -> Option<HybridLogicalClock> {
        let mut assigned = None;
        for unit in split_fields(state) {
            if let Some(clock) = self.add(unit, supplied) {
                assigned = Some(clock);
            }
        }
        assigned
    }

    /// Absorbs clocked units from another replica's set, re-stamping each
    /// through [`add`](Self::add).
    pub fn absorb<I>(&mut self, entries: I)
    where
        I: IntoIterator<Item = ClockedField>,
    {
        for entry in entries {
            self.add(entry.unit, Some(&entry.clock));
        }
    }

    /// Resolves the set to a single document.
    ///
    /// Entries are grouped by field name and the unit with the greatest
    /// clock wins each group; the winners are assembled into one document
    /// which is returned together with the greatest winning clock.
    ///
    /// # Errors
    ///
    /// Returns [`CrdtError::EmptySet`] if nothing has been appended.
    pub fn resolve(&self) -> CrdtResult<(StateMap, HybridLogicalClock)> {
        let mut winners: HashMap<&str, &ClockedField> = HashMap::new();
        for entry in &self.entries {
            match winners.get(entry.unit.field.as_str()) {
                Some(current) if current.clock > entry.clock => {}
                _ => {
                    winners.insert(entry.unit.field.as_str(), entry);
                }
            }
        }

        let resolved_clock = winners
            .values()
            .map(|entry| entry.clock.clone())
            .max()
            .ok_or(CrdtError::EmptySet)?;

        let mut state = StateMap::new();
        for entry in winners.into_values() {
            state.insert(entry.unit.field.clone(), entry.unit.value.clone());
        }

        Ok((state, resolved_clock))
    }

    /// Rejects removal: the set is append-only.
    ///
    /// # Errors
    ///
    /// Always returns [`CrdtError::RemoveUnsupported`].
    pub fn remove(&mut self, _unit: &FieldUnit) -> CrdtResult<()> {
        Err(CrdtError::RemoveUnsupported)
    }

    /// Iterates over the stored units in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &ClockedField> {
        self.entries.iter()
    }

    /// Returns the number of stored units.
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
    use serde_json::json;

    fn doc(value: serde_json::Value) -> StateMap {
        value.as_object().cloned().unwrap()
    }

    fn seed() -> HybridLogicalClock {
        HybridLogicalClock::at(ReplicaId::new("box"), 1_000, 0)
    }

    #[test]
    fn disjoint_field_writes_both_survive() {
        let mut set = DeltaSet::new(seed());
        set.add_state(&doc(json!({"name": "A"})), None);
        set.add_state(&doc(json!({"age": 5})), None);

        let (resolved, _) = set.resolve().unwrap();
        assert_eq!(resolved, doc(json!({"name": "A", "age": 5})));
    }

    #[test]
    fn same_field_last_writer_wins() {
        let mut set = DeltaSet::new(seed());
        set.add_state(&doc(json!({"age": 5})), None);
        set.add_state(&doc(json!({"age": 9})), None);

        let (resolved, _) = set.resolve().unwrap();
        assert_eq!(resolved, doc(json!({"age": 9})));
        // Both units are retained; resolution never discards entries.
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn duplicate_unit_is_a_noop() {
        let mut set = DeltaSet::new(seed());
        assert!(set.add_state(&doc(json!({"age": 5})), None).is_some());
        assert!(set.add_state(&doc(json!({"age": 5})), None).is_none());
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn add_state_returns_clock_of_last_new_unit() {
        let mut set = DeltaSet::new(seed());
        set.add_state(&doc(json!({"name": "A", "age": 5})), None);

        // One repeated unit, one fresh unit.
        let assigned = set
            .add_state(&doc(json!({"name": "A", "city": "Dar"})), None)
            .unwrap();
        assert_eq!(set.len(), 3);
        let max = set.iter().map(|e| &e.clock).max().unwrap();
        assert_eq!(&assigned, max);
    }

    #[test]
    fn resolve_reports_greatest_winning_clock() {
        let mut set = DeltaSet::new(seed());
        set.add_state(&doc(json!({"name": "A"})), None);
        let last = set.add_state(&doc(json!({"age": 5})), None).unwrap();

        let (_, clock) = set.resolve().unwrap();
        assert_eq!(clock, last);
    }

    #[test]
    fn resolve_on_empty_set_fails() {
        let set = DeltaSet::new(seed());
        assert_eq!(set.resolve().unwrap_err(), CrdtError::EmptySet);
    }

    #[test]
    fn remove_fails_loudly() {
        let mut set = DeltaSet::new(seed());
        set.add_state(&doc(json!({"age": 5})), None);
        let err = set.remove(&FieldUnit::new("age", json!(5))).unwrap_err();
        assert_eq!(err, CrdtError::RemoveUnsupported);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn absorb_merges_foreign_units() {
        let mut source = DeltaSet::new(HybridLogicalClock::at(ReplicaId::new("remote"), 2_000, 0));
        source.add_state(&doc(json!({"name": "B", "age": 7})), None);

        let mut target = DeltaSet::new(seed());
        target.add_state(&doc(json!({"name": "A"})), None);
        target.absorb(source.iter().cloned());

        // The foreign name unit arrived after the local one, so it wins.
        let (resolved, _) = target.resolve().unwrap();
        assert_eq!(resolved, doc(json!({"name": "B", "age": 7})));
    }
}
