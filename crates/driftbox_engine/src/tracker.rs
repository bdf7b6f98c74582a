//! Tracking boxes: per-document convergence state fed by change events.

use driftbox_clock::HybridLogicalClock;
use driftbox_crdt::{CrdtResult, DeltaSet, StateSet};
use driftbox_store::{Document, DocumentRef};
use std::collections::HashMap;

/// Maps a document reference to the key its convergence state is tracked
/// under.
pub type KeyFn = Box<dyn Fn(&DocumentRef) -> String + Send + Sync>;

/// The default tracking key: `"{collection_id}/{document_id}"`.
#[must_use]
pub fn default_key(doc: &DocumentRef) -> String {
    format!("{}/{}", doc.collection_id, doc.document_id)
}

/// One entry of a tracker's converged snapshot.
#[derive(Debug, Clone)]
pub struct TrackedDocument {
    /// The original document reference.
    pub doc: DocumentRef,
    /// The converged document state.
    pub state: Document,
    /// The clock of the winning write.
    pub clock: HybridLogicalClock,
}

/// A keyed collection of convergent sets, one per tracked document.
///
/// Implementations differ only in accumulation strategy (whole-document
/// vs per-field); the driver is agnostic to which is used.
pub trait ConvergentTracker {
    /// Appends a document write.
    ///
    /// Lazily creates the document's convergent set, seeded with a fresh
    /// reading of the tracker's own clock, then delegates to the set's
    /// add rule. Returns the clock the write was stored under, or `None`
    /// if the write was already present — callers use the `None` sentinel
    /// to suppress redundant downstream notification.
    fn append(
        &mut self,
        doc: &DocumentRef,
        state: Document,
        supplied: Option<&HybridLogicalClock>,
    ) -> Option<HybridLogicalClock>;

    /// Resolves every tracked document to its converged state.
    ///
    /// Pure projection: calling this any number of times never mutates
    /// the tracker. Entries are ordered by tracking key.
    fn latest(&self) -> CrdtResult<Vec<TrackedDocument>>;

    /// Returns the number of tracked documents.
    fn tracked_len(&self) -> usize;

    /// Returns true if no document is tracked yet.
    fn is_empty(&self) -> bool {
        self.tracked_len() == 0
    }
}

/// Tracking box with whole-document last-writer-wins convergence.
pub struct StateTrackingBox {
    clock: HybridLogicalClock,
    sets: HashMap<String, StateSet>,
    refs: HashMap<String, DocumentRef>,
    key_fn: KeyFn,
}

impl StateTrackingBox {
    /// Creates a box with the default tracking key.
    #[must_use]
    pub fn new(initial_clock: HybridLogicalClock) -> Self {
        Self::with_key_fn(initial_clock, Box::new(default_key))
    }

    /// Creates a box with a caller-chosen tracking key.
    #[must_use]
    pub fn with_key_fn(initial_clock: HybridLogicalClock, key_fn: KeyFn) -> Self {
        Self {
            clock: initial_clock,
            sets: HashMap::new(),
            refs: HashMap::new(),
            key_fn,
        }
    }

    /// Returns the box's current clock reading.
    #[must_use]
    pub fn clock(&self) -> &HybridLogicalClock {
        &self.clock
    }

    /// Returns true if the document already has convergence state.
    #[must_use]
    pub fn is_tracked(&self, doc: &DocumentRef) -> bool {
        self.sets.contains_key(&(self.key_fn)(doc))
    }

    /// Advances the box clock and returns the new reading.
    fn tick(&mut self) -> HybridLogicalClock {
        self.clock = self.clock.advance();
        self.clock.clone()
    }

    /// Mints the clock reading passed to a set's add rule.
    ///
    /// A caller-supplied clock is merged into the box clock first, so the
    /// box absorbs remote causality; either way the box clock stream
    /// stays monotonic across all tracked documents.
    fn stamp(&mut self, supplied: Option<&HybridLogicalClock>) -> HybridLogicalClock {
        match supplied {
            Some(remote) => {
                self.clock = self.clock.merge(remote);
                self.clock.clone()
            }
            None => self.tick(),
        }
    }
}

impl ConvergentTracker for StateTrackingBox {
    fn append(
        &mut self,
        doc: &DocumentRef,
        state: Document,
        supplied: Option<&HybridLogicalClock>,
    ) -> Option<HybridLogicalClock> {
        let key = (self.key_fn)(doc);
        if !self.sets.contains_key(&key) {
            let seed = self.tick();
            self.sets.insert(key.clone(), StateSet::new(seed));
            self.refs.insert(key.clone(), doc.clone());
        }

        let stamp = self.stamp(supplied);
        self.sets
            .get_mut(&key)
            .and_then(|set| set.add(state, Some(&stamp)))
    }

    fn latest(&self) -> CrdtResult<Vec<TrackedDocument>> {
        let mut keys: Vec<&String> = self.sets.keys().collect();
        keys.sort();

        let mut snapshot = Vec::with_capacity(keys.len());
        for key in keys {
            let set = &self.sets[key];
            let winner = set.latest()?;
            if let Some(doc) = self.refs.get(key) {
                snapshot.push(TrackedDocument {
                    doc: doc.clone(),
                    state: winner.state.clone(),
                    clock: winner.clock.clone(),
                });
            }
        }
        Ok(snapshot)
    }

    fn tracked_len(&self) -> usize {
        self.sets.len()
    }
}

/// Tracking box with per-field last-writer-wins convergence.
///
/// Structurally identical to [`StateTrackingBox`] but each document's
/// writes are exploded into field units, so concurrent writes touching
/// disjoint fields of the same document both survive resolution.
pub struct DeltaTrackingBox {
    clock: HybridLogicalClock,
    sets: HashMap<String, DeltaSet>,
    refs: HashMap<String, DocumentRef>,
    key_fn: KeyFn,
}

impl DeltaTrackingBox {
    /// Creates a box with the default tracking key.
    #[must_use]
    pub fn new(initial_clock: HybridLogicalClock) -> Self {
        Self::with_key_fn(initial_clock, Box::new(default_key))
    }

    /// Creates a box with a caller-chosen tracking key.
    #[must_use]
    pub fn with_key_fn(initial_clock: HybridLogicalClock, key_fn: KeyFn) -> Self {
        Self {
            clock: initial_clock,
            sets: HashMap::new(),
            refs: HashMap::new(),
            key_fn,
        }
    }

    /// Returns the box's current clock reading.
    #[must_use]
    pub fn clock(&self) -> &HybridLogicalClock {
        &self.clock
    }

    /// Returns true if the document already has convergence state.
    #[must_use]
    pub fn is_tracked(&self, doc: &DocumentRef) -> bool {
        self.sets.contains_key(&(self.key_fn)(doc))
    }

    fn tick(&mut self) -> HybridLogicalClock {
        self.clock = self.clock.advance();
        self.clock.clone()
    }

    fn stamp(&mut self, supplied: Option<&HybridLogicalClock>) -> HybridLogicalClock {
        match supplied {
            Some(remote) => {
                self.clock = self.clock.merge(remote);
                self.clock.clone()
            }
            None => self.tick(),
        }
    }
}

impl ConvergentTracker for DeltaTrackingBox {
    fn append(
        &mut self,
        doc: &DocumentRef,
        state: Document,
        supplied: Option<&HybridLogicalClock>,
    ) -> Option<HybridLogicalClock> {
        let key = (self.key_fn)(doc);
        if !self.sets.contains_key(&key) {
            let seed = self.tick();
            self.sets.insert(key.clone(), DeltaSet::new(seed));
            self.refs.insert(key.clone(), doc.clone());
        }

        let stamp = self.stamp(supplied);
        self.sets
            .get_mut(&key)
            .and_then(|set| set.add_state(&state, Some(&stamp)))
    }

    fn latest(&self) -> CrdtResult<Vec<TrackedDocument>> {
        let mut keys: Vec<&String> = self.sets.keys().collect();
        keys.sort();

        let mut snapshot = Vec::with_capacity(keys.len());
        for key in keys {
            let set = &self.sets[key];
            let (state, clock) = set.resolve()?;
            if let Some(doc) = self.refs.get(key) {
                snapshot.push(TrackedDocument {
                    doc: doc.clone(),
                    state,
                    clock,
                });
            }
        }
        Ok(snapshot)
    }

    fn tracked_len(&self) -> usize {
        self.sets.len()
    }
}
