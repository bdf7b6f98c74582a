//! Hybrid logical clock implementation.
//!
//! A hybrid logical clock (HLC) combines a wall-clock reading with a
//! logical counter so that events can be totally ordered across replicas
//! without synchronized clocks, while staying close to physical time.
//! Two rules drive it:
//!
//! - **local event** (`advance`): take the wall clock if it moved forward,
//!   otherwise bump the counter at the current timestamp.
//! - **receive** (`merge`): jump to whichever of wall clock, local
//!   timestamp and remote timestamp is furthest ahead, adjusting the
//!   counter so the result is causally after both inputs.
//!
//! Comparison is lexicographic on `(wall_ms, counter)`. Clocks from
//! different replicas can compare equal under that order; such events are
//! concurrent, and winner selection falls back to a deterministic
//! replica-id tie-break (see [`HybridLogicalClock`]'s `Ord`).

use crate::error::{ClockError, ClockResult};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

/// Opaque identifier for a writer.
///
/// Every replica that generates clocks must use a distinct id; the id is
/// carried on each clock for identity and for the concurrent-write
/// tie-break, but it does not participate in causal comparison.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReplicaId(String);

impl ReplicaId {
    /// Creates a replica id from any string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReplicaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ReplicaId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// A hybrid logical clock reading.
///
/// Immutable value type: `advance` and `merge` return a new clock, the
/// input is never mutated. For a single replica every generated clock
/// compares strictly greater than the previous one it generated or
/// received.
///
/// The derived `Ord` compares `(wall_ms, counter, replica)`; the replica
/// component is the documented deterministic tie-break for concurrent
/// writes. Use [`causal_cmp`](Self::causal_cmp) when concurrency must be
/// observable as equality.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct HybridLogicalClock {
    /// Wall-clock milliseconds since the Unix epoch.
    wall_ms: u64,
    /// Logical counter, tie-breaker within the same `wall_ms`.
    counter: u32,
    /// The replica that produced this reading.
    replica: ReplicaId,
}

impl HybridLogicalClock {
    /// Creates a clock for a replica at the current wall time.
    pub fn new(replica: ReplicaId) -> Self {
        Self::at(replica, now_ms(), 0)
    }

    /// Creates a clock at an explicit `(wall_ms, counter)` reading.
    #[must_use]
    pub fn at(replica: ReplicaId, wall_ms: u64, counter: u32) -> Self {
        Self {
            wall_ms,
            counter,
            replica,
        }
    }

    /// Returns the replica that produced this reading.
    #[must_use]
    pub fn replica(&self) -> &ReplicaId {
        &self.replica
    }

    /// Returns the wall-clock component in milliseconds.
    #[must_use]
    pub fn wall_ms(&self) -> u64 {
        self.wall_ms
    }

    /// Returns the logical counter component.
    #[must_use]
    pub fn counter(&self) -> u32 {
        self.counter
    }

    /// Returns the next clock for a local event, using the system clock.
    #[must_use]
    pub fn advance(&self) -> Self {
        self.advance_at(now_ms())
    }

    /// Returns the next clock for a local event at wall time `now_ms`.
    ///
    /// If the current reading is behind `now_ms` the clock jumps to
    /// `(now_ms, 0)`; otherwise the counter is bumped at the current
    /// timestamp. Either way the result compares strictly greater than
    /// `self`.
    #[must_use]
    pub fn advance_at(&self, now_ms: u64) -> Self {
        if self.wall_ms < now_ms {
            Self::at(self.replica.clone(), now_ms, 0)
        } else {
            Self::at(self.replica.clone(), self.wall_ms, self.counter + 1)
        }
    }

    /// Merges a remote clock into this one, using the system clock.
    ///
    /// This is the HLC receive rule; the result is causally after both
    /// `self` and `remote` and carries this clock's replica id.
    #[must_use]
    pub fn merge(&self, remote: &Self) -> Self {
        self.merge_at(remote, now_ms())
    }

    /// Merges a remote clock into this one at wall time `now_ms`.
    ///
    /// Three cases:
    /// - the wall clock is ahead of both readings: `(now_ms, 0)`
    /// - equal timestamps: `(wall_ms, max(counter) + 1)`
    /// - remote strictly ahead: `(remote.wall_ms, remote.counter + 1)`
    ///
    /// Otherwise the local reading is ahead and the rule degenerates to
    /// [`advance_at`](Self::advance_at).
    #[must_use]
    pub fn merge_at(&self, remote: &Self, now_ms: u64) -> Self {
        if now_ms > self.wall_ms.max(remote.wall_ms) {
            return Self::at(self.replica.clone(), now_ms, 0);
        }

        if self.wall_ms == remote.wall_ms {
            return Self::at(
                self.replica.clone(),
                self.wall_ms,
                self.counter.max(remote.counter) + 1,
            );
        }

        if remote.wall_ms > self.wall_ms {
            return Self::at(self.replica.clone(), remote.wall_ms, remote.counter + 1);
        }

        self.advance_at(now_ms)
    }

    /// Compares two readings causally, on `(wall_ms, counter)` only.
    ///
    /// `Equal` for clocks from different replicas means the events are
    /// concurrent, not identical.
    #[must_use]
    pub fn causal_cmp(&self, other: &Self) -> Ordering {
        (self.wall_ms, self.counter).cmp(&(other.wall_ms, other.counter))
    }

    /// Returns true if `self` and `other` are concurrent: causally equal
    /// readings produced by different replicas.
    #[must_use]
    pub fn is_concurrent_with(&self, other: &Self) -> bool {
        self.causal_cmp(other) == Ordering::Equal && self.replica != other.replica
    }
}

impl fmt::Display for HybridLogicalClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.replica, self.wall_ms, self.counter)
    }
}

impl FromStr for HybridLogicalClock {
    type Err = ClockError;

    /// Parses the compact `replica:wall_ms:counter` form.
    ///
    /// The replica id may itself contain `:`; the two numeric components
    /// are taken from the right.
    fn from_str(s: &str) -> ClockResult<Self> {
        let mut parts = s.rsplitn(3, ':');
        let (counter, wall_ms, replica) = match (parts.next(), parts.next(), parts.next()) {
            (Some(counter), Some(wall_ms), Some(replica)) if !replica.is_empty() => {
                (counter, wall_ms, replica)
            }
            _ => {
                return Err(ClockError::ParseShape {
                    input: s.to_string(),
                })
            }
        };

        let wall_ms: u64 = wall_ms.parse().map_err(|_| ClockError::ParseNumber {
            field: "wall_ms",
            value: wall_ms.to_string(),
        })?;
        let counter: u32 = counter.parse().map_err(|_| ClockError::ParseNumber {
            field: "counter",
            value: counter.to_string(),
        })?;

        Ok(Self::at(ReplicaId::new(replica), wall_ms, counter))
    }
}

/// Current wall time in milliseconds since the Unix epoch.
fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
