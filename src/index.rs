//! Index table: the sparse slot array that resolves a hash to a store position.

use crate::probe::ProbeSeq;

/// One cell of the index table.
///
/// `Occupied` holds a position into the entry store. `Tombstone` marks a slot
/// whose entry was removed; it keeps probe chains intact until the next
/// rebuild compacts it away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Slot {
    Empty,
    Tombstone,
    Occupied(usize),
}

/// Outcome of a probe walk for a given hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Located {
    /// A matching live entry exists: the slot holding it and the store
    /// position it references.
    Found { slot: usize, entry: usize },
    /// No match; a new entry for this key belongs at `slot` (the first
    /// tombstone seen during the walk, else the terminating empty slot).
    Vacant { slot: usize, reclaims_tombstone: bool },
    /// The whole table was probed without a match or a reusable slot.
    /// Unreachable while the resize watermark holds; callers treat it as
    /// not-found and grow before inserting.
    Saturated,
}

/// Sparse array of [`Slot`]s, probed via [`ProbeSeq`]. Knows nothing about
/// keys; a matcher closure supplied by the storage layer decides equality.
#[derive(Debug)]
pub(crate) struct IndexTable {
    slots: Box<[Slot]>,
}

impl IndexTable {
    /// `capacity` must be nonzero; validated by the map constructor.
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        debug_assert!(capacity > 0);
        Self {
            slots: vec![Slot::Empty; capacity].into_boxed_slice(),
        }
    }

    pub(crate) fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn slot(&self, slot: usize) -> Slot {
        self.slots[slot]
    }

    pub(crate) fn set(&mut self, slot: usize, value: Slot) {
        self.slots[slot] = value;
    }

    /// Walk the probe sequence for `hash`, calling `matches` with the store
    /// position of each occupied slot until it returns true (a live entry
    /// with an equal key) or the walk resolves to a vacancy.
    ///
    /// The first tombstone seen is remembered as the insertion point so that
    /// deletions do not grow probe chains indefinitely. The walk is bounded
    /// by the capacity; it never cycles.
    pub(crate) fn locate<F>(&self, hash: u64, mut matches: F) -> Located
    where
        F: FnMut(usize) -> bool,
    {
        let mut first_tombstone: Option<usize> = None;
        for slot in ProbeSeq::new(hash, self.capacity()) {
            match self.slots[slot] {
                Slot::Empty => {
                    return match first_tombstone {
                        Some(t) => Located::Vacant {
                            slot: t,
                            reclaims_tombstone: true,
                        },
                        None => Located::Vacant {
                            slot,
                            reclaims_tombstone: false,
                        },
                    }
                }
                Slot::Tombstone => {
                    if first_tombstone.is_none() {
                        first_tombstone = Some(slot);
                    }
                }
                Slot::Occupied(entry) => {
                    if matches(entry) {
                        return Located::Found { slot, entry };
                    }
                }
            }
        }
        match first_tombstone {
            Some(t) => Located::Vacant {
                slot: t,
                reclaims_tombstone: true,
            },
            None => Located::Saturated,
        }
    }

    /// Probe walk used by the rebuild path, where the table is fresh (no
    /// tombstones, no duplicates): the first empty slot along the sequence.
    pub(crate) fn vacant_for(&self, hash: u64) -> Option<usize> {
        ProbeSeq::new(hash, self.capacity()).find(|&slot| self.slots[slot] == Slot::Empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Invariant: an all-empty table resolves to `Vacant` at the probe start.
    #[test]
    fn empty_table_is_vacant_at_start() {
        let idx = IndexTable::with_capacity(8);
        assert_eq!(
            idx.locate(3, |_| false),
            Located::Vacant {
                slot: 3,
                reclaims_tombstone: false
            }
        );
    }

    /// Invariant: an occupied slot with a matching entry is `Found` at the
    /// slot the probe reaches, even after collisions pushed it forward.
    #[test]
    fn finds_entry_displaced_by_collision() {
        let mut idx = IndexTable::with_capacity(8);
        // Two entries colliding on slot 3; the second landed on slot 4.
        idx.set(3, Slot::Occupied(0));
        idx.set(4, Slot::Occupied(1));
        assert_eq!(
            idx.locate(3, |entry| entry == 1),
            Located::Found { slot: 4, entry: 1 }
        );
    }

    /// Invariant: probing continues past a tombstone, and the tombstone is
    /// preferred as the insertion point over the later empty slot.
    #[test]
    fn tombstone_is_skipped_but_reused() {
        let mut idx = IndexTable::with_capacity(8);
        idx.set(3, Slot::Tombstone);
        idx.set(4, Slot::Occupied(7));
        // Lookup for a missing key: walks 3 (tombstone), 4 (no match),
        // 5 (empty) and settles on the tombstone at 3.
        assert_eq!(
            idx.locate(3, |_| false),
            Located::Vacant {
                slot: 3,
                reclaims_tombstone: true
            }
        );
        // A match behind the tombstone is still found.
        assert_eq!(
            idx.locate(3, |entry| entry == 7),
            Located::Found { slot: 4, entry: 7 }
        );
    }

    /// Invariant: a table with no empty slot terminates; all-tombstones
    /// yields the first tombstone, all-occupied yields `Saturated`.
    #[test]
    fn exhausted_walk_terminates() {
        let mut idx = IndexTable::with_capacity(4);
        for s in 0..4 {
            idx.set(s, Slot::Tombstone);
        }
        assert_eq!(
            idx.locate(2, |_| false),
            Located::Vacant {
                slot: 2,
                reclaims_tombstone: true
            }
        );

        let mut full = IndexTable::with_capacity(4);
        for s in 0..4 {
            full.set(s, Slot::Occupied(s));
        }
        assert_eq!(full.locate(2, |_| false), Located::Saturated);
    }

    /// Invariant: the probe wraps around the end of the table.
    #[test]
    fn probe_wraps_around() {
        let mut idx = IndexTable::with_capacity(4);
        idx.set(3, Slot::Occupied(0));
        // Hash lands on the last slot; no match there, wraps to slot 0.
        assert_eq!(
            idx.locate(3, |_| false),
            Located::Vacant {
                slot: 0,
                reclaims_tombstone: false
            }
        );
    }

    /// Invariant: `vacant_for` follows the same probe sequence as `locate`.
    #[test]
    fn vacant_for_matches_probe_order() {
        let mut idx = IndexTable::with_capacity(4);
        idx.set(1, Slot::Occupied(0));
        idx.set(2, Slot::Occupied(1));
        assert_eq!(idx.vacant_for(1), Some(3));
        assert_eq!(idx.vacant_for(3), Some(3));
        assert_eq!(idx.vacant_for(0), Some(0));
    }
}
