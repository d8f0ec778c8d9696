//! Probe sequence: the deterministic order in which index slots are examined.

/// Finite iterator over candidate slot positions for a given `(hash, capacity)`
/// pair.
///
/// Linear probing with step 1: starts at `hash % capacity`, wraps modulo
/// `capacity`, and yields every position in `[0, capacity)` exactly once
/// before ending. The sequence depends only on the hash and the capacity,
/// never on table contents, so lookups, insertions, and rebuild placement
/// all walk the same positions for the same key.
#[derive(Debug, Clone)]
pub(crate) struct ProbeSeq {
    pos: usize,
    capacity: usize,
    remaining: usize,
}

impl ProbeSeq {
    /// Start a probe walk. `capacity` must be nonzero (the table constructor
    /// rejects zero capacities).
    pub(crate) fn new(hash: u64, capacity: usize) -> Self {
        debug_assert!(capacity > 0);
        Self {
            pos: (hash % capacity as u64) as usize,
            capacity,
            remaining: capacity,
        }
    }
}

impl Iterator for ProbeSeq {
    type Item = usize;

    #[inline]
    fn next(&mut self) -> Option<usize> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let p = self.pos;
        self.pos += 1;
        if self.pos == self.capacity {
            self.pos = 0;
        }
        Some(p)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for ProbeSeq {}
