//! Entry store: the ordered record sequence that defines iteration order.

/// A stored key-value pair plus its liveness flag.
///
/// The hash is computed once at insertion and reused for every subsequent
/// probe, including rebuilds; `K: Hash` is never invoked after insertion.
/// `alive` flips true to false exactly once, on removal; the record itself
/// stays in place until the next rebuild drops it.
#[derive(Debug, Clone)]
pub(crate) struct Record<K, V> {
    pub(crate) key: K,
    pub(crate) hash: u64,
    pub(crate) value: V,
    pub(crate) alive: bool,
}

/// Append-only (until rebuilt) sequence of records. Positions handed out by
/// [`EntryStore::append`] are stable until the map rebuilds its storage, at
/// which point the index table is rebuilt along with it.
#[derive(Debug)]
pub(crate) struct EntryStore<K, V> {
    records: Vec<Record<K, V>>,
}

impl<K, V> EntryStore<K, V> {
    pub(crate) fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    pub(crate) fn with_capacity(n: usize) -> Self {
        Self {
            records: Vec::with_capacity(n),
        }
    }

    /// Append a live record and return its position.
    pub(crate) fn append(&mut self, key: K, hash: u64, value: V) -> usize {
        let pos = self.records.len();
        self.records.push(Record {
            key,
            hash,
            value,
            alive: true,
        });
        pos
    }

    pub(crate) fn get(&self, pos: usize) -> &Record<K, V> {
        &self.records[pos]
    }

    pub(crate) fn get_mut(&mut self, pos: usize) -> &mut Record<K, V> {
        &mut self.records[pos]
    }

    /// Mark the record at `pos` dead. The caller (the map) writes the
    /// matching tombstone into the index table.
    pub(crate) fn kill(&mut self, pos: usize) {
        let rec = &mut self.records[pos];
        debug_assert!(rec.alive, "record killed twice");
        rec.alive = false;
    }

    /// All records in order, dead ones included. The map's iterators skip
    /// the dead records themselves.
    pub(crate) fn records(&self) -> &[Record<K, V>] {
        &self.records
    }

    /// Live records in insertion order, with their positions.
    pub(crate) fn iter_alive(&self) -> impl Iterator<Item = (usize, &Record<K, V>)> {
        self.records
            .iter()
            .enumerate()
            .filter(|(_, r)| r.alive)
    }

    /// Consume the store, yielding all records in order. Used by the rebuild
    /// path, which drops the dead ones.
    pub(crate) fn into_records(self) -> Vec<Record<K, V>> {
        self.records
    }
}
