//! OrdHashMap: the public map composing the index, store, and resize logic.

use crate::index::{IndexTable, Located, Slot};
use crate::store::{EntryStore, Record};
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use core::mem;
use std::collections::hash_map::RandomState;
use thiserror::Error;

/// Initial capacity used by [`OrdHashMap::new`].
const DEFAULT_CAPACITY: usize = 16;

/// Growth factor applied when the load watermark is crossed.
const GROWTH_FACTOR: usize = 2;

/// Capacity headroom applied by [`OrdHashMap::from_mapping`]: ten slots per
/// pair, a deliberately low starting load factor to avoid early growth.
const MAPPING_HEADROOM: usize = 10;

/// Errors surfaced by fallible map operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableError {
    /// Requested capacity was zero. The probe walk and the load watermark
    /// both divide by capacity, so an empty index table is never constructed.
    #[error("capacity must be positive (got {0})")]
    InvalidCapacity(usize),
    /// `get` or `remove` found no live entry for the key. Carries the key's
    /// `Debug` rendering for diagnostics.
    #[error("key not found: {0}")]
    KeyNotFound(String),
}

impl TableError {
    fn key_not_found<Q>(key: &Q) -> Self
    where
        Q: ?Sized + fmt::Debug,
    {
        TableError::KeyNotFound(format!("{key:?}"))
    }
}

/// An insertion-order-preserving hash map with open addressing.
///
/// Entries live in an ordered store; a sparse index table of slots resolves
/// a key to its store position via linear probing. Removal leaves a
/// tombstone in the index and marks the record dead; growing the table
/// rebuilds both levels and compacts the dead records away, preserving the
/// relative order of the survivors.
///
/// Iteration order is insertion order of the currently present keys.
/// Overwriting an existing key keeps its position; re-inserting a removed
/// key appends it at the end.
pub struct OrdHashMap<K, V, S = RandomState> {
    hasher: S,
    index: IndexTable,
    store: EntryStore<K, V>,
    occupied: usize,
    tombstones: usize,
}

impl<K, V> OrdHashMap<K, V>
where
    K: Eq + Hash,
{
    /// Create a map with a small default capacity.
    pub fn new() -> Self {
        Self::raw(DEFAULT_CAPACITY, RandomState::default())
    }

    /// Create a map with an explicit capacity. Fails with
    /// [`TableError::InvalidCapacity`] when `capacity` is zero.
    pub fn with_capacity(capacity: usize) -> Result<Self, TableError> {
        Self::with_capacity_and_hasher(capacity, RandomState::default())
    }
}

impl<K, V> Default for OrdHashMap<K, V>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S> OrdHashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    /// Like [`OrdHashMap::with_capacity`], with a caller-supplied hasher.
    pub fn with_capacity_and_hasher(capacity: usize, hasher: S) -> Result<Self, TableError> {
        if capacity == 0 {
            return Err(TableError::InvalidCapacity(capacity));
        }
        Ok(Self::raw(capacity, hasher))
    }

    fn raw(capacity: usize, hasher: S) -> Self {
        debug_assert!(capacity > 0);
        Self {
            hasher,
            index: IndexTable::with_capacity(capacity),
            store: EntryStore::new(),
            occupied: 0,
            tombstones: 0,
        }
    }

    fn make_hash<Q>(&self, q: &Q) -> u64
    where
        Q: ?Sized + Hash,
    {
        self.hasher.hash_one(q)
    }

    /// Probe the index for `q`, matching occupied slots against the store.
    fn locate<Q>(&self, hash: u64, q: &Q) -> Located
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq,
    {
        let store = &self.store;
        self.index.locate(hash, |pos| {
            let rec = store.get(pos);
            debug_assert!(rec.alive, "index slot references a dead record");
            rec.key.borrow() == q
        })
    }

    /// Number of present keys. Not the capacity.
    pub fn len(&self) -> usize {
        self.occupied
    }

    pub fn is_empty(&self) -> bool {
        self.occupied == 0
    }

    /// Size of the index table. Grows automatically; never shrinks.
    pub fn capacity(&self) -> usize {
        self.index.capacity()
    }

    /// Fraction of index slots holding an entry or a tombstone.
    pub fn load_factor(&self) -> f64 {
        (self.occupied + self.tombstones) as f64 / self.index.capacity() as f64
    }

    /// Insert or overwrite. Returns the previous value when `key` was
    /// already present; the entry keeps its position in iteration order.
    /// A new key is appended at the end, growing the table first if the
    /// load watermark would be crossed. Never fails.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let hash = self.make_hash(&key);
        if let Located::Found { entry, .. } = self.locate(hash, &key) {
            let rec = self.store.get_mut(entry);
            return Some(mem::replace(&mut rec.value, value));
        }
        if self.at_watermark() {
            self.grow();
        }
        loop {
            match self.locate(hash, &key) {
                Located::Vacant {
                    slot,
                    reclaims_tombstone,
                } => {
                    let pos = self.store.append(key, hash, value);
                    self.index.set(slot, Slot::Occupied(pos));
                    self.occupied += 1;
                    if reclaims_tombstone {
                        self.tombstones -= 1;
                    }
                    self.debug_check();
                    return None;
                }
                // The key was just verified absent, so `Found` cannot occur;
                // a saturated walk means no vacancy exists and the table
                // must grow before placing the entry.
                Located::Found { .. } | Located::Saturated => self.grow(),
            }
        }
    }

    /// Borrowed lookup; `None` when absent.
    pub fn find<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let hash = self.make_hash(key);
        match self.locate(hash, key) {
            Located::Found { entry, .. } => Some(&self.store.get(entry).value),
            _ => None,
        }
    }

    /// Lookup that reports a missing key as [`TableError::KeyNotFound`].
    pub fn get<Q>(&self, key: &Q) -> Result<&V, TableError>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq + fmt::Debug,
    {
        self.find(key).ok_or_else(|| TableError::key_not_found(key))
    }

    /// Lookup falling back to `default` when the key is absent.
    pub fn get_or_default<'a, Q>(&'a self, key: &Q, default: &'a V) -> &'a V
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.find(key).unwrap_or(default)
    }

    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let hash = self.make_hash(key);
        match self.locate(hash, key) {
            Located::Found { entry, .. } => Some(&mut self.store.get_mut(entry).value),
            _ => None,
        }
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.find(key).is_some()
    }

    /// Remove `key`: the record is marked dead and its slot becomes a
    /// tombstone, keeping later probe chains intact. Capacity is unchanged;
    /// tombstones are compacted away by the next growth rebuild. Fails with
    /// [`TableError::KeyNotFound`] when absent, leaving the map untouched.
    pub fn remove<Q>(&mut self, key: &Q) -> Result<(), TableError>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq + fmt::Debug,
    {
        let hash = self.make_hash(key);
        match self.locate(hash, key) {
            Located::Found { slot, entry } => {
                self.store.kill(entry);
                self.index.set(slot, Slot::Tombstone);
                self.occupied -= 1;
                self.tombstones += 1;
                self.debug_check();
                Ok(())
            }
            _ => Err(TableError::key_not_found(key)),
        }
    }

    /// Live entries in insertion order.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            it: self.store.records().iter(),
        }
    }

    /// Owned snapshot of the keys, in insertion order. Independent of the
    /// map: later mutation does not affect it, and two successive snapshots
    /// are separate allocations.
    pub fn keys(&self) -> Vec<K>
    where
        K: Clone,
    {
        self.iter().map(|(k, _)| k.clone()).collect()
    }

    /// Owned snapshot of the values, in insertion order. Duplicates are
    /// preserved (values are not deduplicated; keys are unique by invariant).
    pub fn values(&self) -> Vec<V>
    where
        V: Clone,
    {
        self.iter().map(|(_, v)| v.clone()).collect()
    }

    /// Owned snapshot of the `(key, value)` pairs, in insertion order.
    /// Exposed as an ordered sequence; map equality compares pairs as a set.
    pub fn pairs(&self) -> Vec<(K, V)>
    where
        K: Clone,
        V: Clone,
    {
        self.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }

    /// Canonical `{k1: v1, k2: v2}` rendering over live entries in insertion
    /// order. Informational; not a stable serialization format.
    pub fn to_canonical_string(&self) -> String
    where
        K: fmt::Display,
        V: fmt::Display,
    {
        self.to_string()
    }

    fn at_watermark(&self) -> bool {
        // One more filled slot would push (occupied + tombstones) past
        // 2/3 of capacity.
        (self.occupied + self.tombstones + 1) * 3 > self.index.capacity() * 2
    }

    fn grow(&mut self) {
        self.rebuild(self.index.capacity() * GROWTH_FACTOR);
    }

    /// Replace both levels: walk the old store in order, re-append live
    /// records into a fresh store (dead ones are dropped here and only
    /// here), and re-place them in a fresh index via their stored hashes.
    /// User `Hash` code is not re-invoked. Relative order of survivors is
    /// preserved; tombstones reset to zero.
    fn rebuild(&mut self, new_capacity: usize) {
        debug_assert!(new_capacity > self.occupied);
        let old = mem::replace(&mut self.store, EntryStore::with_capacity(self.occupied));
        let mut index = IndexTable::with_capacity(new_capacity);
        for rec in old.into_records() {
            if !rec.alive {
                continue;
            }
            // capacity > occupied, so a vacancy always exists
            let slot = index.vacant_for(rec.hash).unwrap();
            let pos = self.store.append(rec.key, rec.hash, rec.value);
            index.set(slot, Slot::Occupied(pos));
        }
        self.index = index;
        self.tombstones = 0;
        self.debug_check();
    }

    #[cfg(debug_assertions)]
    fn debug_check(&self) {
        let mut occupied = 0;
        let mut tombstones = 0;
        for s in 0..self.index.capacity() {
            match self.index.slot(s) {
                Slot::Empty => {}
                Slot::Tombstone => tombstones += 1,
                Slot::Occupied(pos) => {
                    occupied += 1;
                    debug_assert!(self.store.get(pos).alive);
                }
            }
        }
        debug_assert_eq!(occupied, self.occupied);
        debug_assert_eq!(tombstones, self.tombstones);
        debug_assert_eq!(self.store.iter_alive().count(), self.occupied);
        debug_assert!((self.occupied + self.tombstones) * 3 <= self.index.capacity() * 2);
    }

    #[cfg(not(debug_assertions))]
    #[inline]
    fn debug_check(&self) {}
}

impl<K, V, S> OrdHashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher + Default,
{
    /// Build a map from any exact-size `(key, value)` iterator, inserting
    /// in the source's own order. Capacity defaults to ten slots per pair
    /// (clamped to at least one for an empty source).
    pub fn from_mapping<I>(mapping: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        I::IntoIter: ExactSizeIterator,
    {
        let it = mapping.into_iter();
        let capacity = (it.len() * MAPPING_HEADROOM).max(1);
        let mut map = Self::raw(capacity, S::default());
        for (k, v) in it {
            map.insert(k, v);
        }
        map
    }

    /// [`OrdHashMap::from_mapping`] with an explicit capacity.
    pub fn from_mapping_with_capacity<I>(mapping: I, capacity: usize) -> Result<Self, TableError>
    where
        I: IntoIterator<Item = (K, V)>,
    {
        let mut map = Self::with_capacity_and_hasher(capacity, S::default())?;
        for (k, v) in mapping {
            map.insert(k, v);
        }
        Ok(map)
    }
}

/// Iterator over live entries in insertion order.
pub struct Iter<'a, K, V> {
    it: core::slice::Iter<'a, Record<K, V>>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        for rec in self.it.by_ref() {
            if rec.alive {
                return Some((&rec.key, &rec.value));
            }
        }
        None
    }
}

/// Iterator over live keys in insertion order; the map's default iteration.
pub struct Keys<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, _)| k)
    }
}

impl<'a, K, V, S> IntoIterator for &'a OrdHashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    type Item = &'a K;
    type IntoIter = Keys<'a, K, V>;

    fn into_iter(self) -> Keys<'a, K, V> {
        Keys { inner: self.iter() }
    }
}

impl<K, V, S> Extend<(K, V)> for OrdHashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl<K, V, S> FromIterator<(K, V)> for OrdHashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let pairs: Vec<(K, V)> = iter.into_iter().collect();
        Self::from_mapping(pairs)
    }
}

/// Content equality: same pair set, regardless of capacity, slot layout,
/// insertion order, or hasher type.
impl<K, V, S1, S2> PartialEq<OrdHashMap<K, V, S2>> for OrdHashMap<K, V, S1>
where
    K: Eq + Hash,
    V: PartialEq,
    S1: BuildHasher,
    S2: BuildHasher,
{
    fn eq(&self, other: &OrdHashMap<K, V, S2>) -> bool {
        self.len() == other.len()
            && self.iter().all(|(k, v)| other.find(k) == Some(v))
    }
}

impl<K, V, S> Eq for OrdHashMap<K, V, S>
where
    K: Eq + Hash,
    V: Eq,
    S: BuildHasher,
{
}

/// Deep copy with the source's capacity: live pairs are re-inserted in
/// iteration order into fresh storage, so the clone shares nothing with the
/// source and starts tombstone-free.
impl<K, V, S> Clone for OrdHashMap<K, V, S>
where
    K: Eq + Hash + Clone,
    V: Clone,
    S: BuildHasher + Clone,
{
    fn clone(&self) -> Self {
        let mut out = Self::raw(self.index.capacity(), self.hasher.clone());
        for (k, v) in self.iter() {
            out.insert(k.clone(), v.clone());
        }
        out
    }
}

impl<K, V, S> fmt::Display for OrdHashMap<K, V, S>
where
    K: Eq + Hash + fmt::Display,
    V: fmt::Display,
    S: BuildHasher,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (k, v)) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{k}: {v}")?;
        }
        write!(f, "}}")
    }
}

impl<K, V, S> fmt::Debug for OrdHashMap<K, V, S>
where
    K: Eq + Hash + fmt::Debug,
    V: fmt::Debug,
    S: BuildHasher,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Invariant: zero capacity is rejected; no partial map is returned.
    #[test]
    fn zero_capacity_rejected() {
        match OrdHashMap::<String, i32>::with_capacity(0) {
            Err(TableError::InvalidCapacity(0)) => {}
            other => panic!("unexpected result: {:?}", other.map(|_| ())),
        }
        assert!(OrdHashMap::<String, i32>::with_capacity(1).is_ok());
    }

    /// Invariant: overwrite replaces the value in place, returns the old
    /// one, and does not change len or iteration position.
    #[test]
    fn insert_overwrites_in_place() {
        let mut m: OrdHashMap<&str, i32> = OrdHashMap::new();
        assert_eq!(m.insert("a", 1), None);
        assert_eq!(m.insert("b", 2), None);
        assert_eq!(m.insert("a", 10), Some(1));
        assert_eq!(m.len(), 2);
        assert_eq!(m.keys(), vec!["a", "b"]);
        assert_eq!(m.get(&"a"), Ok(&10));
    }

    /// Invariant: remove leaves a tombstone (load factor counts it) and
    /// never shrinks capacity; a missing key is a typed error.
    #[test]
    fn remove_tombstones_and_errors() {
        let mut m: OrdHashMap<&str, i32> = OrdHashMap::with_capacity(9).unwrap();
        m.insert("a", 1);
        m.insert("b", 2);
        let lf_before = m.load_factor();
        m.remove(&"a").unwrap();
        assert_eq!(m.len(), 1);
        assert_eq!(m.capacity(), 9);
        assert_eq!(m.load_factor(), lf_before, "tombstone still counts");
        assert_eq!(
            m.remove(&"a"),
            Err(TableError::KeyNotFound("\"a\"".to_string()))
        );
    }

    /// Invariant: re-inserting a removed key appends it at the end of
    /// iteration order, not its old position.
    #[test]
    fn reinsert_moves_to_end() {
        let mut m: OrdHashMap<&str, i32> = OrdHashMap::new();
        m.insert("a", 1);
        m.insert("b", 2);
        m.insert("c", 3);
        m.remove(&"a").unwrap();
        m.insert("a", 4);
        assert_eq!(m.keys(), vec!["b", "c", "a"]);
        assert_eq!(m.get(&"a"), Ok(&4));
    }

    /// Invariant: growth preserves pair content and relative order, and
    /// resets tombstone accounting.
    #[test]
    fn growth_compacts_and_preserves_order() {
        let mut m: OrdHashMap<String, usize> = OrdHashMap::with_capacity(3).unwrap();
        m.insert("dead".to_string(), 0);
        m.remove("dead").unwrap();
        for i in 0..20 {
            m.insert(format!("k{i}"), i);
        }
        assert_eq!(m.len(), 20);
        assert!(m.capacity() >= 20);
        let keys: Vec<String> = (0..20).map(|i| format!("k{i}")).collect();
        assert_eq!(m.keys(), keys);
        for i in 0..20 {
            assert_eq!(m.find(format!("k{i}").as_str()), Some(&i));
        }
    }

    /// Invariant: the load watermark keeps at least one empty index slot,
    /// so probe walks terminate early even under churn.
    #[test]
    fn watermark_bounds_fill() {
        let mut m: OrdHashMap<u32, u32> = OrdHashMap::with_capacity(1).unwrap();
        for i in 0..200 {
            m.insert(i, i);
            if i % 3 == 0 {
                m.remove(&i).unwrap();
            }
            assert!(m.len() < m.capacity());
            assert!(m.load_factor() <= 2.0 / 3.0 + f64::EPSILON);
        }
    }

    /// Invariant: borrowed lookups work (store `String`, query `&str`).
    #[test]
    fn borrowed_lookup_with_str() {
        let mut m: OrdHashMap<String, i32> = OrdHashMap::new();
        m.insert("hello".to_string(), 1);
        assert!(m.contains_key("hello"));
        assert!(!m.contains_key("world"));
        assert_eq!(m.find("hello"), Some(&1));
        assert_eq!(
            m.get("world"),
            Err(TableError::KeyNotFound("\"world\"".to_string()))
        );
    }

    /// Invariant: `Display` renders live pairs in insertion order.
    #[test]
    fn canonical_string_in_order() {
        let mut m: OrdHashMap<&str, i32> = OrdHashMap::new();
        assert_eq!(m.to_canonical_string(), "{}");
        m.insert("a", 1);
        m.insert("b", 2);
        m.insert("c", 3);
        m.remove(&"b").unwrap();
        assert_eq!(m.to_canonical_string(), "{a: 1, c: 3}");
    }

    /// Invariant: default iteration over `&map` yields keys in order.
    #[test]
    fn default_iteration_yields_keys() {
        let mut m: OrdHashMap<&str, i32> = OrdHashMap::new();
        m.insert("x", 1);
        m.insert("y", 2);
        let ks: Vec<&&str> = (&m).into_iter().collect();
        assert_eq!(ks, vec![&"x", &"y"]);
    }

    /// Invariant: `from_mapping` sizes the table at ten slots per pair and
    /// keeps the source order; the empty mapping still gets a valid table.
    #[test]
    fn from_mapping_capacity_and_order() {
        let m: OrdHashMap<&str, i32> = OrdHashMap::from_mapping(vec![("a", 1), ("b", 2)]);
        assert_eq!(m.capacity(), 20);
        assert_eq!(m.keys(), vec!["a", "b"]);

        let empty: OrdHashMap<&str, i32> = OrdHashMap::from_mapping(Vec::new());
        assert_eq!(empty.capacity(), 1);
        assert!(empty.is_empty());
    }
}
