#![cfg(test)]

// Property tests for OrdHashMap kept inside the crate so they exercise the
// map through its public surface without feature gates.

use crate::map::{OrdHashMap, TableError};
use proptest::prelude::*;
use std::fmt;
use std::hash::{BuildHasher, Hasher};

// Key newtype with Borrow<str> to exercise borrowed lookup.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
struct Key(String);
impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
impl std::borrow::Borrow<str> for Key {
    fn borrow(&self) -> &str {
        &self.0
    }
}

// Ordered model: a Vec of pairs with the map's overwrite/remove/reinsert
// order semantics. Overwrite keeps position; remove deletes; reinsert
// appends at the end.
struct Model {
    pairs: Vec<(Key, i32)>,
}

impl Model {
    fn new() -> Self {
        Self { pairs: Vec::new() }
    }
    fn insert(&mut self, k: Key, v: i32) -> Option<i32> {
        if let Some(p) = self.pairs.iter_mut().find(|(pk, _)| *pk == k) {
            return Some(std::mem::replace(&mut p.1, v));
        }
        self.pairs.push((k, v));
        None
    }
    fn remove(&mut self, k: &Key) -> bool {
        match self.pairs.iter().position(|(pk, _)| pk == k) {
            Some(i) => {
                self.pairs.remove(i);
                true
            }
            None => false,
        }
    }
    fn get(&self, k: &Key) -> Option<i32> {
        self.pairs.iter().find(|(pk, _)| pk == k).map(|(_, v)| *v)
    }
    fn len(&self) -> usize {
        self.pairs.len()
    }
}

// Pool-indexed operations to improve shrinking: indices shrink to earlier
// keys, pool length shrinks, and op lists shrink in length.
#[derive(Clone, Debug)]
enum OpI {
    Insert(usize, i32),
    Remove(usize),
    Get(usize),
    GetOrDefault(usize, i32),
    Contains(String),
    Snapshot,
    Iterate,
    CloneEq,
}

fn key_from(pool: &[String], i: usize) -> Key {
    Key(pool[i].clone())
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<OpI>)> {
    proptest::collection::vec("[a-z]{0,5}", 1..=8).prop_flat_map(|pool| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let contains_pool = proptest::sample::select(pool.clone());
        let op = prop_oneof![
            (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::Insert(i, v)),
            idx.clone().prop_map(OpI::Remove),
            idx.clone().prop_map(OpI::Get),
            (idx.clone(), any::<i32>()).prop_map(|(i, d)| OpI::GetOrDefault(i, d)),
            prop_oneof![
                contains_pool.prop_map(|s: String| s),
                "[a-z]{0,5}".prop_map(|s| s)
            ]
            .prop_map(OpI::Contains),
            Just(OpI::Snapshot),
            Just(OpI::Iterate),
            Just(OpI::CloneEq),
        ];
        proptest::collection::vec(op, 1..60).prop_map(move |ops| (pool.clone(), ops))
    })
}

fn run_scenario<S>(
    mut sut: OrdHashMap<Key, i32, S>,
    pool: Vec<String>,
    ops: Vec<OpI>,
) -> Result<(), TestCaseError>
where
    S: BuildHasher + Clone,
{
    let mut model = Model::new();
    for op in ops {
        match op {
            OpI::Insert(i, v) => {
                let k = key_from(&pool, i);
                let prev = sut.insert(k.clone(), v);
                let model_prev = model.insert(k, v);
                prop_assert_eq!(prev, model_prev, "overwrite must return prior value");
            }
            OpI::Remove(i) => {
                let k = key_from(&pool, i);
                let present = model.remove(&k);
                match sut.remove(&k) {
                    Ok(()) => prop_assert!(present, "remove succeeded on absent key"),
                    Err(TableError::KeyNotFound(_)) => prop_assert!(!present),
                    Err(e) => prop_assert!(false, "unexpected error: {e}"),
                }
            }
            OpI::Get(i) => {
                let k = key_from(&pool, i);
                match (sut.get(&k), model.get(&k)) {
                    (Ok(v), Some(mv)) => prop_assert_eq!(*v, mv),
                    (Err(TableError::KeyNotFound(_)), None) => {}
                    (got, want) => {
                        prop_assert!(false, "get parity broken: {:?} vs {:?}", got, want)
                    }
                }
            }
            OpI::GetOrDefault(i, d) => {
                let k = key_from(&pool, i);
                let got = *sut.get_or_default(&k, &d);
                prop_assert_eq!(got, model.get(&k).unwrap_or(d));
            }
            OpI::Contains(s) => {
                let has = sut.contains_key(s.as_str());
                let has_model = model.pairs.iter().any(|(k, _)| k.0 == s);
                prop_assert_eq!(has, has_model);
            }
            OpI::Snapshot => {
                // Snapshots are owned and order-preserving; two in a row are
                // independent but equal.
                let k1 = sut.keys();
                let k2 = sut.keys();
                prop_assert_eq!(&k1, &k2);
                let model_keys: Vec<Key> = model.pairs.iter().map(|(k, _)| k.clone()).collect();
                prop_assert_eq!(k1, model_keys);
                let model_vals: Vec<i32> = model.pairs.iter().map(|(_, v)| *v).collect();
                prop_assert_eq!(sut.values(), model_vals);
                prop_assert_eq!(sut.pairs(), model.pairs.clone());
            }
            OpI::Iterate => {
                let got: Vec<(Key, i32)> = sut.iter().map(|(k, v)| (k.clone(), *v)).collect();
                prop_assert_eq!(got, model.pairs.clone());
            }
            OpI::CloneEq => {
                let copy = sut.clone();
                prop_assert!(copy == sut, "clone must compare equal");
                prop_assert_eq!(copy.capacity(), sut.capacity());
                prop_assert_eq!(copy.keys(), sut.keys());
            }
        }

        // Post-conditions after each op
        prop_assert_eq!(sut.len(), model.len());
        prop_assert_eq!(sut.is_empty(), model.len() == 0);
        prop_assert!(sut.len() < sut.capacity(), "watermark keeps slack");
        prop_assert!(sut.load_factor() <= 2.0 / 3.0 + f64::EPSILON);
    }
    Ok(())
}

// Property: state-machine equivalence against an ordered model across random
// operation sequences. Invariants exercised:
// - insert/overwrite parity including the returned prior value;
// - remove succeeds exactly when the key is present, KeyNotFound otherwise;
// - iteration and snapshots reproduce the model's pair order exactly
//   (overwrite keeps position, reinsert appends);
// - clone compares equal with the same capacity;
// - len/is_empty parity and the load watermark after every op.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((pool, ops) in arb_scenario()) {
        // Tiny initial capacity so growth and compaction happen often.
        let sut: OrdHashMap<Key, i32> = OrdHashMap::with_capacity(2).unwrap();
        run_scenario(sut, pool, ops)?;
    }
}

// Collision variant using a constant hasher to stress probing, tombstone
// reuse, and the ordered rebuild under worst-case clustering.
#[derive(Clone, Default)]
struct ConstBuildHasher;
struct ConstHasher;
impl BuildHasher for ConstBuildHasher {
    type Hasher = ConstHasher;
    fn build_hasher(&self) -> Self::Hasher {
        ConstHasher
    }
}
impl Hasher for ConstHasher {
    fn write(&mut self, _bytes: &[u8]) {}
    fn finish(&self) -> u64 {
        0
    }
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_with_collisions((pool, ops) in arb_scenario()) {
        let sut: OrdHashMap<Key, i32, ConstBuildHasher> =
            OrdHashMap::with_capacity_and_hasher(2, ConstBuildHasher).unwrap();
        run_scenario(sut, pool, ops)?;
    }
}
