//! ord-hashmap: a single-threaded, insertion-order-preserving hash map with
//! open addressing, tombstone deletion, and automatic growth.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: build OrdHashMap in small, verifiable layers so each piece can be
//!   reasoned about independently.
//! - Layers:
//!   - ProbeSeq: the deterministic probe order: linear probing with step 1,
//!     wrapping modulo capacity, visiting every slot exactly once before
//!     ending. A pure function of `(hash, capacity)`.
//!   - IndexTable: a sparse array of slots (`Empty | Tombstone |
//!     Occupied(pos)`) that resolves a hash to a store position by walking
//!     the probe sequence; knows nothing about keys.
//!   - EntryStore: the ordered record sequence `(key, hash, value, alive)`,
//!     the single source of truth for iteration order and content.
//!   - OrdHashMap<K, V, S>: the public façade composing the above:
//!     insert/get/remove/contains, owned snapshots, equality, clone, and the
//!     watermark-triggered grow-and-compact cycle.
//!
//! Constraints
//! - Single-threaded: all mutation goes through `&mut self`; no internal
//!   locking, no interior mutability. External synchronization is the
//!   caller's job when sharing across threads.
//! - Every operation is bounded by O(capacity) and terminates; probe walks
//!   are finite by construction.
//! - Growth only: removal never shrinks capacity. Tombstones accumulate
//!   until the next growth rebuild compacts them away.
//! - Overwriting insert keeps an entry's iteration position; re-inserting a
//!   removed key appends at the end.
//!
//! Why this split?
//! - Localize invariants: the probe walk, the slot discipline, and the
//!   liveness bookkeeping each have a small, precise contract.
//! - The index table takes a matcher closure instead of seeing keys, so the
//!   only place user code (`K: Eq`) runs during probing is one visible seam.
//!
//! Hasher and rebuild invariants
//! - Each record stores its `u64` hash at insertion and every later probe,
//!   including the growth rebuild, reuses the stored hash; `K: Hash` is
//!   never invoked after insertion.
//! - The load watermark (occupied + tombstones kept at or below 2/3 of
//!   capacity) guarantees the index always has an empty slot, so lookups
//!   terminate without probing the whole table.
//!
//! Notes and non-goals
//! - No thread-safety; no cancellation or timeout concept.
//! - The `{k: v, ...}` rendering is informational, not a serialization
//!   format.
//! - Snapshot accessors (`keys`/`values`/`pairs`) return owned, independent
//!   vectors, never views into the map.
//! - Errors are typed (`TableError`): zero capacity at construction, missing
//!   key on `get`/`remove`. `insert` never fails.

mod index;
mod map;
mod map_proptest;
mod probe;
mod store;

// Public surface
pub use map::{Iter, Keys, OrdHashMap, TableError};
