//! Reference-counted value interner
//!
//! An open-addressed hash set with Robin-hood probing that hands out small,
//! stable integer ids for interned values. Each entry carries a reference
//! count; entries whose count drops to zero stay in the table as lazy
//! tombstones until their slot or id is reclaimed by a later insert.
//!
//! The probe policy orders residents by `(psl, refcount)`: an insert displaces
//! a resident with a strictly shorter probe sequence, or an equal probe
//! sequence and a smaller reference count, so that hot values sit closest to
//! their home bucket.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Id handed out for interned values. `0` is reserved and never issued.
pub type Id = u16;

/// The reserved id. Pages use it for the default style.
pub const DEFAULT_ID: Id = 0;

/// Default table capacity when none is requested.
const DEFAULT_CAPACITY: usize = 1000;

/// Probe-sequence-length stats array size. Probe chains longer than this
/// would mean the table is effectively full.
const PSL_STATS: usize = 32;

#[derive(Debug, Clone)]
struct Entry<T> {
    value: T,
    /// The table bucket currently holding this entry's id.
    bucket: usize,
    /// Probe sequence length from the value's home bucket.
    psl: usize,
    /// Live references. Zero means the entry is a tombstone.
    refs: u32,
}

/// A ref-counted set of values with stable ids.
#[derive(Debug, Clone)]
pub struct RefCountedSet<T> {
    /// Entries indexed by id. Index 0 is never occupied.
    items: Vec<Option<Entry<T>>>,
    /// Bucket -> id. `0` marks an empty bucket.
    table: Vec<Id>,
    /// Number of entries per probe sequence length, used to shrink
    /// `max_psl` on delete.
    psl_stats: [i64; PSL_STATS],
    max_psl: usize,
    /// Next id to issue. Starts at 1; 0 is reserved.
    next_id: Id,
    /// Entries with a nonzero reference count.
    living: usize,
}

impl<T: Hash + Eq + Clone> RefCountedSet<T> {
    pub fn new(capacity: Option<usize>) -> Self {
        let capacity = capacity.unwrap_or(DEFAULT_CAPACITY);
        assert!(capacity > 1, "capacity must leave room for the reserved id");
        Self {
            items: vec![None; capacity],
            table: vec![0; capacity],
            psl_stats: [0; PSL_STATS],
            max_psl: 0,
            next_id: 1,
            living: 0,
        }
    }

    fn hash_of(value: &T) -> u64 {
        let mut hasher = DefaultHasher::new();
        value.hash(&mut hasher);
        hasher.finish()
    }

    /// Intern `value`, incrementing its reference count. Returns the id of
    /// the existing equal entry if there is one.
    ///
    /// Panics if the table has no room left; callers size the capacity to
    /// the expected live set.
    pub fn add(&mut self, value: T) -> Id {
        // Reclaim dead ids from the tail so they can be reissued.
        while self.next_id > 1 {
            let prev = self.next_id - 1;
            match &self.items[prev as usize] {
                Some(entry) if entry.refs == 0 => {
                    self.next_id = prev;
                    self.delete(prev);
                }
                _ => break,
            }
        }

        if let Some(id) = self.lookup(&value) {
            let entry = self.items[id as usize].as_mut().unwrap();
            entry.refs += 1;
            return id;
        }

        let id = self.insert(self.next_id, value);
        let entry = self.items[id as usize].as_mut().unwrap();
        entry.refs += 1;
        assert_eq!(entry.refs, 1, "fresh entry must start with one reference");
        self.living += 1;

        // The id differs from next_id when a dead entry's id was reused.
        if id == self.next_id {
            self.next_id += 1;
        }
        id
    }

    /// Insert a value that is known to be absent, placing it under `new_id`
    /// unless a dead entry with a smaller id is resurrected along the probe
    /// chain.
    fn insert(&mut self, new_id: Id, value: T) -> Id {
        debug_assert!(self.lookup(&value).is_none(), "value already interned");
        assert!(
            (new_id as usize) < self.items.len(),
            "ref-counted set is full"
        );

        let hash = Self::hash_of(&value);
        let len = self.table.len();

        // The id currently being carried along the probe chain, and its
        // probe distance. `held == new_id` refers to the pending value,
        // which is not in `items` yet.
        let mut held: Id = new_id;
        let mut held_psl: usize = 0;
        let mut chosen = new_id;
        // Home bucket of the pending value, fixed once it is parked.
        let mut pending_bucket: Option<(usize, usize)> = None;

        let mut placed = false;
        for i in 0..=len {
            let p = (hash as usize + i) % len;
            let resident = self.table[p];

            if resident == 0 {
                // Empty bucket: park whatever we are holding.
                self.table[p] = held;
                if held == new_id {
                    pending_bucket = Some((p, held_psl));
                } else {
                    let entry = self.items[held as usize].as_mut().unwrap();
                    entry.bucket = p;
                    entry.psl = held_psl;
                }
                assert!(held_psl < PSL_STATS, "probe chain too long");
                self.psl_stats[held_psl] += 1;
                self.max_psl = self.max_psl.max(held_psl);
                placed = true;
                break;
            }

            let (res_psl, res_refs) = {
                let entry = self.items[resident as usize].as_ref().unwrap();
                (entry.psl, entry.refs)
            };

            if res_refs == 0 {
                // Dead entry: reap it and take its bucket. Reuse its id if
                // it is smaller than the one we were given.
                self.psl_stats[res_psl] -= 1;
                self.items[resident as usize] = None;
                if resident < new_id {
                    chosen = resident;
                }
                self.table[p] = held;
                if held == new_id {
                    pending_bucket = Some((p, held_psl));
                } else {
                    let entry = self.items[held as usize].as_mut().unwrap();
                    entry.bucket = p;
                    entry.psl = held_psl;
                }
                assert!(held_psl < PSL_STATS, "probe chain too long");
                self.psl_stats[held_psl] += 1;
                self.max_psl = self.max_psl.max(held_psl);
                placed = true;
                break;
            }

            let held_refs = if held == new_id {
                0
            } else {
                self.items[held as usize].as_ref().unwrap().refs
            };

            if res_psl < held_psl || (res_psl == held_psl && res_refs < held_refs) {
                // Robin-hood swap: the resident has had a shorter probe, so
                // it yields its bucket and becomes the held item.
                self.table[p] = held;
                if held == new_id {
                    pending_bucket = Some((p, held_psl));
                } else {
                    let entry = self.items[held as usize].as_mut().unwrap();
                    entry.bucket = p;
                    entry.psl = held_psl;
                }
                assert!(held_psl < PSL_STATS, "probe chain too long");
                self.psl_stats[held_psl] += 1;
                self.max_psl = self.max_psl.max(held_psl);
                self.psl_stats[res_psl] -= 1;
                held = resident;
                held_psl = res_psl;
            }

            held_psl += 1;
        }
        assert!(placed, "ref-counted set probe exhausted the table");

        let (bucket, psl) = pending_bucket.expect("pending value was never parked");
        // The bucket that parked the pending value must carry the chosen id,
        // which may be a resurrected smaller id.
        self.table[bucket] = chosen;
        self.items[chosen as usize] = Some(Entry {
            value,
            bucket,
            psl,
            refs: 0,
        });
        chosen
    }

    /// Hard-remove an entry, back-shifting the rest of its probe chain and
    /// freeing the id for reuse.
    fn delete(&mut self, id: Id) {
        let (bucket, psl, refs) = {
            let entry = self.items[id as usize].as_ref().expect("deleting a free id");
            (entry.bucket, entry.psl, entry.refs)
        };
        assert_eq!(self.table[bucket], id, "table does not reference this id");

        self.psl_stats[psl] -= 1;
        self.table[bucket] = 0;
        self.items[id as usize] = None;

        let len = self.table.len();
        let mut prev = bucket;
        let mut next = (prev + 1) % len;

        // Back-shift the rest of the chain so lookups never cross a hole.
        while self.table[next] != 0 {
            let next_id = self.table[next];
            let entry = self.items[next_id as usize].as_mut().unwrap();
            if entry.psl == 0 {
                break;
            }
            entry.bucket = prev;
            entry.psl -= 1;
            self.psl_stats[entry.psl + 1] -= 1;
            self.psl_stats[entry.psl] += 1;
            self.table[prev] = next_id;
            prev = next;
            next = (next + 1) % len;
        }

        while self.max_psl > 0 && self.psl_stats[self.max_psl] == 0 {
            self.max_psl -= 1;
        }

        self.table[prev] = 0;

        if refs > 0 {
            self.living -= 1;
        }
    }

    /// Release one reference. The entry stays in the table as a tombstone
    /// when its count reaches zero.
    pub fn release(&mut self, id: Id) {
        assert!(id != 0, "cannot release the reserved id");
        let entry = self.items[id as usize].as_mut().expect("releasing a free id");
        assert!(entry.refs > 0, "release without a matching reference");
        entry.refs -= 1;
        if entry.refs == 0 {
            self.living -= 1;
        }
    }

    /// Add a reference to an existing live entry.
    pub fn use_ref(&mut self, id: Id) {
        assert!(id != 0, "cannot reference the reserved id");
        let entry = self.items[id as usize].as_mut().expect("using a free id");
        // A zero count here means someone released too early or never
        // acquired; either way the id is not safe to hand out again.
        assert!(entry.refs > 0, "use of a dead entry");
        entry.refs += 1;
    }

    /// Find the id of an equal live value.
    pub fn lookup(&self, value: &T) -> Option<Id> {
        let hash = Self::hash_of(value);
        let len = self.table.len();

        for i in 0..=self.max_psl {
            let p = (hash as usize + i) % len;
            let id = self.table[p];

            // An empty bucket ends every probe chain passing through it.
            if id == 0 {
                return None;
            }

            let entry = self.items[id as usize].as_ref().unwrap();

            // A resident with a shorter probe distance means our value, had
            // it been inserted, would have displaced it.
            if entry.psl < i {
                return None;
            }

            if entry.refs == 0 {
                continue;
            }

            if entry.psl == i && entry.value == *value {
                return Some(id);
            }
        }
        None
    }

    /// Get the value for a live id.
    pub fn get(&self, id: Id) -> Option<&T> {
        self.items
            .get(id as usize)?
            .as_ref()
            .filter(|e| e.refs > 0)
            .map(|e| &e.value)
    }

    /// The reference count for an id, zero if dead or free.
    pub fn ref_count(&self, id: Id) -> u32 {
        self.items
            .get(id as usize)
            .and_then(|e| e.as_ref())
            .map_or(0, |e| e.refs)
    }

    /// Number of live entries.
    pub fn count(&self) -> usize {
        self.living
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_set() -> RefCountedSet<u64> {
        RefCountedSet::new(None)
    }

    #[test]
    fn test_add_and_lookup() {
        let mut set = new_set();
        assert!(set.lookup(&42).is_none());

        let id = set.add(42);
        assert_ne!(id, 0);
        assert_eq!(set.count(), 1);
        assert_eq!(set.lookup(&42), Some(id));
    }

    #[test]
    fn test_ref_counting() {
        let mut set = new_set();
        let id = set.add(1);
        assert_eq!(set.ref_count(id), 1);

        set.use_ref(id);
        set.use_ref(id);
        assert_eq!(set.ref_count(id), 3);

        set.release(id);
        set.release(id);
        assert_eq!(set.ref_count(id), 1);
        assert_eq!(set.count(), 1);

        set.release(id);
        assert_eq!(set.ref_count(id), 0);
        assert_eq!(set.count(), 0);
    }

    #[test]
    fn test_add_duplicate_increments_ref() {
        let mut set = new_set();
        let id1 = set.add(99);
        let id2 = set.add(99);
        assert_eq!(id1, id2);
        assert_eq!(set.ref_count(id1), 2);
    }

    #[test]
    fn test_add_release_restores_count() {
        // add(v); release(id) leaves count() unchanged from before the add.
        let mut set = new_set();
        set.add(7);
        let before = set.count();
        let id = set.add(8);
        set.release(id);
        assert_eq!(set.count(), before);
    }

    #[test]
    fn test_add_multiple_unique() {
        let mut set = new_set();
        let id1 = set.add(1);
        let id2 = set.add(2);
        let id3 = set.add(3);
        assert_ne!(id1, id2);
        assert_ne!(id2, id3);
        assert_ne!(id1, id3);
        assert_eq!(set.count(), 3);
    }

    #[test]
    fn test_dead_id_reuse() {
        let mut set = new_set();
        let id = set.add(100);
        set.release(id);

        // The dead tail id is reclaimed, so the next insert may reuse it.
        let id2 = set.add(200);
        assert_eq!(set.count(), 1);
        assert!(set.lookup(&100).is_none());
        assert_eq!(set.lookup(&200), Some(id2));
    }

    #[test]
    fn test_lookup_skips_dead_entries() {
        let mut set = new_set();
        let id = set.add(5);
        set.release(id);
        assert!(set.lookup(&5).is_none());
    }

    #[test]
    #[should_panic]
    fn test_release_below_zero_panics() {
        let mut set = new_set();
        let id = set.add(7);
        set.release(id);
        set.release(id);
    }

    #[test]
    fn test_use_ref_increments() {
        let mut set = new_set();
        let id = set.add(55);
        set.use_ref(id);
        assert_eq!(set.ref_count(id), 2);
    }

    #[test]
    fn test_many_values_probe_chains() {
        // Force collisions and long chains with a small table.
        let mut set: RefCountedSet<u64> = RefCountedSet::new(Some(64));
        let mut ids = Vec::new();
        for v in 0..40u64 {
            ids.push((v, set.add(v)));
        }
        assert_eq!(set.count(), 40);
        for (v, id) in &ids {
            assert_eq!(set.lookup(v), Some(*id), "value {}", v);
        }
        // Release half and make sure the rest still resolve.
        for (v, id) in &ids {
            if v % 2 == 0 {
                set.release(*id);
            }
        }
        for (v, id) in &ids {
            if v % 2 == 1 {
                assert_eq!(set.lookup(v), Some(*id), "value {}", v);
            } else {
                assert!(set.lookup(v).is_none(), "value {}", v);
            }
        }
    }
}
