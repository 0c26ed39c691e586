//! Extendible hash table.
//!
//! A hash map organized as a directory of pointers to fixed-capacity
//! buckets. The directory always holds `2^global_depth` slots; each bucket
//! carries its own local depth `d <= global_depth` and is shared by every
//! directory slot whose low `d` index bits agree. When an insert lands in a
//! full bucket, the bucket splits at its local depth, doubling the directory
//! first if the bucket is already at global depth.
//!
//! Unlike a chained hash map, growth is incremental: a split touches one
//! bucket and the directory, never the whole table.

use std::collections::hash_map::RandomState;
use std::hash::{BuildHasher, Hash};

use parking_lot::Mutex;

/// A bucket holds a bounded list of entries and its local depth.
struct Bucket<K, V> {
    depth: usize,
    items: Vec<(K, V)>,
}

impl<K, V> Bucket<K, V> {
    fn new(depth: usize, capacity: usize) -> Self {
        Self {
            depth,
            items: Vec::with_capacity(capacity),
        }
    }
}

/// Table state behind the mutex.
///
/// The directory stores indices into `buckets` rather than shared pointers;
/// slot aliasing is expressed by two directory entries holding the same
/// index.
struct Inner<K, V> {
    global_depth: usize,
    bucket_size: usize,
    num_buckets: usize,
    dir: Vec<usize>,
    buckets: Vec<Bucket<K, V>>,
}

impl<K, V> Inner<K, V> {
    /// Directory slot for a hash at the current global depth.
    #[inline]
    fn dir_index(&self, hash: u64) -> usize {
        (hash as usize) & ((1 << self.global_depth) - 1)
    }
}

/// Concurrent extendible hash table.
///
/// Generic over key, value, and hasher like [`std::collections::HashMap`];
/// the hasher parameter lets callers pin a deterministic hash when bucket
/// placement must be reproducible. All operations take `&self`; a single
/// internal mutex serializes the whole table.
///
/// # Example
///
/// ```rust
/// use strata_cache::ExtendibleHashTable;
///
/// let table: ExtendibleHashTable<u64, u64> = ExtendibleHashTable::new(4);
/// table.insert(1, 10);
/// table.insert(1, 20);
/// assert_eq!(table.find(&1), Some(20));
/// assert!(table.remove(&1));
/// assert_eq!(table.find(&1), None);
/// ```
pub struct ExtendibleHashTable<K, V, S = RandomState> {
    hash_builder: S,
    inner: Mutex<Inner<K, V>>,
}

impl<K, V> ExtendibleHashTable<K, V, RandomState> {
    /// Creates a table whose buckets hold up to `bucket_size` entries.
    ///
    /// # Panics
    ///
    /// Panics if `bucket_size` is zero.
    pub fn new(bucket_size: usize) -> Self {
        Self::with_hasher(bucket_size, RandomState::new())
    }
}

impl<K, V, S> ExtendibleHashTable<K, V, S> {
    /// Creates a table with the given bucket capacity and hasher.
    ///
    /// # Panics
    ///
    /// Panics if `bucket_size` is zero.
    pub fn with_hasher(bucket_size: usize, hash_builder: S) -> Self {
        assert!(bucket_size > 0, "bucket_size must be positive");
        Self {
            hash_builder,
            inner: Mutex::new(Inner {
                global_depth: 0,
                bucket_size,
                num_buckets: 1,
                dir: vec![0],
                buckets: vec![Bucket::new(0, bucket_size)],
            }),
        }
    }

    /// Returns the global depth of the directory.
    pub fn global_depth(&self) -> usize {
        self.inner.lock().global_depth
    }

    /// Returns the local depth of the bucket at directory slot `dir_index`.
    ///
    /// # Panics
    ///
    /// Panics if `dir_index` is out of range for the current directory.
    pub fn local_depth(&self, dir_index: usize) -> usize {
        let inner = self.inner.lock();
        inner.buckets[inner.dir[dir_index]].depth
    }

    /// Returns the number of buckets in the table.
    pub fn num_buckets(&self) -> usize {
        self.inner.lock().num_buckets
    }
}

impl<K, V, S> ExtendibleHashTable<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    #[inline]
    fn hash(&self, key: &K) -> u64 {
        self.hash_builder.hash_one(key)
    }

    /// Looks up the value for `key`.
    pub fn find(&self, key: &K) -> Option<V>
    where
        V: Clone,
    {
        let inner = self.inner.lock();
        let bucket = &inner.buckets[inner.dir[inner.dir_index(self.hash(key))]];
        bucket
            .items
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
    }

    /// Removes the entry for `key`, returning whether it was present.
    ///
    /// Buckets never merge and the directory never shrinks.
    pub fn remove(&self, key: &K) -> bool {
        let mut inner = self.inner.lock();
        let idx = inner.dir[inner.dir_index(self.hash(key))];
        let bucket = &mut inner.buckets[idx];
        match bucket.items.iter().position(|(k, _)| k == key) {
            Some(pos) => {
                bucket.items.remove(pos);
                true
            }
            None => false,
        }
    }

    /// Inserts `key` -> `value`, overwriting any existing value for `key`.
    ///
    /// When the target bucket is full the bucket splits, doubling the
    /// directory if its local depth already equals the global depth. One
    /// insert may trigger a cascade of splits when every entry of the old
    /// bucket lands in the same child; the cascade terminates because each
    /// split deepens the bucket by one bit.
    pub fn insert(&self, key: K, value: V) {
        let mut inner = self.inner.lock();
        let hash = self.hash(&key);

        // An existing key is updated in place; occupancy does not change,
        // so no split is needed.
        let idx = inner.dir[inner.dir_index(hash)];
        if let Some(entry) = inner.buckets[idx].items.iter_mut().find(|(k, _)| *k == key) {
            entry.1 = value;
            return;
        }

        loop {
            let idx = inner.dir[inner.dir_index(hash)];
            if inner.buckets[idx].items.len() < inner.bucket_size {
                inner.buckets[idx].items.push((key, value));
                return;
            }
            self.split(&mut inner, idx);
        }
    }

    /// Splits the bucket at `old_idx` into two children of depth `d + 1`.
    ///
    /// The old slot keeps the entries whose distinguishing bit is zero; a
    /// fresh bucket takes the rest. Every directory slot that pointed at the
    /// old bucket is rewired by that same bit.
    fn split(&self, inner: &mut Inner<K, V>, old_idx: usize) {
        let local = inner.buckets[old_idx].depth;

        if local == inner.global_depth {
            inner.dir.extend_from_within(..);
            inner.global_depth += 1;
        }

        let mask = 1usize << local;
        let items = std::mem::take(&mut inner.buckets[old_idx].items);
        inner.buckets[old_idx].depth = local + 1;

        let sibling_idx = inner.buckets.len();
        let capacity = inner.bucket_size;
        inner.buckets.push(Bucket::new(local + 1, capacity));
        inner.num_buckets += 1;

        for (key, value) in items {
            let child = if (self.hash(&key) as usize) & mask == 0 {
                old_idx
            } else {
                sibling_idx
            };
            inner.buckets[child].items.push((key, value));
        }

        for (i, slot) in inner.dir.iter_mut().enumerate() {
            if *slot == old_idx && i & mask != 0 {
                *slot = sibling_idx;
            }
        }
    }
}

impl<K, V, S> std::fmt::Debug for ExtendibleHashTable<K, V, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("ExtendibleHashTable")
            .field("global_depth", &inner.global_depth)
            .field("num_buckets", &inner.num_buckets)
            .field("bucket_size", &inner.bucket_size)
            .finish()
    }
}
