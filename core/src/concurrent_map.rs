//! Sharded map used to accumulate per-document relevance from parallel workers.

use crate::DocId;
use parking_lot::Mutex;
use std::collections::BTreeMap;

pub const DEFAULT_SHARD_COUNT: usize = 64;

pub struct ConcurrentMap<V> {
    shards: Vec<Mutex<BTreeMap<DocId, V>>>,
}

impl<V> ConcurrentMap<V> {
    pub fn new(shard_count: usize) -> Self {
        let shard_count = shard_count.max(1);
        let shards = (0..shard_count).map(|_| Mutex::new(BTreeMap::new())).collect();
        Self { shards }
    }

    fn shard(&self, key: DocId) -> &Mutex<BTreeMap<DocId, V>> {
        let idx = key.unsigned_abs() as usize % self.shards.len();
        &self.shards[idx]
    }

    /// Apply `f` to the value under `key`, inserting `V::default()` first if absent.
    pub fn update<F>(&self, key: DocId, f: F)
    where
        V: Default,
        F: FnOnce(&mut V),
    {
        let mut shard = self.shard(key).lock();
        f(shard.entry(key).or_default());
    }

    pub fn erase(&self, key: DocId) {
        self.shard(key).lock().remove(&key);
    }

    /// Merge every shard into one ordered map. Call after all writers are joined.
    pub fn into_ordinary_map(self) -> BTreeMap<DocId, V> {
        let mut out = BTreeMap::new();
        for shard in self.shards {
            out.extend(shard.into_inner());
        }
        out
    }
}

impl<V> Default for ConcurrentMap<V> {
    fn default() -> Self {
        Self::new(DEFAULT_SHARD_COUNT)
    }
}
