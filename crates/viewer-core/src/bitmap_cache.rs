//! Bounded bitmap cache with insertion-order eviction
//!
//! Entries are evicted in the order they were first inserted. Reads never
//! promote an entry, and replacing the value of a held key keeps its place
//! in the queue. Removing a key and inserting it again makes it the newest.

use std::cell::Cell;
use std::collections::{HashMap, VecDeque};
use std::hash::Hash;

/// Number of bitmaps held per document session unless configured otherwise.
pub const DEFAULT_CACHE_CAPACITY: usize = 200;

/// Statistics about cache usage
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of entries currently held
    pub entries: usize,

    /// Maximum number of entries
    pub capacity: usize,

    /// Number of `get` calls that found an entry
    pub hits: u64,

    /// Number of `get` calls that found nothing
    pub misses: u64,

    /// Number of entries evicted due to capacity pressure
    pub evictions: u64,
}

impl CacheStats {
    /// Calculate the cache hit rate (0.0 to 1.0)
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[derive(Debug, Clone)]
pub struct BitmapCache<K, V>
where
    K: Eq + Hash + Clone,
{
    capacity: usize,
    map: HashMap<K, V>,
    /// Oldest insert at the front.
    order: VecDeque<K>,
    hits: Cell<u64>,
    misses: Cell<u64>,
    evictions: u64,
}

impl<K, V> BitmapCache<K, V>
where
    K: Eq + Hash + Clone,
{
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            map: HashMap::new(),
            order: VecDeque::new(),
            hits: Cell::new(0),
            misses: Cell::new(0),
            evictions: 0,
        }
    }

    pub fn with_default_capacity() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn has(&self, key: &K) -> bool {
        self.map.contains_key(key)
    }

    /// Look up an entry without changing its eviction position.
    pub fn get(&self, key: &K) -> Option<&V> {
        let found = self.map.get(key);
        let counter = if found.is_some() { &self.hits } else { &self.misses };
        counter.set(counter.get() + 1);
        found
    }

    /// Insert or replace an entry, returning the entry evicted to make room.
    ///
    /// At most one entry is evicted per call, and only when `key` is new.
    pub fn put(&mut self, key: K, value: V) -> Option<(K, V)> {
        if let Some(slot) = self.map.get_mut(&key) {
            *slot = value;
            return None;
        }

        let evicted = if self.map.len() >= self.capacity { self.evict_oldest() } else { None };

        self.map.insert(key.clone(), value);
        self.order.push_back(key);

        evicted
    }

    /// Remove an entry. Missing keys are ignored.
    pub fn del(&mut self, key: &K) -> Option<V> {
        let removed = self.map.remove(key)?;
        if let Some(index) = self.order.iter().position(|existing| existing == key) {
            let _ = self.order.remove(index);
        }
        Some(removed)
    }

    /// Drop every entry, e.g. when the document or scale changes.
    pub fn clear(&mut self) {
        self.map.clear();
        self.order.clear();
    }

    /// Keep only the entries for which `keep` returns true, preserving order.
    pub fn retain(&mut self, mut keep: impl FnMut(&K, &V) -> bool) {
        self.map.retain(|key, value| keep(key, value));
        let map = &self.map;
        self.order.retain(|key| map.contains_key(key));
    }

    /// Keys from oldest to newest insert.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.order.iter()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.map.len(),
            capacity: self.capacity,
            hits: self.hits.get(),
            misses: self.misses.get(),
            evictions: self.evictions,
        }
    }

    fn evict_oldest(&mut self) -> Option<(K, V)> {
        while let Some(oldest) = self.order.pop_front() {
            if let Some(value) = self.map.remove(&oldest) {
                self.evictions += 1;
                log::debug!("bitmap cache full ({} entries), evicted oldest entry", self.capacity);
                return Some((oldest, value));
            }
        }
        None
    }
}

impl<K, V> Default for BitmapCache<K, V>
where
    K: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::with_default_capacity()
    }
}
