//! Fixed-capacity least-recently-used map
//!
//! Entries live in a slab and are threaded into a recency list from newest
//! to oldest by slab index; a `HashMap` maps keys to slots. Vacated slots
//! form a free chain inside the slab and are reused before it grows.
//! Entries never touched after insertion leave in insertion order.

use super::traits::Cache;
use std::collections::HashMap;
use std::hash::Hash;

struct Entry<K, V> {
    key: K,
    value: V,
    /// Next entry towards the newest end
    newer: Option<usize>,
    /// Next entry towards the oldest end
    older: Option<usize>,
}

enum Slot<K, V> {
    Live(Entry<K, V>),
    Vacant { next_free: Option<usize> },
}

/// LRU cache with a fixed capacity
pub struct LruCache<K, V>
where
    K: Hash + Eq + Clone,
{
    capacity: usize,
    index: HashMap<K, usize>,
    slots: Vec<Slot<K, V>>,
    newest: Option<usize>,
    oldest: Option<usize>,
    first_free: Option<usize>,
}

impl<K, V> LruCache<K, V>
where
    K: Hash + Eq + Clone,
{
    /// Create a new LRU cache. A capacity of zero is treated as one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            index: HashMap::with_capacity(capacity),
            slots: Vec::with_capacity(capacity),
            newest: None,
            oldest: None,
            first_free: None,
        }
    }

    /// Look at a value without changing its recency
    pub fn peek(&self, key: &K) -> Option<&V> {
        self.entry(*self.index.get(key)?).map(|e| &e.value)
    }

    /// Check for a key without changing its recency
    pub fn contains_key(&self, key: &K) -> bool {
        self.index.contains_key(key)
    }

    /// Mutable access to a value, marking it as most recently used
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let idx = *self.index.get(key)?;
        self.touch(idx);
        self.entry_mut(idx).map(|e| &mut e.value)
    }

    /// Iterate from most to least recently used
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter { cache: self, cursor: self.newest }
    }

    /// Key that would be evicted next
    pub fn oldest_key(&self) -> Option<&K> {
        self.entry(self.oldest?).map(|e| &e.key)
    }

    fn entry(&self, idx: usize) -> Option<&Entry<K, V>> {
        match self.slots.get(idx) {
            Some(Slot::Live(entry)) => Some(entry),
            _ => None,
        }
    }

    fn entry_mut(&mut self, idx: usize) -> Option<&mut Entry<K, V>> {
        match self.slots.get_mut(idx) {
            Some(Slot::Live(entry)) => Some(entry),
            _ => None,
        }
    }

    /// Take a live slot out of the recency list; its neighbours close the gap
    fn detach(&mut self, idx: usize) {
        let Some((newer, older)) = self.entry(idx).map(|e| (e.newer, e.older)) else {
            return;
        };
        match older.and_then(|o| self.entry_mut(o)) {
            Some(e) => e.newer = newer,
            None => self.oldest = newer,
        }
        match newer.and_then(|n| self.entry_mut(n)) {
            Some(e) => e.older = older,
            None => self.newest = older,
        }
    }

    /// Put a detached live slot at the newest end
    fn attach_newest(&mut self, idx: usize) {
        let previous = self.newest;
        if let Some(e) = self.entry_mut(idx) {
            e.newer = None;
            e.older = previous;
        }
        match previous.and_then(|p| self.entry_mut(p)) {
            Some(e) => e.newer = Some(idx),
            None => self.oldest = Some(idx),
        }
        self.newest = Some(idx);
    }

    fn touch(&mut self, idx: usize) {
        if self.newest != Some(idx) {
            self.detach(idx);
            self.attach_newest(idx);
        }
    }

    /// Store a new entry in a free slot (or a new one) at the newest end
    fn occupy(&mut self, key: K, value: V) -> usize {
        let entry = Slot::Live(Entry { key, value, newer: None, older: None });
        let idx = match self.first_free {
            Some(idx) => {
                if let Slot::Vacant { next_free } = &self.slots[idx] {
                    self.first_free = *next_free;
                }
                self.slots[idx] = entry;
                idx
            }
            None => {
                self.slots.push(entry);
                self.slots.len() - 1
            }
        };
        self.attach_newest(idx);
        idx
    }

    /// Drop a live slot, returning its entry and chaining the slot as free
    fn vacate(&mut self, idx: usize) -> Option<Entry<K, V>> {
        self.entry(idx)?;
        self.detach(idx);
        let freed = Slot::Vacant { next_free: self.first_free };
        self.first_free = Some(idx);
        match std::mem::replace(&mut self.slots[idx], freed) {
            Slot::Live(entry) => {
                self.index.remove(&entry.key);
                Some(entry)
            }
            Slot::Vacant { .. } => None,
        }
    }
}

impl<K, V> Cache<K, V> for LruCache<K, V>
where
    K: Hash + Eq + Clone,
{
    fn get(&mut self, key: &K) -> Option<&V> {
        let idx = *self.index.get(key)?;
        self.touch(idx);
        self.entry(idx).map(|e| &e.value)
    }

    fn insert(&mut self, key: K, value: V) -> Option<V> {
        if let Some(&idx) = self.index.get(&key) {
            self.touch(idx);
            return self.entry_mut(idx).map(|e| std::mem::replace(&mut e.value, value));
        }
        if self.index.len() >= self.capacity {
            if let Some(oldest) = self.oldest {
                self.vacate(oldest);
            }
        }
        let idx = self.occupy(key.clone(), value);
        self.index.insert(key, idx);
        None
    }

    fn remove(&mut self, key: &K) -> Option<V> {
        let idx = *self.index.get(key)?;
        self.vacate(idx).map(|e| e.value)
    }

    fn clear(&mut self) {
        self.index.clear();
        self.slots.clear();
        self.newest = None;
        self.oldest = None;
        self.first_free = None;
    }

    fn len(&self) -> usize {
        self.index.len()
    }

    fn capacity(&self) -> usize {
        self.capacity
    }
}

impl<K, V> std::fmt::Debug for LruCache<K, V>
where
    K: Hash + Eq + Clone,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LruCache").field("len", &self.index.len()).field("capacity", &self.capacity).finish()
    }
}

/// Iterator over `(key, value)` pairs, most recently used first
pub struct Iter<'a, K, V>
where
    K: Hash + Eq + Clone,
{
    cache: &'a LruCache<K, V>,
    cursor: Option<usize>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V>
where
    K: Hash + Eq + Clone,
{
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let entry = self.cache.entry(self.cursor?)?;
        self.cursor = entry.older;
        Some((&entry.key, &entry.value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lru_basic_operations() {
        let mut cache = LruCache::new(2);

        assert_eq!(cache.insert("a", 1), None);
        assert_eq!(cache.insert("b", 2), None);

        assert_eq!(cache.get(&"a"), Some(&1));
        assert_eq!(cache.get(&"b"), Some(&2));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_lru_eviction_follows_insertion_order() {
        let mut cache = LruCache::new(3);

        cache.insert("a", 1);
        cache.insert("b", 2);
        cache.insert("c", 3);
        cache.insert("d", 4); // evicts "a"
        cache.insert("e", 5); // evicts "b"

        assert_eq!(cache.len(), 3);
        assert!(!cache.contains_key(&"a"));
        assert!(!cache.contains_key(&"b"));
        assert_eq!(cache.oldest_key(), Some(&"c"));
    }

    #[test]
    fn test_lru_never_exceeds_capacity() {
        let mut cache = LruCache::new(5);
        for i in 0..100 {
            cache.insert(i, i * 10);
            assert!(cache.len() <= 5);
        }
        // Only the last five survive
        let keys: Vec<i32> = cache.iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, vec![99, 98, 97, 96, 95]);
    }

    #[test]
    fn test_lru_update_existing() {
        let mut cache = LruCache::new(2);

        cache.insert("a", 1);
        cache.insert("b", 2);

        // Overwriting "a" promotes it
        assert_eq!(cache.insert("a", 10), Some(1));

        cache.insert("c", 3); // evicts "b", not "a"

        assert_eq!(cache.get(&"a"), Some(&10));
        assert_eq!(cache.get(&"b"), None);
        assert_eq!(cache.get(&"c"), Some(&3));
    }

    #[test]
    fn test_lru_get_promotes() {
        let mut cache = LruCache::new(2);

        cache.insert("a", 1);
        cache.insert("b", 2);

        cache.get(&"a");

        cache.insert("c", 3); // evicts "b", the untouched one

        assert_eq!(cache.get(&"a"), Some(&1));
        assert_eq!(cache.get(&"b"), None);
        assert_eq!(cache.get(&"c"), Some(&3));
    }

    #[test]
    fn test_lru_peek_does_not_promote() {
        let mut cache = LruCache::new(2);

        cache.insert("a", 1);
        cache.insert("b", 2);

        assert_eq!(cache.peek(&"a"), Some(&1));
        cache.insert("c", 3); // "a" is still the oldest

        assert!(!cache.contains_key(&"a"));
    }

    #[test]
    fn test_lru_get_mut() {
        let mut cache = LruCache::new(2);
        cache.insert("hits", 0u32);

        if let Some(count) = cache.get_mut(&"hits") {
            *count += 5;
        }
        assert_eq!(cache.peek(&"hits"), Some(&5));
    }

    #[test]
    fn test_lru_remove() {
        let mut cache = LruCache::new(3);

        cache.insert("a", 1);
        cache.insert("b", 2);
        cache.insert("c", 3);

        assert_eq!(cache.remove(&"b"), Some(2));
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(&"b"), None);

        // Freed slot is reused without disturbing order
        cache.insert("d", 4);
        let keys: Vec<&str> = cache.iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, vec!["d", "c", "a"]);
    }

    #[test]
    fn test_lru_remove_ends_and_refill() {
        let mut cache = LruCache::new(4);
        for (k, v) in [("a", 1), ("b", 2), ("c", 3), ("d", 4)] {
            cache.insert(k, v);
        }

        // Oldest and newest leave; the list closes around "b" and "c"
        assert_eq!(cache.remove(&"a"), Some(1));
        assert_eq!(cache.remove(&"d"), Some(4));
        assert_eq!(cache.remove(&"d"), None);
        assert_eq!(cache.oldest_key(), Some(&"b"));

        cache.insert("e", 5);
        cache.insert("f", 6);
        cache.insert("g", 7); // full again, evicts "b"
        let keys: Vec<&str> = cache.iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, vec!["g", "f", "e", "c"]);
        assert_eq!(cache.len(), 4);
    }

    #[test]
    fn test_lru_clear() {
        let mut cache = LruCache::new(3);

        cache.insert("a", 1);
        cache.insert("b", 2);

        cache.clear();

        assert_eq!(cache.len(), 0);
        assert!(cache.is_empty());
        assert_eq!(cache.get(&"a"), None);
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let mut cache = LruCache::new(0);
        cache.insert("a", 1);
        cache.insert("b", 2);
        assert_eq!(cache.capacity(), 1);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&"b"), Some(&2));
    }
}
