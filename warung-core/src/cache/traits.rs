//! Core traits for the bounded caches

use std::hash::Hash;

/// A timestamped cache entry, as held by the time-aware caches
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The cached value
    pub value: V,

    /// When this entry was written (epoch milliseconds)
    pub inserted_at: u64,

    /// How long this entry stays valid, in milliseconds
    pub ttl_ms: u64,
}

impl<V> CacheEntry<V> {
    /// Create a new entry written at `now`
    pub fn new(value: V, now: u64, ttl_ms: u64) -> Self {
        Self { value, inserted_at: now, ttl_ms }
    }

    /// Age of this entry at `now`
    pub fn age(&self, now: u64) -> u64 {
        now.saturating_sub(self.inserted_at)
    }

    /// An entry is expired once it is strictly older than its TTL
    pub fn is_expired(&self, now: u64) -> bool {
        self.age(now) > self.ttl_ms
    }
}

/// Core caching trait
pub trait Cache<K, V>
where
    K: Hash + Eq,
{
    /// Get a value from the cache, marking it as most recently used
    fn get(&mut self, key: &K) -> Option<&V>;

    /// Insert or overwrite a value, marking it as most recently used.
    /// Returns the previous value for the key, if any.
    fn insert(&mut self, key: K, value: V) -> Option<V>;

    /// Remove a value from the cache
    fn remove(&mut self, key: &K) -> Option<V>;

    /// Clear all entries from the cache
    fn clear(&mut self);

    /// Get the number of entries in the cache
    fn len(&self) -> usize;

    /// Check if the cache is empty
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get the capacity of the cache
    fn capacity(&self) -> usize;
}
