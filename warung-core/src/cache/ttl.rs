//! LRU cache with per-entry time-to-live
//!
//! Capacity eviction (least recently used first) and TTL expiry are two
//! independent mechanisms. Expiry is lazy: an entry older than its TTL is
//! dropped the moment a read finds it, there is no background sweep.

use super::lru::LruCache;
use super::traits::{Cache, CacheEntry};
use crate::clock::{system_clock, SharedClock};
use std::hash::Hash;
use std::time::Duration;

/// LRU + TTL cache
#[derive(Debug)]
pub struct TtlCache<K, V>
where
    K: Hash + Eq + Clone,
{
    entries: LruCache<K, CacheEntry<V>>,
    ttl: Duration,
    clock: SharedClock,
}

impl<K, V> TtlCache<K, V>
where
    K: Hash + Eq + Clone,
{
    /// Create a cache reading wall-clock time
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self::with_clock(capacity, ttl, system_clock())
    }

    /// Create a cache reading the given clock
    pub fn with_clock(capacity: usize, ttl: Duration, clock: SharedClock) -> Self {
        Self { entries: LruCache::new(capacity), ttl, clock }
    }

    /// Default time-to-live applied by [`Cache::insert`]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Insert with an explicit time-to-live for this entry only
    pub fn insert_with_ttl(&mut self, key: K, value: V, ttl: Duration) -> Option<V> {
        let now = self.clock.now_millis();
        let entry = CacheEntry::new(value, now, ttl.as_millis() as u64);
        self.entries.insert(key, entry).map(|old| old.value)
    }

    /// True when a non-expired entry exists. Expired entries are dropped.
    pub fn contains_key(&mut self, key: &K) -> bool {
        self.get(key).is_some()
    }

    /// Age of a live entry, without promoting it
    pub fn age_of(&self, key: &K) -> Option<Duration> {
        let now = self.clock.now_millis();
        self.entries
            .peek(key)
            .filter(|entry| !entry.is_expired(now))
            .map(|entry| Duration::from_millis(entry.age(now)))
    }
}

impl<K, V> Cache<K, V> for TtlCache<K, V>
where
    K: Hash + Eq + Clone,
{
    fn get(&mut self, key: &K) -> Option<&V> {
        let now = self.clock.now_millis();
        let expired = self.entries.peek(key)?.is_expired(now);
        if expired {
            self.entries.remove(key);
            return None;
        }
        self.entries.get(key).map(|entry| &entry.value)
    }

    fn insert(&mut self, key: K, value: V) -> Option<V> {
        let ttl = self.ttl;
        self.insert_with_ttl(key, value, ttl)
    }

    fn remove(&mut self, key: &K) -> Option<V> {
        self.entries.remove(key).map(|entry| entry.value)
    }

    fn clear(&mut self) {
        self.entries.clear();
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn capacity(&self) -> usize {
        self.entries.capacity()
    }
}
