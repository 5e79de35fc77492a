//! Stale-while-revalidate cache
//!
//! A fresh entry is returned as is. A stale entry is returned immediately while
//! a single background refetch replaces it. Only a complete miss makes the
//! caller wait for the fetch.

use super::lru::LruCache;
use super::traits::{Cache, CacheEntry};
use crate::clock::SharedClock;
use crate::tasks::BackgroundTasks;
use std::collections::HashSet;
use std::future::Future;
use std::hash::Hash;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// How a lookup was served
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwrStatus {
    Fresh,
    Stale,
    Miss,
}

struct SwrInner<K, V>
where
    K: Hash + Eq + Clone,
{
    entries: Mutex<LruCache<K, CacheEntry<V>>>,
    refreshing: Mutex<HashSet<K>>,
    fresh_for: Duration,
    clock: SharedClock,
}

/// Shared stale-while-revalidate cache
pub struct SwrCache<K, V>
where
    K: Hash + Eq + Clone,
{
    inner: Arc<SwrInner<K, V>>,
}

impl<K, V> Clone for SwrCache<K, V>
where
    K: Hash + Eq + Clone,
{
    fn clone(&self) -> Self {
        Self { inner: self.inner.clone() }
    }
}

impl<K, V> std::fmt::Debug for SwrCache<K, V>
where
    K: Hash + Eq + Clone,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SwrCache").field("fresh_for", &self.inner.fresh_for).finish()
    }
}

impl<K, V> SwrCache<K, V>
where
    K: Hash + Eq + Clone + Send + 'static,
    V: Clone + Send + 'static,
{
    pub fn new(capacity: usize, fresh_for: Duration, clock: SharedClock) -> Self {
        Self {
            inner: Arc::new(SwrInner {
                entries: Mutex::new(LruCache::new(capacity)),
                refreshing: Mutex::new(HashSet::new()),
                fresh_for,
                clock,
            }),
        }
    }

    /// Current state of `key` without triggering anything
    pub fn status(&self, key: &K) -> SwrStatus {
        let now = self.inner.clock.now_millis();
        let entries = self.inner.entries.lock().unwrap_or_else(|e| e.into_inner());
        match entries.peek(key) {
            Some(entry) if entry.is_expired(now) => SwrStatus::Stale,
            Some(_) => SwrStatus::Fresh,
            None => SwrStatus::Miss,
        }
    }

    /// Store a value as freshly fetched
    pub fn put(&self, key: K, value: V) {
        self.inner.store(key, value);
    }

    /// Serve `key`, refreshing through `fetch` according to the entry's age.
    ///
    /// `fetch` yields `Ok(None)` when the upstream answered but had nothing
    /// usable; the previous value (if any) is then kept. Fetch errors never
    /// reach the caller: a blocking miss returns `None`, a background refresh
    /// logs and keeps the stale value.
    pub async fn get_or_refresh<F, Fut>(
        &self,
        key: K,
        tasks: &BackgroundTasks,
        fetch: F,
    ) -> (Option<V>, SwrStatus)
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<Option<V>>> + Send + 'static,
    {
        let now = self.inner.clock.now_millis();
        let cached = {
            let mut entries = self.inner.entries.lock().unwrap_or_else(|e| e.into_inner());
            entries.get(&key).map(|entry| (entry.value.clone(), entry.is_expired(now)))
        };

        match cached {
            Some((value, false)) => (Some(value), SwrStatus::Fresh),
            Some((value, true)) => {
                if self.inner.begin_refresh(&key) {
                    let inner = self.inner.clone();
                    let pending = fetch();
                    tasks.spawn("swr-refresh", async move {
                        let outcome = pending.await;
                        let result = match outcome {
                            Ok(Some(fresh)) => {
                                inner.store(key.clone(), fresh);
                                Ok(())
                            }
                            Ok(None) => {
                                log::debug!("swr refresh returned nothing, keeping stale value");
                                Ok(())
                            }
                            Err(err) => Err(err),
                        };
                        inner.end_refresh(&key);
                        result
                    });
                }
                (Some(value), SwrStatus::Stale)
            }
            None => match fetch().await {
                Ok(Some(fresh)) => {
                    self.inner.store(key, fresh.clone());
                    (Some(fresh), SwrStatus::Miss)
                }
                Ok(None) => (None, SwrStatus::Miss),
                Err(err) => {
                    log::warn!("swr fetch failed on miss: {:#}", err);
                    (None, SwrStatus::Miss)
                }
            },
        }
    }
}

impl<K, V> SwrInner<K, V>
where
    K: Hash + Eq + Clone,
{
    fn store(&self, key: K, value: V) {
        let now = self.clock.now_millis();
        let ttl_ms = self.fresh_for.as_millis() as u64;
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(key, CacheEntry::new(value, now, ttl_ms));
    }

    /// Claim the refresh slot for `key`; false if one is already running
    fn begin_refresh(&self, key: &K) -> bool {
        let mut refreshing = self.refreshing.lock().unwrap_or_else(|e| e.into_inner());
        refreshing.insert(key.clone())
    }

    fn end_refresh(&self, key: &K) {
        let mut refreshing = self.refreshing.lock().unwrap_or_else(|e| e.into_inner());
        refreshing.remove(key);
    }
}
