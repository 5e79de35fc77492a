//! Shared TTL cache for fetched values of any type
//!
//! Producers are keyed by string. A value is stored together with its type,
//! and a lookup with a different type is a miss rather than an error.

use std::any::Any;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::traits::Cache;
use super::ttl::TtlCache;
use crate::clock::SharedClock;

type Stored = Arc<dyn Any + Send + Sync>;

#[derive(Debug)]
pub struct FetchCache {
    entries: Mutex<TtlCache<String, Stored>>,
}

impl FetchCache {
    pub fn new(capacity: usize, default_ttl: Duration, clock: SharedClock) -> Self {
        Self { entries: Mutex::new(TtlCache::with_clock(capacity, default_ttl, clock)) }
    }

    pub fn get<V>(&self, key: &str) -> Option<V>
    where
        V: Clone + Send + Sync + 'static,
    {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.get(&key.to_string())?.downcast_ref::<V>().cloned()
    }

    pub fn put<V>(&self, key: &str, value: V, ttl: Duration)
    where
        V: Send + Sync + 'static,
    {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert_with_ttl(key.to_string(), Arc::new(value), ttl);
    }

    pub fn invalidate(&self, key: &str) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.remove(&key.to_string());
    }

    /// Return the cached value for `key`, or run `producer`, store its
    /// result for `ttl` and return it. Producer errors are not cached.
    ///
    /// Concurrent misses on the same key may both run the producer; the
    /// later result wins.
    pub async fn get_or_fetch<V, F, Fut>(&self, key: &str, ttl: Duration, producer: F) -> anyhow::Result<V>
    where
        V: Clone + Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<V>>,
    {
        if let Some(hit) = self.get::<V>(key) {
            return Ok(hit);
        }
        let value = producer().await?;
        self.put(key, value.clone(), ttl);
        Ok(value)
    }
}
