//! Caching module for Warung
//!
//! Bounded in-process caches backing every stateful piece of the edge shield:
//! plain LRU for counters and snapshots, LRU+TTL for time-bucketed results and
//! API responses, and a stale-while-revalidate wrapper for slow-changing
//! remote configuration. Nothing here is persisted or shared across instances.

pub mod fetch;
pub mod lru;
pub mod swr;
pub mod traits;
pub mod ttl;

pub use fetch::FetchCache;
pub use lru::LruCache;
pub use swr::{SwrCache, SwrStatus};
pub use traits::{Cache, CacheEntry};
pub use ttl::TtlCache;
