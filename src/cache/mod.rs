//! Cache Module
//!
//! Fixed-capacity LRU caches, with and without TTL expiration.

mod entry;
mod list;
mod lru;
mod stats;
mod traits;
mod ttl;


// Re-export public types
pub use lru::LruCache;
pub use stats::CacheStats;
pub use traits::Cache;
pub use ttl::TtlLruCache;
