//! Recency Cache - fixed-capacity in-process caches
//!
//! Provides an LRU cache and an LRU cache with TTL expiration swept by a
//! background task.

pub mod cache;
pub mod config;
pub mod error;
pub mod tasks;

pub use cache::{Cache, CacheStats, LruCache, TtlLruCache};
pub use config::CacheConfig;
pub use error::{CacheError, Result};
