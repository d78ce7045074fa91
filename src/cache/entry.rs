//! Cache Entry Module
//!
//! Defines the payloads stored in the recency lists of both caches.

use std::time::Duration;

use tokio::time::Instant;

use crate::cache::list::NodeId;

// == Entry ==
/// Key-value pair held by the plain LRU cache.
#[derive(Debug)]
pub(crate) struct Entry<K, V> {
    pub key: K,
    pub value: V,
}

// == TTL Entry ==
/// Key-value pair with an absolute expiration, held by the TTL cache.
///
/// The entry lives in the recency list. `timeline` is its node in the
/// expiration-ordered list, which in turn stores the entry's recency handle.
#[derive(Debug)]
pub(crate) struct TtlEntry<K, V> {
    pub key: K,
    pub value: V,
    pub expires_at: Instant,
    pub timeline: NodeId,
}

impl<K, V> TtlEntry<K, V> {
    // == Is Expired ==
    /// An entry is expired once `now` has reached its expiration instant.
    pub fn is_expired_at(&self, now: Instant) -> bool {
        now >= self.expires_at
    }

    // == Time To Live ==
    /// Time left before expiry, zero once expired.
    pub fn ttl_remaining_at(&self, now: Instant) -> Duration {
        self.expires_at.saturating_duration_since(now)
    }
}
