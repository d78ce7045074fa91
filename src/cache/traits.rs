//! Cache Trait Module
//!
//! The surface shared by both caches, so callers can swap one for the other.

// == Cache Trait ==
/// Thread-safe, capacity-bounded key-value cache.
///
/// Every operation is total: a missing key is reported as `None`, never as an
/// error. Methods take `&self` because implementations lock internally.
///
/// ```
/// use recency_cache::{Cache, LruCache};
///
/// fn warm<C: Cache<u64, String>>(cache: &C, data: &[(u64, String)]) {
///     for (key, value) in data {
///         cache.add(*key, value.clone());
///     }
/// }
///
/// let cache = LruCache::new(2);
/// warm(&cache, &[(1, "a".to_string()), (2, "b".to_string()), (3, "c".to_string())]);
/// assert_eq!(cache.len(), 2);
/// assert_eq!(Cache::get(&cache, &1), None);
/// ```
pub trait Cache<K, V> {
    /// Inserts or replaces `key`, making it the most recently used entry.
    fn add(&self, key: K, value: V);

    /// Returns a copy of the value and marks the entry most recently used.
    fn get(&self, key: &K) -> Option<V>;

    /// Removes `key`, returning its value if it was present.
    fn remove(&self, key: &K) -> Option<V>;

    /// Drops every entry. Capacity is unchanged.
    fn purge(&self);

    /// Number of entries currently held.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of entries.
    fn capacity(&self) -> usize;
}
