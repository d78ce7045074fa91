//! LRU Cache Module
//!
//! Capacity-bounded cache that evicts the least recently used entry.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;

use parking_lot::RwLock;
use tracing::{debug, trace};

use crate::cache::entry::Entry;
use crate::cache::list::{NodeId, OrderList};
use crate::cache::{Cache, CacheStats};

// == LRU State ==
/// Index and recency list guarded by the cache lock.
///
/// Keys in `index` and nodes in `order` are always in 1:1 correspondence.
#[derive(Debug)]
struct LruState<K, V> {
    /// Key to node in the recency list
    index: HashMap<K, NodeId>,
    /// Front = most recently used, back = least recently used
    order: OrderList<Entry<K, V>>,
    stats: CacheStats,
}

impl<K, V> LruState<K, V>
where
    K: Hash + Eq + Clone,
{
    fn new(capacity: usize) -> Self {
        // Large capacities grow on demand rather than up front
        let reserve = capacity.min(1024);
        Self {
            index: HashMap::with_capacity(reserve),
            order: OrderList::with_capacity(reserve),
            stats: CacheStats::new(),
        }
    }

    fn add(&mut self, key: K, value: V, capacity: usize) {
        if let Some(&id) = self.index.get(&key) {
            if let Some(entry) = self.order.get_mut(id) {
                entry.value = value;
            }
            self.order.move_to_front(id);
            return;
        }

        let id = self.order.push_front(Entry {
            key: key.clone(),
            value,
        });
        self.index.insert(key, id);

        while self.order.len() > capacity {
            let Some(evicted) = self.order.pop_back() else {
                break;
            };
            self.index.remove(&evicted.key);
            self.stats.record_eviction();
            trace!(len = self.order.len(), capacity, "evicted least recently used entry");
        }
    }

    fn get<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        V: Clone,
    {
        let Some(&id) = self.index.get(key) else {
            self.stats.record_miss();
            return None;
        };
        self.order.move_to_front(id);
        self.stats.record_hit();
        self.order.get(id).map(|entry| entry.value.clone())
    }

    fn peek<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let &id = self.index.get(key)?;
        self.order.get(id).map(|entry| &entry.value)
    }

    fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let id = self.index.remove(key)?;
        self.order.remove(id).map(|entry| entry.value)
    }

    fn purge(&mut self) {
        let dropped = self.order.len();
        self.index.clear();
        self.order.clear();
        debug!(dropped, "purged LRU cache");
    }
}

// == LRU Cache ==
/// Thread-safe LRU cache holding at most `capacity` entries.
///
/// Adding a new key to a full cache evicts the least recently used entry.
/// Both `add` and a successful `get` make the key the most recently used.
///
/// ```
/// use recency_cache::LruCache;
///
/// let cache = LruCache::new(2);
/// cache.add("a", 1);
/// cache.add("b", 2);
/// cache.get("a");
/// cache.add("c", 3);
///
/// assert_eq!(cache.get("a"), Some(1));
/// assert_eq!(cache.get("b"), None);
/// ```
#[derive(Debug)]
pub struct LruCache<K, V> {
    capacity: usize,
    state: RwLock<LruState<K, V>>,
}

impl<K, V> LruCache<K, V>
where
    K: Hash + Eq + Clone,
{
    // == Constructor ==
    /// Creates a cache bounded to `capacity` entries.
    ///
    /// A capacity of 0 is accepted and yields a cache that never retains anything.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            state: RwLock::new(LruState::new(capacity)),
        }
    }

    // == Add ==
    /// Stores a key-value pair and marks it most recently used.
    ///
    /// An existing key has its value replaced without triggering eviction.
    pub fn add(&self, key: K, value: V) {
        self.state.write().add(key, value, self.capacity);
    }

    // == Get ==
    /// Returns the value for `key` and marks it most recently used.
    ///
    /// Reordering is a mutation, so this takes the exclusive lock.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        V: Clone,
    {
        self.state.write().get(key)
    }

    // == Peek ==
    /// Returns the value for `key` without touching its recency.
    pub fn peek<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        V: Clone,
    {
        self.state.read().peek(key).cloned()
    }

    // == Contains ==
    /// Checks if `key` is cached, without touching its recency.
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.state.read().index.contains_key(key)
    }

    // == Remove ==
    /// Removes `key`. Absent keys are a no-op.
    pub fn remove<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.state.write().remove(key)
    }

    // == Purge ==
    /// Clears everything from the cache.
    pub fn purge(&self) {
        self.state.write().purge();
    }

    // == Length ==
    /// Returns the current number of entries.
    pub fn len(&self) -> usize {
        self.state.read().order.len()
    }

    /// Returns true if the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // == Capacity ==
    /// Fixed at construction.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let state = self.state.read();
        state.stats.snapshot(state.order.len())
    }
}

impl<K, V> Cache<K, V> for LruCache<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    fn add(&self, key: K, value: V) {
        LruCache::add(self, key, value);
    }

    fn get(&self, key: &K) -> Option<V> {
        LruCache::get(self, key)
    }

    fn remove(&self, key: &K) -> Option<V> {
        LruCache::remove(self, key)
    }

    fn purge(&self) {
        LruCache::purge(self);
    }

    fn len(&self) -> usize {
        LruCache::len(self)
    }

    fn capacity(&self) -> usize {
        LruCache::capacity(self)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    fn filled(keys: &[&'static str]) -> LruCache<&'static str, String> {
        let cache = LruCache::new(keys.len());
        for key in keys {
            cache.add(*key, format!("value_{}", key));
        }
        cache
    }

    #[test]
    fn test_lru_new() {
        let cache: LruCache<String, String> = LruCache::new(5);
        assert!(cache.is_empty());
        assert_eq!(cache.len(), 0);
        assert_eq!(cache.capacity(), 5);
    }

    #[test]
    fn test_lru_add_and_get() {
        let cache = LruCache::new(5);
        cache.add("key1".to_string(), "value1".to_string());

        // Lookups work through a borrowed key
        assert_eq!(cache.get("key1"), Some("value1".to_string()));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_lru_get_nonexistent() {
        let cache: LruCache<&str, u32> = LruCache::new(5);
        assert_eq!(cache.get("missing"), None);
    }

    #[test]
    fn test_lru_overwrite_keeps_length() {
        let cache = filled(&["a", "b", "c"]);

        cache.add("a", "new".to_string());

        assert_eq!(cache.len(), 3);
        assert_eq!(cache.get("a"), Some("new".to_string()));
        assert_eq!(cache.stats().evictions, 0);
    }

    #[test]
    fn test_lru_evicts_oldest() {
        let cache = filled(&["a", "b", "c"]);

        cache.add("d", "value_d".to_string());

        assert_eq!(cache.len(), 3);
        assert!(!cache.contains("a"));
        assert!(cache.contains("b"));
        assert!(cache.contains("c"));
        assert!(cache.contains("d"));
    }

    #[test]
    fn test_lru_overwrite_refreshes_recency() {
        let cache = filled(&["a", "b", "c"]);

        // Overwrite moves 'a' to the front, so 'b' becomes the oldest
        cache.add("a", "again".to_string());
        cache.add("d", "value_d".to_string());

        assert!(cache.contains("a"));
        assert!(!cache.contains("b"));
    }

    #[test]
    fn test_lru_get_refreshes_recency() {
        let cache = filled(&["a", "b", "c"]);

        cache.get("a");
        cache.add("d", "value_d".to_string());

        assert!(cache.contains("a"));
        assert!(!cache.contains("b"));
    }

    #[test]
    fn test_lru_peek_does_not_refresh_recency() {
        let cache = filled(&["a", "b", "c"]);

        assert_eq!(cache.peek("a"), Some("value_a".to_string()));
        cache.add("d", "value_d".to_string());

        assert!(!cache.contains("a"));
        assert_eq!(cache.peek("a"), None);
    }

    #[test]
    fn test_lru_remove() {
        let cache = filled(&["a", "b", "c"]);

        assert_eq!(cache.remove("b"), Some("value_b".to_string()));
        assert_eq!(cache.len(), 2);
        assert!(!cache.contains("b"));
    }

    #[test]
    fn test_lru_remove_nonexistent_key() {
        let cache = filled(&["a", "b"]);

        // Removing a key that doesn't exist must not affect existing keys
        assert_eq!(cache.remove("nonexistent"), None);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_lru_removed_slot_is_reused_cleanly() {
        let cache = filled(&["a", "b", "c"]);

        cache.remove("b");
        cache.add("d", "value_d".to_string());

        assert_eq!(cache.len(), 3);
        assert_eq!(cache.get("d"), Some("value_d".to_string()));
        assert_eq!(cache.get("a"), Some("value_a".to_string()));
        assert_eq!(cache.get("b"), None);
    }

    #[test]
    fn test_lru_purge() {
        let cache = filled(&["a", "b", "c"]);

        cache.purge();

        assert_eq!(cache.len(), 0);
        assert_eq!(cache.capacity(), 3);
        assert_eq!(cache.get("a"), None);

        cache.add("e", "value_e".to_string());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_lru_zero_capacity_never_retains() {
        let cache = LruCache::new(0);

        cache.add("a", 1);

        assert_eq!(cache.len(), 0);
        assert_eq!(cache.get("a"), None);
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn test_lru_stats() {
        let cache = filled(&["a", "b"]);

        cache.get("a");
        cache.get("missing");
        cache.add("c", "value_c".to_string());

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.evictions, 1);
        assert_eq!(stats.total_entries, 2);
    }

    #[test]
    fn test_lru_through_trait() {
        fn exercise<C: Cache<u32, u32>>(cache: &C) {
            cache.add(1, 10);
            cache.add(2, 20);
            cache.add(3, 30);
            assert_eq!(cache.get(&1), None);
            assert_eq!(cache.remove(&2), Some(20));
            assert_eq!(cache.len(), 1);
            cache.purge();
            assert!(cache.is_empty());
            assert_eq!(cache.capacity(), 2);
        }

        exercise(&LruCache::new(2));
    }
}
