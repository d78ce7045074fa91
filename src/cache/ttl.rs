//! TTL Cache Module
//!
//! LRU cache whose entries also expire after a time-to-live. Expired entries
//! are purged by a periodic background sweep, not on access.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use tokio::runtime::Handle;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, trace};

use crate::cache::entry::TtlEntry;
use crate::cache::list::{NodeId, OrderList};
use crate::cache::{Cache, CacheStats};
use crate::config::CacheConfig;
use crate::error::{CacheError, Result};
use crate::tasks::{spawn_sweep_task, Sweep};

/// Fallback horizon for TTLs too large to add to the current instant.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

// == TTL State ==
/// Index plus the two orderings, guarded by one lock.
///
/// Every live entry has exactly one node in `recency` and one in `timeline`.
#[derive(Debug)]
struct TtlState<K, V> {
    /// Key to the entry's recency handle
    index: HashMap<K, NodeId>,
    /// Front = most recently used. Owns the entries.
    recency: OrderList<TtlEntry<K, V>>,
    /// Recency handles sorted by expiration, front = earliest
    timeline: OrderList<NodeId>,
    stats: CacheStats,
}

impl<K, V> TtlState<K, V>
where
    K: Hash + Eq + Clone,
{
    fn new(capacity: usize) -> Self {
        let reserve = capacity.min(1024);
        Self {
            index: HashMap::with_capacity(reserve),
            recency: OrderList::with_capacity(reserve),
            timeline: OrderList::with_capacity(reserve),
            stats: CacheStats::new(),
        }
    }

    fn add_with_expire(&mut self, key: K, value: V, expires_at: Instant, capacity: usize) {
        if let Some(&id) = self.index.get(&key) {
            let old_timeline = match self.recency.get_mut(id) {
                Some(entry) => {
                    entry.value = value;
                    entry.expires_at = expires_at;
                    entry.timeline
                }
                None => return,
            };
            self.recency.move_to_front(id);
            self.timeline.remove(old_timeline);
            let timeline = self.place_in_timeline(id, expires_at);
            if let Some(entry) = self.recency.get_mut(id) {
                entry.timeline = timeline;
            }
            return;
        }

        // The timeline node has to point at the entry before the entry exists
        let id = self.recency.next_id();
        let timeline = self.place_in_timeline(id, expires_at);
        let inserted = self.recency.push_front(TtlEntry {
            key: key.clone(),
            value,
            expires_at,
            timeline,
        });
        debug_assert_eq!(inserted, id);
        self.index.insert(key, id);

        while self.recency.len() > capacity {
            let Some(evicted) = self.recency.pop_back() else {
                break;
            };
            self.timeline.remove(evicted.timeline);
            self.index.remove(&evicted.key);
            self.stats.record_eviction();
            trace!(len = self.recency.len(), capacity, "evicted least recently used entry");
        }
    }

    /// Inserts `id` into the timeline after every entry expiring no later
    /// than `expires_at`.
    ///
    /// Expirations normally grow with insertion time, so the scan from the
    /// back usually stops at the first node.
    fn place_in_timeline(&mut self, id: NodeId, expires_at: Instant) -> NodeId {
        let mut cursor = self.timeline.back();
        while let Some(node) = cursor {
            let expires_later = self
                .timeline
                .get(node)
                .and_then(|&other| self.recency.get(other))
                .is_some_and(|entry| entry.expires_at > expires_at);
            if !expires_later {
                return self.timeline.insert_after(node, id);
            }
            cursor = self.timeline.prev(node);
        }
        self.timeline.push_front(id)
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
        self.recency.move_to_front(id);
        self.stats.record_hit();
        self.recency.get(id).map(|entry| entry.value.clone())
    }

    fn entry<Q>(&self, key: &Q) -> Option<&TtlEntry<K, V>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let &id = self.index.get(key)?;
        self.recency.get(id)
    }

    fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let id = self.index.remove(key)?;
        let entry = self.recency.remove(id)?;
        self.timeline.remove(entry.timeline);
        Some(entry.value)
    }

    fn purge(&mut self) {
        let dropped = self.recency.len();
        self.index.clear();
        self.recency.clear();
        self.timeline.clear();
        debug!(dropped, "purged TTL cache");
    }

    /// Pops entries off the front of the timeline until one has not expired.
    fn sweep_expired(&mut self, now: Instant) -> usize {
        let mut removed = 0;
        while let Some(front) = self.timeline.front() {
            let Some(&id) = self.timeline.get(front) else {
                break;
            };
            match self.recency.get(id) {
                Some(entry) if entry.is_expired_at(now) => {}
                _ => break,
            }
            self.timeline.remove(front);
            if let Some(entry) = self.recency.remove(id) {
                self.index.remove(&entry.key);
            }
            removed += 1;
        }
        self.stats.record_expirations(removed);
        removed
    }
}

// == Shared ==
/// The part of the cache the sweep task can reach.
#[derive(Debug)]
struct Shared<K, V> {
    capacity: usize,
    state: RwLock<TtlState<K, V>>,
}

impl<K, V> Sweep for Shared<K, V>
where
    K: Hash + Eq + Clone + Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    fn sweep_expired(&self) -> usize {
        self.state.write().sweep_expired(Instant::now())
    }
}

// == TTL Cache ==
/// Thread-safe LRU cache whose entries also expire.
///
/// Capacity eviction works exactly like [`LruCache`](crate::LruCache). On top
/// of that a background task, started on the current Tokio runtime, removes
/// expired entries once per sweep interval. An expired entry stays readable
/// until the next sweep reaches it.
///
/// Build it with [`try_new`](Self::try_new) or
/// [`from_config`](Self::from_config), which report a missing runtime as an
/// error. The sweep stops when the cache is dropped, or explicitly through
/// [`close`](Self::close) or [`shutdown`](Self::shutdown).
///
/// ```
/// use std::time::Duration;
/// use recency_cache::TtlLruCache;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> recency_cache::error::Result<()> {
/// let cache = TtlLruCache::try_new(100, Duration::from_secs(60))?;
/// cache.add("session", 42);
/// cache.add_with_ttl("token", 7, Duration::from_secs(5));
///
/// assert_eq!(cache.get("session"), Some(42));
/// cache.shutdown().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct TtlLruCache<K, V> {
    shared: Arc<Shared<K, V>>,
    default_ttl: Duration,
    shutdown: Arc<Notify>,
    sweeper: Mutex<Option<JoinHandle<()>>>,
}

impl<K, V> TtlLruCache<K, V>
where
    K: Hash + Eq + Clone + Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    // == Constructors ==
    /// Creates a cache and starts its sweep with a one second period.
    ///
    /// Returns [`CacheError::RuntimeUnavailable`] when called outside a Tokio
    /// runtime.
    pub fn try_new(capacity: usize, default_ttl: Duration) -> Result<Self> {
        Self::from_config(&CacheConfig::new(capacity, default_ttl))
    }

    /// Shorthand for [`try_new`](Self::try_new) when a runtime is known to be
    /// running.
    ///
    /// # Panics
    /// Panics when called outside a Tokio runtime.
    pub fn new(capacity: usize, default_ttl: Duration) -> Self {
        Self::start(&Handle::current(), &CacheConfig::new(capacity, default_ttl))
    }

    /// Creates a cache from a full configuration, including the sweep interval.
    pub fn from_config(config: &CacheConfig) -> Result<Self> {
        config.validate()?;
        let runtime = Handle::try_current().map_err(|_| CacheError::RuntimeUnavailable)?;
        Ok(Self::start(&runtime, config))
    }

    fn start(runtime: &Handle, config: &CacheConfig) -> Self {
        let shared = Arc::new(Shared {
            capacity: config.capacity,
            state: RwLock::new(TtlState::new(config.capacity)),
        });
        let shutdown = Arc::new(Notify::new());
        let sweeper = spawn_sweep_task(
            runtime,
            Arc::downgrade(&shared),
            config.sweep_interval,
            shutdown.clone(),
        );

        Self {
            shared,
            default_ttl: config.default_ttl,
            shutdown,
            sweeper: Mutex::new(Some(sweeper)),
        }
    }

    // == Add ==
    /// Stores a key-value pair expiring after the default TTL.
    pub fn add(&self, key: K, value: V) {
        self.add_with_ttl(key, value, self.default_ttl);
    }

    /// Stores a key-value pair expiring after `ttl`.
    pub fn add_with_ttl(&self, key: K, value: V, ttl: Duration) {
        let now = Instant::now();
        let expires_at = now
            .checked_add(ttl)
            .unwrap_or_else(|| now + FAR_FUTURE);
        self.add_with_expire(key, value, expires_at);
    }

    /// Stores a key-value pair expiring at `expires_at`.
    ///
    /// An existing key gets the new value and expiration and becomes the most
    /// recently used entry. A new key may evict the least recently used one.
    pub fn add_with_expire(&self, key: K, value: V, expires_at: Instant) {
        self.shared
            .state
            .write()
            .add_with_expire(key, value, expires_at, self.shared.capacity);
    }

    // == Get ==
    /// Returns the value for `key` and marks it most recently used.
    ///
    /// Does not refresh the expiration.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        V: Clone,
    {
        self.shared.state.write().get(key)
    }

    /// Returns the value for `key` without touching its recency.
    pub fn peek<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        V: Clone,
    {
        self.shared
            .state
            .read()
            .entry(key)
            .map(|entry| entry.value.clone())
    }

    // == Contains ==
    /// Checks if `key` is cached, without touching its recency.
    ///
    /// An expired entry counts until the sweep removes it.
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.shared.state.read().index.contains_key(key)
    }

    /// Time left before `key` expires, zero if it has expired but not yet
    /// been swept.
    pub fn ttl_remaining<Q>(&self, key: &Q) -> Option<Duration>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let now = Instant::now();
        self.shared
            .state
            .read()
            .entry(key)
            .map(|entry| entry.ttl_remaining_at(now))
    }

    // == Remove ==
    /// Removes `key`. Absent keys are a no-op.
    pub fn remove<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.shared.state.write().remove(key)
    }

    // == Purge ==
    /// Clears everything from the cache.
    pub fn purge(&self) {
        self.shared.state.write().purge();
    }

    // == Sweep ==
    /// Runs one sweep pass now and returns the number of expired entries removed.
    pub fn sweep_expired(&self) -> usize {
        self.shared.sweep_expired()
    }

    // == Length ==
    /// Returns the current number of entries, including expired ones not yet swept.
    pub fn len(&self) -> usize {
        self.shared.state.read().recency.len()
    }

    /// Returns true if the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // == Capacity ==
    /// Fixed at construction, read without locking.
    pub fn capacity(&self) -> usize {
        self.shared.capacity
    }

    /// TTL applied by [`add`](Self::add).
    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let state = self.shared.state.read();
        state.stats.snapshot(state.recency.len())
    }

    // == Lifecycle ==
    /// Asks the sweep task to stop. Entries no longer expire afterwards.
    ///
    /// Idempotent and non-blocking.
    pub fn close(&self) {
        self.shutdown.notify_one();
    }

    /// Stops the sweep task and waits for it to exit.
    pub async fn shutdown(&self) -> Result<()> {
        self.close();
        let sweeper = self.sweeper.lock().take();
        if let Some(sweeper) = sweeper {
            sweeper
                .await
                .map_err(|e| CacheError::SweeperFailed(e.to_string()))?;
        }
        Ok(())
    }

    /// Whether the sweep task is still running.
    pub fn is_sweeping(&self) -> bool {
        self.sweeper
            .lock()
            .as_ref()
            .is_some_and(|sweeper| !sweeper.is_finished())
    }
}

impl<K, V> Drop for TtlLruCache<K, V> {
    fn drop(&mut self) {
        self.shutdown.notify_one();
    }
}

impl<K, V> Cache<K, V> for TtlLruCache<K, V>
where
    K: Hash + Eq + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn add(&self, key: K, value: V) {
        TtlLruCache::add(self, key, value);
    }

    fn get(&self, key: &K) -> Option<V> {
        TtlLruCache::get(self, key)
    }

    fn remove(&self, key: &K) -> Option<V> {
        TtlLruCache::remove(self, key)
    }

    fn purge(&self) {
        TtlLruCache::purge(self);
    }

    fn len(&self) -> usize {
        TtlLruCache::len(self)
    }

    fn capacity(&self) -> usize {
        TtlLruCache::capacity(self)
    }
}
