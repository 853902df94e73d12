//! Tag-aware response storage.
//!
//! Entries live in a bounded LRU with an optional time-to-live. Every entry is
//! registered under its tags; revoking a tag evicts all entries it covers.
//! Concurrent misses for the same key share a single computation.

use std::future::Future;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use dashmap::DashMap;
use lru::LruCache;
use metrics::counter;
use tokio::sync::Mutex as AsyncMutex;
use tokio::time::Instant;
use tracing::debug;

use super::config::CacheConfig;
use super::registry::TagRegistry;
use crate::util::lock::{rw_read, rw_write};

const SOURCE: &str = "cache::store";

pub(crate) const METRIC_CACHE_HIT: &str = "storefront_cache_hit_total";
pub(crate) const METRIC_CACHE_MISS: &str = "storefront_cache_miss_total";
pub(crate) const METRIC_CACHE_EVICT: &str = "storefront_cache_evict_total";
pub(crate) const METRIC_CACHE_EXPIRED: &str = "storefront_cache_expired_total";

struct Entry<V> {
    value: V,
    expires_at: Option<Instant>,
}

impl<V> Entry<V> {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|deadline| deadline <= now)
    }
}

/// Bounded cache whose entries can be revoked by tag.
pub struct TaggedCache<V> {
    name: &'static str,
    enabled: bool,
    ttl: Option<Duration>,
    entries: RwLock<LruCache<String, Entry<V>>>,
    /// Only mutated while the `entries` write lock is held, so a stored key
    /// and its tags change together.
    registry: TagRegistry,
    in_flight: DashMap<String, Arc<AsyncMutex<()>>>,
}

impl<V> TaggedCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Create a cache; `name` labels its metrics and logs.
    pub fn new(name: &'static str, config: &CacheConfig) -> Self {
        Self {
            name,
            enabled: config.enable_error_page_cache,
            ttl: config.entry_ttl(),
            entries: RwLock::new(LruCache::new(config.error_page_limit_non_zero())),
            registry: TagRegistry::new(),
            in_flight: DashMap::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Fresh value for `key`, dropping it first when its lifetime ran out.
    pub fn get(&self, key: &str) -> Option<V> {
        let now = Instant::now();
        let mut entries = rw_write(&self.entries, SOURCE, "get");
        let expired = match entries.get(key) {
            Some(entry) if !entry.is_expired(now) => return Some(entry.value.clone()),
            Some(_) => true,
            None => false,
        };

        if expired {
            entries.pop(key);
            self.registry.unregister(key);
            drop(entries);
            counter!(METRIC_CACHE_EXPIRED, "cache" => self.name).increment(1);
        }
        None
    }

    /// Store `value` under `key` and register it with `tags`.
    pub fn insert(&self, key: String, value: V, tags: &[String]) {
        let entry = Entry {
            value,
            expires_at: self.ttl.map(|ttl| Instant::now() + ttl),
        };

        let mut entries = rw_write(&self.entries, SOURCE, "insert");
        let evicted = match entries.push(key.clone(), entry) {
            Some((evicted_key, _)) if evicted_key != key => {
                self.registry.unregister(&evicted_key);
                true
            }
            _ => false,
        };
        self.registry.register(&key, tags);
        drop(entries);

        if evicted {
            counter!(METRIC_CACHE_EVICT, "cache" => self.name).increment(1);
        }
    }

    /// Return the cached value or compute, tag and store a new one.
    ///
    /// `compute` yields the value together with its tags. Only one caller
    /// computes a given key at a time; the others wait and reuse its result.
    /// Errors are returned without touching the cache.
    pub async fn get_or_compute<F, E>(&self, key: &str, compute: F) -> Result<V, E>
    where
        F: Future<Output = Result<(V, Vec<String>), E>>,
    {
        if !self.enabled {
            let (value, _) = compute.await?;
            return Ok(value);
        }

        if let Some(value) = self.get(key) {
            counter!(METRIC_CACHE_HIT, "cache" => self.name).increment(1);
            debug!(cache = self.name, outcome = "hit", key, "serving cached entry");
            return Ok(value);
        }

        let slot = InFlightSlot {
            in_flight: &self.in_flight,
            key,
            gate: self
                .in_flight
                .entry(key.to_string())
                .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                .value()
                .clone(),
        };

        let _guard = slot.gate.lock().await;
        match self.get(key) {
            Some(value) => {
                counter!(METRIC_CACHE_HIT, "cache" => self.name).increment(1);
                debug!(cache = self.name, outcome = "hit_after_wait", key, "entry filled by concurrent caller");
                Ok(value)
            }
            None => {
                counter!(METRIC_CACHE_MISS, "cache" => self.name).increment(1);
                debug!(cache = self.name, outcome = "miss", key, "computing entry");
                let (value, tags) = compute.await?;
                self.insert(key.to_string(), value.clone(), &tags);
                Ok(value)
            }
        }
    }

    /// Evict every entry stored under any of `tags`; returns the eviction count.
    pub fn invalidate_tags(&self, tags: &[String]) -> usize {
        let mut entries = rw_write(&self.entries, SOURCE, "invalidate_tags");
        let keys = self.registry.keys_for_tags(tags);
        for key in &keys {
            entries.pop(key.as_str());
            self.registry.unregister(key);
        }
        keys.len()
    }

    pub fn invalidate(&self, key: &str) {
        let mut entries = rw_write(&self.entries, SOURCE, "invalidate");
        entries.pop(key);
        self.registry.unregister(key);
    }

    pub fn clear(&self) {
        let mut entries = rw_write(&self.entries, SOURCE, "clear");
        entries.clear();
        self.registry.clear();
    }

    /// Tags a stored key was registered with.
    pub fn tags_of(&self, key: &str) -> Vec<String> {
        let mut tags: Vec<String> = self.registry.tags_for_key(key).into_iter().collect();
        tags.sort();
        tags
    }

    pub fn len(&self) -> usize {
        rw_read(&self.entries, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Per-key gate of a running computation.
///
/// Dropping the slot, including when the computing future is cancelled,
/// removes the gate once no other caller waits on it.
struct InFlightSlot<'a> {
    in_flight: &'a DashMap<String, Arc<AsyncMutex<()>>>,
    key: &'a str,
    gate: Arc<AsyncMutex<()>>,
}

impl Drop for InFlightSlot<'_> {
    fn drop(&mut self) {
        // Only the map and this slot still hold the gate when nobody waits.
        self.in_flight.remove_if(self.key, |_, existing| {
            Arc::ptr_eq(existing, &self.gate) && Arc::strong_count(existing) <= 2
        });
    }
}
