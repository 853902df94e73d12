//! Tag invalidation fan-out across every tagged cache.

use std::sync::Arc;

use metrics::counter;
use tracing::info;

use super::store::TaggedCache;

pub(crate) const METRIC_CACHE_INVALIDATED: &str = "storefront_cache_invalidated_total";

/// A cache that can evict entries by tag.
pub trait TagInvalidation: Send + Sync {
    fn cache_name(&self) -> &'static str;

    fn invalidate_tags(&self, tags: &[String]) -> usize;
}

impl<V> TagInvalidation for TaggedCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn cache_name(&self) -> &'static str {
        self.name()
    }

    fn invalidate_tags(&self, tags: &[String]) -> usize {
        TaggedCache::invalidate_tags(self, tags)
    }
}

/// Revokes tags in all registered caches.
#[derive(Clone, Default)]
pub struct CacheInvalidator {
    caches: Vec<Arc<dyn TagInvalidation>>,
}

impl CacheInvalidator {
    pub fn new(caches: Vec<Arc<dyn TagInvalidation>>) -> Self {
        Self { caches }
    }

    /// Evict entries tagged with any of `tags`; returns the total eviction count.
    pub fn invalidate(&self, tags: &[String]) -> usize {
        let mut total = 0;
        for cache in &self.caches {
            let evicted = cache.invalidate_tags(tags);
            if evicted > 0 {
                counter!(METRIC_CACHE_INVALIDATED, "cache" => cache.cache_name())
                    .increment(evicted as u64);
            }
            total += evicted;
        }

        info!(tags = ?tags, evicted = total, "Cache tags invalidated");
        total
    }
}
