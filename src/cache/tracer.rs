//! Render tracing for cache tag collection.
//!
//! Uses `tokio::task_local!` to collect the tags of every sub-resource read
//! while a traced future runs. Collaborators call [`record`] before reading
//! data that affects the rendered output. [`CacheTracer::trace_collect`]
//! hands the tags straight back to the caller; [`CacheTracer::trace`] keeps
//! them in a bounded per-name history for [`CacheTracer::get`].

use std::cell::RefCell;
use std::future::Future;
use std::num::NonZeroUsize;
use std::sync::RwLock;

use lru::LruCache;

use crate::util::lock::{rw_read, rw_write};

const SOURCE: &str = "cache::tracer";

/// Trace names remembered for [`CacheTracer::get`].
pub const TRACE_HISTORY_LIMIT: usize = 256;

tokio::task_local! {
    static TAGS: RefCell<Vec<String>>;
}

/// Record a tag for the innermost active trace.
///
/// Outside of a trace the call is silently ignored.
pub fn record(tag: impl Into<String>) {
    let tag = tag.into();
    let _ = TAGS.try_with(|tags| push_unique(&mut tags.borrow_mut(), tag));
}

fn push_unique(tags: &mut Vec<String>, tag: String) {
    if !tags.contains(&tag) {
        tags.push(tag);
    }
}

/// Keeps the tags collected by the most recent `trace` of recently used names.
pub struct CacheTracer {
    traces: RwLock<LruCache<String, Vec<String>>>,
}

impl Default for CacheTracer {
    fn default() -> Self {
        Self::with_history_limit(TRACE_HISTORY_LIMIT)
    }
}

impl CacheTracer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_history_limit(limit: usize) -> Self {
        let limit = NonZeroUsize::new(limit).unwrap_or(NonZeroUsize::MIN);
        Self {
            traces: RwLock::new(LruCache::new(limit)),
        }
    }

    /// Run `future` while collecting tags under `name`.
    ///
    /// Tags collected by a nested trace also flow into the enclosing trace.
    pub async fn trace<F, R>(&self, name: &str, future: F) -> R
    where
        F: Future<Output = R>,
    {
        let (result, collected) = self.trace_collect(name, future).await;
        rw_write(&self.traces, SOURCE, "trace").put(name.to_string(), collected);
        result
    }

    /// Run `future` and return the tags of this run alongside its output.
    ///
    /// Nothing is retained; concurrent traces under one name each see only
    /// their own tags.
    pub async fn trace_collect<F, R>(&self, name: &str, future: F) -> (R, Vec<String>)
    where
        F: Future<Output = R>,
    {
        let (result, collected) = TAGS
            .scope(RefCell::new(Vec::new()), async {
                let result = future.await;
                let collected = TAGS.with(|tags| tags.take());
                (result, collected)
            })
            .await;

        let _ = TAGS.try_with(|outer| {
            let mut outer = outer.borrow_mut();
            for tag in &collected {
                push_unique(&mut outer, tag.clone());
            }
        });

        tracing::trace!(trace = name, tags = collected.len(), "collected render tags");
        (result, collected)
    }

    /// Tags collected by the last `trace` of `name`, if still remembered.
    pub fn get(&self, name: &str) -> Vec<String> {
        rw_read(&self.traces, SOURCE, "get")
            .peek(name)
            .cloned()
            .unwrap_or_default()
    }

    /// Number of trace names currently remembered.
    pub fn len(&self) -> usize {
        rw_read(&self.traces, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
