//! Storefront cache system.
//!
//! Provides the tag-aware cache behind the not-found page:
//!
//! - **Store**: bounded LRU with TTL and per-key single flight
//! - **Registry**: tag ↔ key index used for group revocation
//! - **Tracer**: task-local collection of the tags touched while rendering
//! - **Invalidator**: fans tag revocation out to every tagged cache
//!
//! ## Configuration
//!
//! ```toml
//! [cache]
//! enable_error_page_cache = true
//! error_page_limit = 500
//! entry_ttl_seconds = 3600
//! ```

mod config;
mod invalidator;
pub mod keys;
mod registry;
mod store;
pub mod tracer;

pub use config::CacheConfig;
pub use invalidator::{CacheInvalidator, TagInvalidation};
pub use keys::{ALL_TAG, build_key, build_name, context_hash, normalize_tags};
pub use registry::TagRegistry;
pub use store::TaggedCache;
pub use tracer::CacheTracer;
