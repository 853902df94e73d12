//! Cache configuration.
//!
//! Controls the tag-aware error page cache via the `[cache]` section.

use std::num::NonZeroUsize;
use std::time::Duration;

use serde::Deserialize;

const DEFAULT_ERROR_PAGE_LIMIT: usize = 500;
const DEFAULT_ENTRY_TTL_SECS: u64 = 3600;

/// Cache configuration from `storefront.toml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Store rendered error pages.
    pub enable_error_page_cache: bool,
    /// Maximum number of cached error pages.
    pub error_page_limit: usize,
    /// Lifetime of a cached entry in seconds; zero keeps entries until evicted.
    pub entry_ttl_seconds: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enable_error_page_cache: true,
            error_page_limit: DEFAULT_ERROR_PAGE_LIMIT,
            entry_ttl_seconds: DEFAULT_ENTRY_TTL_SECS,
        }
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            enable_error_page_cache: settings.enable_error_page_cache,
            error_page_limit: settings.error_page_limit,
            entry_ttl_seconds: settings.entry_ttl_seconds,
        }
    }
}

impl CacheConfig {
    /// Returns the error page limit as NonZeroUsize, clamping to 1 if zero.
    pub fn error_page_limit_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.error_page_limit).unwrap_or(NonZeroUsize::MIN)
    }

    pub fn entry_ttl(&self) -> Option<Duration> {
        (self.entry_ttl_seconds > 0).then(|| Duration::from_secs(self.entry_ttl_seconds))
    }
}
