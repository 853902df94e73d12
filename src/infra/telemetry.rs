use std::sync::Once;

use metrics::{Unit, describe_counter};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Install a global tracing subscriber using the provided logging settings.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .boxed(),
        LogFormat::Compact => fmt::layer().compact().with_target(true).boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(ErrorLayer::default())
        .with(fmt_layer)
        .try_init()
        .map_err(|err| {
            InfraError::telemetry(format!("failed to install tracing subscriber: {err}"))
        })
}

pub fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            "storefront_cache_hit_total",
            Unit::Count,
            "Total number of tagged cache hits."
        );
        describe_counter!(
            "storefront_cache_miss_total",
            Unit::Count,
            "Total number of tagged cache misses that triggered a render."
        );
        describe_counter!(
            "storefront_cache_evict_total",
            Unit::Count,
            "Total number of tagged cache evictions due to capacity."
        );
        describe_counter!(
            "storefront_cache_expired_total",
            Unit::Count,
            "Total number of tagged cache entries dropped after their TTL."
        );
        describe_counter!(
            "storefront_cache_invalidated_total",
            Unit::Count,
            "Total number of cache entries evicted by tag invalidation."
        );
        describe_counter!(
            "storefront_seo_url_update_total",
            Unit::Count,
            "Total number of SEO URL update requests handed to the updater."
        );
        describe_counter!(
            "storefront_indexing_message_total",
            Unit::Count,
            "Total number of full re-index messages queued."
        );
    });
}
