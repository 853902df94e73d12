mod support;

use std::collections::HashSet;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use metrics_util::debugging::DebuggingRecorder;
use storefront_edge::{
    application::seo::SeoUrlUpdateListener,
    cache::{CacheConfig, CacheInvalidator, TagInvalidation, TaggedCache},
    domain::{
        events::{EntityWriteResult, EntityWrittenContainerEvent, IndexedEntities, WriteOperation},
        sales_channel::SALES_CHANNEL_ENTITY,
    },
};
use support::{MemoryCategories, RecordingIndexer, RecordingSeoUpdater};
use uuid::Uuid;

fn tags(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

#[tokio::test(start_paused = true)]
async fn storefront_paths_emit_expected_metric_keys() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    recorder
        .install()
        .expect("debug metrics recorder should install in this test process");
    storefront_edge::infra::telemetry::describe_metrics();

    // hit, miss, evict and expiry on a single-entry cache
    let cache = Arc::new(TaggedCache::<String>::new(
        "metrics",
        &CacheConfig {
            error_page_limit: 1,
            entry_ttl_seconds: 5,
            ..Default::default()
        },
    ));
    for key in ["one", "one", "two"] {
        cache
            .get_or_compute(key, async {
                Ok::<_, Infallible>((key.to_string(), tags(&["error-page"])))
            })
            .await
            .unwrap();
    }
    tokio::time::advance(Duration::from_secs(6)).await;
    assert!(cache.get("two").is_none());

    // invalidation
    cache.insert("three".into(), "three".into(), &tags(&["error-page"]));
    let caches: Vec<Arc<dyn TagInvalidation>> = vec![cache.clone()];
    assert_eq!(CacheInvalidator::new(caches).invalidate(&tags(&["error-page"])), 1);

    // seo url forwarding and entry point re-index
    let listener = SeoUrlUpdateListener::new(
        Arc::new(RecordingSeoUpdater::default()),
        Arc::new(MemoryCategories::default()),
        Arc::new(RecordingIndexer::default()),
    );
    listener
        .update_product_urls(&IndexedEntities::new(vec![Uuid::from_u128(1)]))
        .await
        .unwrap();
    listener
        .detect_sales_channel_entry_points(&EntityWrittenContainerEvent::new(vec![
            EntityWriteResult {
                entity_name: SALES_CHANNEL_ENTITY.to_string(),
                primary_key: Uuid::from_u128(2),
                operation: WriteOperation::Update,
                payload: serde_json::Map::from_iter([(
                    "navigationCategoryId".to_string(),
                    serde_json::Value::from("x"),
                )]),
            },
        ]))
        .await
        .unwrap();

    let names: HashSet<String> = snapshotter
        .snapshot()
        .into_vec()
        .into_iter()
        .map(|(composite_key, _, _, _)| composite_key.key().name().to_string())
        .collect();

    let expected = [
        "storefront_cache_hit_total",
        "storefront_cache_miss_total",
        "storefront_cache_evict_total",
        "storefront_cache_expired_total",
        "storefront_cache_invalidated_total",
        "storefront_seo_url_update_total",
        "storefront_indexing_message_total",
    ];

    for metric in expected {
        assert!(names.contains(metric), "missing metric: {metric}");
    }
}
