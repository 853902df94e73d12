//! Propagation of indexer results to SEO URL generation.

use std::sync::Arc;

use async_trait::async_trait;
use metrics::counter;
use tracing::{debug, info};
use uuid::Uuid;

use crate::domain::{
    events::{
        CategoryIndexerEvent, EntityWrittenContainerEvent, IndexedEntities,
        LandingPageIndexerEvent, ProductIndexerEvent,
    },
    sales_channel::{ENTRY_POINT_PROPERTIES, SALES_CHANNEL_ENTITY},
};

use super::{
    error::AppError,
    events::{EventBus, EventHandler},
    repos::{CategoryRepo, IndexerRegistry, SeoUrlUpdater},
};

pub const PRODUCT_ROUTE_NAME: &str = "frontend.detail.page";
pub const CATEGORY_ROUTE_NAME: &str = "frontend.navigation.page";
pub const LANDING_PAGE_ROUTE_NAME: &str = "frontend.landing.page";

pub const PRODUCT_SEO_URL_UPDATER: &str = "product.seo-url";
pub const CATEGORY_SEO_URL_UPDATER: &str = "category.seo-url";
pub const LANDING_PAGE_SEO_URL_UPDATER: &str = "landing_page.seo-url";

/// Indexers re-run when a sales channel moves its navigation entry points.
pub const ENTRY_POINT_INDEXERS: [&str; 2] = ["category.indexer", "product.indexer"];

const METRIC_SEO_URL_UPDATE: &str = "storefront_seo_url_update_total";
const METRIC_INDEXING_MESSAGE: &str = "storefront_indexing_message_total";

pub struct SeoUrlUpdateListener {
    updater: Arc<dyn SeoUrlUpdater>,
    categories: Arc<dyn CategoryRepo>,
    indexers: Arc<dyn IndexerRegistry>,
}

impl SeoUrlUpdateListener {
    pub fn new(
        updater: Arc<dyn SeoUrlUpdater>,
        categories: Arc<dyn CategoryRepo>,
        indexers: Arc<dyn IndexerRegistry>,
    ) -> Self {
        Self {
            updater,
            categories,
            indexers,
        }
    }

    pub fn register(self: &Arc<Self>, bus: &EventBus) {
        bus.subscribe::<ProductIndexerEvent>(0, self.clone());
        bus.subscribe::<CategoryIndexerEvent>(0, self.clone());
        bus.subscribe::<LandingPageIndexerEvent>(0, self.clone());
        bus.subscribe::<EntityWrittenContainerEvent>(0, self.clone());
    }

    pub async fn update_product_urls(&self, event: &IndexedEntities) -> Result<(), AppError> {
        if event.skips(PRODUCT_SEO_URL_UPDATER) {
            return Ok(());
        }
        self.forward(PRODUCT_ROUTE_NAME, &event.ids).await
    }

    /// Forward the indexed categories plus every non-link descendant.
    pub async fn update_category_urls(&self, event: &IndexedEntities) -> Result<(), AppError> {
        if event.skips(CATEGORY_SEO_URL_UPDATER) {
            return Ok(());
        }

        let mut ids = event.ids.clone();
        if !event.ids.is_empty() {
            for child in self.categories.find_descendant_ids(&event.ids).await? {
                if !ids.contains(&child) {
                    ids.push(child);
                }
            }
        }
        self.forward(CATEGORY_ROUTE_NAME, &ids).await
    }

    pub async fn update_landing_page_urls(&self, event: &IndexedEntities) -> Result<(), AppError> {
        if event.skips(LANDING_PAGE_SEO_URL_UPDATER) {
            return Ok(());
        }
        self.forward(LANDING_PAGE_ROUTE_NAME, &event.ids).await
    }

    pub async fn detect_sales_channel_entry_points(
        &self,
        event: &EntityWrittenContainerEvent,
    ) -> Result<(), AppError> {
        let sales_channel_ids = event
            .primary_keys_with_property_change(SALES_CHANNEL_ENTITY, &ENTRY_POINT_PROPERTIES);
        if sales_channel_ids.is_empty() {
            return Ok(());
        }

        info!(
            sales_channels = ?sales_channel_ids,
            "Sales channel entry points changed; queueing full re-index"
        );
        self.indexers
            .send_indexing_message(&ENTRY_POINT_INDEXERS)
            .await?;
        counter!(METRIC_INDEXING_MESSAGE).increment(1);
        Ok(())
    }

    async fn forward(&self, route_name: &'static str, ids: &[Uuid]) -> Result<(), AppError> {
        debug!(route = route_name, ids = ids.len(), "Forwarding SEO URL update");
        self.updater.update(route_name, ids).await?;
        counter!(METRIC_SEO_URL_UPDATE, "route" => route_name).increment(1);
        Ok(())
    }
}

#[async_trait]
impl EventHandler<ProductIndexerEvent> for SeoUrlUpdateListener {
    async fn handle(&self, event: &mut ProductIndexerEvent) -> Result<(), AppError> {
        self.update_product_urls(&event.0).await
    }
}

#[async_trait]
impl EventHandler<CategoryIndexerEvent> for SeoUrlUpdateListener {
    async fn handle(&self, event: &mut CategoryIndexerEvent) -> Result<(), AppError> {
        self.update_category_urls(&event.0).await
    }
}

#[async_trait]
impl EventHandler<LandingPageIndexerEvent> for SeoUrlUpdateListener {
    async fn handle(&self, event: &mut LandingPageIndexerEvent) -> Result<(), AppError> {
        self.update_landing_page_urls(&event.0).await
    }
}

#[async_trait]
impl EventHandler<EntityWrittenContainerEvent> for SeoUrlUpdateListener {
    async fn handle(&self, event: &mut EntityWrittenContainerEvent) -> Result<(), AppError> {
        self.detect_sales_channel_entry_points(event).await
    }
}
