//! In-memory collaborators shared by the integration tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use storefront_edge::{
    application::{
        context::{ContextResolver, SalesChannelContextService},
        error::AppError,
        error_page::{
            CachedErrorResponse, ErrorPageService, ErrorRenderer, StorefrontException,
            StorefrontResponse,
        },
        events::EventBus,
        not_found::NotFoundSubscriber,
        repos::{
            CategoryRepo, IndexerRegistry, RepoError, SalesChannelRepo, SeoUrlUpdater,
            SystemConfigRepo,
        },
        request::{RequestAttributes, StorefrontRequest},
    },
    cache::{CacheConfig, CacheInvalidator, CacheTracer, TagInvalidation, TaggedCache},
    domain::{
        category::CategoryType,
        context::{SalesChannelContext, TaxState},
        sales_channel::{EntryPoints, SalesChannelDomainRecord, SalesChannelRecord},
    },
};
use uuid::Uuid;

pub const SALES_CHANNEL_ID: Uuid = Uuid::from_u128(0x5c1);
pub const DOMAIN_ID: Uuid = Uuid::from_u128(0xd01);
pub const LANGUAGE_ID: Uuid = Uuid::from_u128(0x1a9);
pub const CURRENCY_ID: Uuid = Uuid::from_u128(0xc42);
pub const SHOP_HOST: &str = "shop.test";
/// Additional language assigned to the default shop.
pub const GERMAN_ID: Uuid = Uuid::from_u128(0xde_de);

pub fn sales_channel() -> SalesChannelRecord {
    SalesChannelRecord {
        id: SALES_CHANNEL_ID,
        name: "Storefront".to_string(),
        language_id: LANGUAGE_ID,
        currency_id: CURRENCY_ID,
        customer_group_id: Uuid::from_u128(0xc60),
        country_id: Uuid::from_u128(0xde),
        tax_state: TaxState::Gross,
        entry_points: EntryPoints {
            navigation_category_id: Uuid::from_u128(0xa),
            footer_category_id: None,
            service_category_id: None,
        },
    }
}

pub fn domain() -> SalesChannelDomainRecord {
    SalesChannelDomainRecord {
        id: DOMAIN_ID,
        sales_channel_id: SALES_CHANNEL_ID,
        url: format!("http://{SHOP_HOST}"),
        language_id: LANGUAGE_ID,
        currency_id: CURRENCY_ID,
    }
}

/// Attributes the routing layer sets for [`SHOP_HOST`].
pub fn attributes() -> RequestAttributes {
    RequestAttributes {
        sales_channel_id: Some(SALES_CHANNEL_ID),
        domain_id: Some(DOMAIN_ID),
        language_id: Some(LANGUAGE_ID),
        domain_currency_id: Some(CURRENCY_ID),
        store_api_proxy: false,
        context: None,
    }
}

pub fn request(path: &str) -> StorefrontRequest {
    StorefrontRequest::new(path, Default::default(), attributes())
}

pub fn context_with_currency(currency_id: Uuid) -> Arc<SalesChannelContext> {
    Arc::new(SalesChannelContext {
        token: Uuid::new_v4().simple().to_string(),
        sales_channel_id: SALES_CHANNEL_ID,
        domain_id: Some(DOMAIN_ID),
        language_id: LANGUAGE_ID,
        language_chain: vec![LANGUAGE_ID],
        currency_id,
        customer_group_id: Uuid::from_u128(0xc60),
        country_id: Uuid::from_u128(0xde),
        tax_state: TaxState::Gross,
        rule_ids: Vec::new(),
        version_id: storefront_edge::domain::context::LIVE_VERSION_ID,
    })
}

#[derive(Default)]
pub struct MemorySalesChannels {
    pub channels: Mutex<Vec<SalesChannelRecord>>,
    pub domains: Mutex<Vec<(String, SalesChannelDomainRecord)>>,
    pub extra_languages: Mutex<Vec<(Uuid, Uuid)>>,
}

impl MemorySalesChannels {
    pub fn with_default_shop() -> Self {
        let repo = Self::default();
        repo.channels.lock().unwrap().push(sales_channel());
        repo.domains
            .lock()
            .unwrap()
            .push((SHOP_HOST.to_string(), domain()));
        repo.extra_languages
            .lock()
            .unwrap()
            .push((SALES_CHANNEL_ID, GERMAN_ID));
        repo
    }
}

#[async_trait]
impl SalesChannelRepo for MemorySalesChannels {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<SalesChannelRecord>, RepoError> {
        Ok(self
            .channels
            .lock()
            .unwrap()
            .iter()
            .find(|channel| channel.id == id)
            .cloned())
    }

    async fn find_domain_by_host(
        &self,
        host: &str,
    ) -> Result<Option<SalesChannelDomainRecord>, RepoError> {
        Ok(self
            .domains
            .lock()
            .unwrap()
            .iter()
            .find(|(candidate, _)| candidate == host)
            .map(|(_, domain)| domain.clone()))
    }

    async fn language_ids(&self, sales_channel_id: Uuid) -> Result<Vec<Uuid>, RepoError> {
        let mut languages: Vec<Uuid> = self
            .channels
            .lock()
            .unwrap()
            .iter()
            .filter(|channel| channel.id == sales_channel_id)
            .map(|channel| channel.language_id)
            .collect();
        languages.extend(
            self.domains
                .lock()
                .unwrap()
                .iter()
                .filter(|(_, domain)| domain.sales_channel_id == sales_channel_id)
                .map(|(_, domain)| domain.language_id),
        );
        languages.extend(
            self.extra_languages
                .lock()
                .unwrap()
                .iter()
                .filter(|(channel, _)| *channel == sales_channel_id)
                .map(|(_, language)| *language),
        );
        languages.dedup();
        Ok(languages)
    }

    async fn update_entry_points(
        &self,
        id: Uuid,
        entry_points: &EntryPoints,
    ) -> Result<(), RepoError> {
        let mut channels = self.channels.lock().unwrap();
        let channel = channels
            .iter_mut()
            .find(|channel| channel.id == id)
            .ok_or(RepoError::NotFound)?;
        channel.entry_points = *entry_points;
        Ok(())
    }
}

#[derive(Default)]
pub struct MemorySystemConfig {
    values: Mutex<HashMap<(String, Option<Uuid>), Value>>,
}

#[async_trait]
impl SystemConfigRepo for MemorySystemConfig {
    async fn get(
        &self,
        key: &str,
        sales_channel_id: Option<Uuid>,
    ) -> Result<Option<Value>, RepoError> {
        let values = self.values.lock().unwrap();
        Ok(values
            .get(&(key.to_string(), sales_channel_id))
            .or_else(|| values.get(&(key.to_string(), None)))
            .cloned())
    }

    async fn set(
        &self,
        key: &str,
        value: &Value,
        sales_channel_id: Option<Uuid>,
    ) -> Result<(), RepoError> {
        self.values
            .lock()
            .unwrap()
            .insert((key.to_string(), sales_channel_id), value.clone());
        Ok(())
    }
}

pub struct CategoryRow {
    pub id: Uuid,
    pub path: Option<String>,
    pub kind: CategoryType,
}

/// Mirrors `type <> 'link' AND path LIKE '%<hex>%'` per id.
#[derive(Default)]
pub struct MemoryCategories {
    pub rows: Mutex<Vec<CategoryRow>>,
    pub queries: AtomicUsize,
}

impl MemoryCategories {
    pub fn insert(&self, id: Uuid, path: Option<String>, kind: CategoryType) {
        self.rows.lock().unwrap().push(CategoryRow { id, path, kind });
    }
}

#[async_trait]
impl CategoryRepo for MemoryCategories {
    async fn find_descendant_ids(&self, ids: &[Uuid]) -> Result<Vec<Uuid>, RepoError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        let rows = self.rows.lock().unwrap();
        Ok(rows
            .iter()
            .filter(|row| row.kind != CategoryType::Link)
            .filter(|row| {
                row.path.as_deref().is_some_and(|path| {
                    ids.iter()
                        .any(|id| path.contains(&id.simple().to_string()))
                })
            })
            .map(|row| row.id)
            .collect())
    }
}

#[derive(Default)]
pub struct RecordingSeoUpdater {
    pub calls: Mutex<Vec<(String, Vec<Uuid>)>>,
    pub fail: bool,
}

#[async_trait]
impl SeoUrlUpdater for RecordingSeoUpdater {
    async fn update(&self, route_name: &str, ids: &[Uuid]) -> Result<(), RepoError> {
        if self.fail {
            return Err(RepoError::from_persistence("seo url table locked"));
        }
        self.calls
            .lock()
            .unwrap()
            .push((route_name.to_string(), ids.to_vec()));
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingIndexer {
    pub messages: Mutex<Vec<Vec<String>>>,
}

#[async_trait]
impl IndexerRegistry for RecordingIndexer {
    async fn send_indexing_message(&self, indexers: &[&str]) -> Result<(), RepoError> {
        self.messages
            .lock()
            .unwrap()
            .push(indexers.iter().map(|name| name.to_string()).collect());
        Ok(())
    }
}

/// Delegates to the real renderer and counts the renders.
pub struct CountingRenderer {
    inner: ErrorPageService,
    pub renders: AtomicUsize,
    pub delay: Option<Duration>,
}

impl CountingRenderer {
    pub fn new(system_config: Arc<dyn SystemConfigRepo>) -> Self {
        Self {
            inner: ErrorPageService::new(system_config),
            renders: AtomicUsize::new(0),
            delay: None,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn count(&self) -> usize {
        self.renders.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ErrorRenderer for CountingRenderer {
    async fn render(
        &self,
        exception: &StorefrontException,
        request: &StorefrontRequest,
        context: &Arc<SalesChannelContext>,
    ) -> Result<StorefrontResponse, AppError> {
        self.renders.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.inner.render(exception, request, context).await
    }
}

pub struct HarnessOptions {
    pub kernel_debug: bool,
    pub cache_on_exception: bool,
    pub cache: CacheConfig,
    pub render_delay: Option<Duration>,
}

impl Default for HarnessOptions {
    fn default() -> Self {
        Self {
            kernel_debug: false,
            cache_on_exception: true,
            cache: CacheConfig::default(),
            render_delay: None,
        }
    }
}

/// The not-found subscriber wired to in-memory collaborators.
pub struct NotFoundHarness {
    pub bus: Arc<EventBus>,
    pub cache: Arc<TaggedCache<CachedErrorResponse>>,
    pub renderer: Arc<CountingRenderer>,
    pub sales_channels: Arc<MemorySalesChannels>,
    pub system_config: Arc<MemorySystemConfig>,
    pub subscriber: Arc<NotFoundSubscriber>,
}

impl NotFoundHarness {
    pub fn new() -> Self {
        Self::with_options(HarnessOptions::default())
    }

    pub fn with_options(options: HarnessOptions) -> Self {
        let bus = Arc::new(EventBus::new());
        let sales_channels = Arc::new(MemorySalesChannels::with_default_shop());
        let system_config = Arc::new(MemorySystemConfig::default());

        let mut renderer = CountingRenderer::new(system_config.clone());
        if let Some(delay) = options.render_delay {
            renderer = renderer.with_delay(delay);
        }
        let renderer = Arc::new(renderer);

        let cache = Arc::new(TaggedCache::new("error_page", &options.cache));
        let caches: Vec<Arc<dyn TagInvalidation>> = vec![cache.clone()];
        let contexts: Arc<dyn ContextResolver> =
            Arc::new(SalesChannelContextService::new(sales_channels.clone()));

        let subscriber = Arc::new(NotFoundSubscriber::new(
            renderer.clone(),
            contexts,
            options.kernel_debug,
            cache.clone(),
            Arc::new(CacheTracer::new()),
            CacheInvalidator::new(caches),
            &bus,
        ));
        subscriber.register(&bus, options.cache_on_exception);

        Self {
            bus,
            cache,
            renderer,
            sales_channels,
            system_config,
            subscriber,
        }
    }
}
