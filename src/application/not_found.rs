//! Cached rendering of storefront "not found" pages.
//!
//! Errors raised while handling storefront requests are turned into error
//! pages here. Pages for 404 outcomes are cached per sales channel, domain,
//! language and context digest and tagged with everything the renderer read,
//! so a config write can revoke them. All other errors render fresh.

use std::sync::{Arc, Weak};

use async_trait::async_trait;
use tracing::{debug, info};

use crate::{
    cache::{
        ALL_TAG, CacheInvalidator, CacheTracer, TaggedCache, build_key, build_name, context_hash,
        normalize_tags,
    },
    domain::{
        context::{ContextParameters, SalesChannelContext},
        events::SystemConfigChangedEvent,
    },
};

use super::{
    context::ContextResolver,
    error::AppError,
    error_page::{
        CachedErrorResponse, ErrorRenderer, NOT_FOUND_PAGE_CONFIG_KEY, StorefrontException,
    },
    events::{Event, EventBus, EventHandler},
    request::StorefrontRequest,
};

/// Priority of the exception handler; runs after regular exception handlers.
pub const EXCEPTION_HANDLER_PRIORITY: i32 = -100;

/// Raised when handling a storefront request failed.
#[derive(Debug)]
pub struct ExceptionEvent {
    pub request: StorefrontRequest,
    pub exception: StorefrontException,
    response: Option<CachedErrorResponse>,
    propagation_stopped: bool,
}

impl ExceptionEvent {
    pub fn new(request: StorefrontRequest, exception: StorefrontException) -> Self {
        Self {
            request,
            exception,
            response: None,
            propagation_stopped: false,
        }
    }

    pub fn response(&self) -> Option<&CachedErrorResponse> {
        self.response.as_ref()
    }

    pub fn set_response(&mut self, response: CachedErrorResponse) {
        self.response = Some(response);
    }

    pub fn take_response(&mut self) -> Option<CachedErrorResponse> {
        self.response.take()
    }

    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }
}

impl Event for ExceptionEvent {
    fn is_propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }
}

/// Hook allowing listeners to rewrite a computed error-page cache key.
#[derive(Debug, Clone)]
pub struct NotFoundPageCacheKeyEvent {
    pub key: String,
    pub request: StorefrontRequest,
    pub context: Arc<SalesChannelContext>,
}

impl Event for NotFoundPageCacheKeyEvent {}

/// Hook allowing listeners to rewrite the tags of an error page.
#[derive(Debug, Clone)]
pub struct NotFoundPageTagsEvent {
    pub tags: Vec<String>,
    pub request: StorefrontRequest,
    pub context: Arc<SalesChannelContext>,
}

impl Event for NotFoundPageTagsEvent {}

pub struct NotFoundSubscriber {
    renderer: Arc<dyn ErrorRenderer>,
    contexts: Arc<dyn ContextResolver>,
    kernel_debug: bool,
    cache: Arc<TaggedCache<CachedErrorResponse>>,
    tracer: Arc<CacheTracer>,
    invalidator: CacheInvalidator,
    hooks: Weak<EventBus>,
}

impl NotFoundSubscriber {
    pub fn new(
        renderer: Arc<dyn ErrorRenderer>,
        contexts: Arc<dyn ContextResolver>,
        kernel_debug: bool,
        cache: Arc<TaggedCache<CachedErrorResponse>>,
        tracer: Arc<CacheTracer>,
        invalidator: CacheInvalidator,
        hooks: &Arc<EventBus>,
    ) -> Self {
        Self {
            renderer,
            contexts,
            kernel_debug,
            cache,
            tracer,
            invalidator,
            hooks: Arc::downgrade(hooks),
        }
    }

    /// Subscribe to `bus`.
    ///
    /// The exception handler is only installed when `cache_on_exception` is
    /// set; config-change invalidation is always installed.
    pub fn register(self: &Arc<Self>, bus: &EventBus, cache_on_exception: bool) {
        if cache_on_exception {
            bus.subscribe::<ExceptionEvent>(EXCEPTION_HANDLER_PRIORITY, self.clone());
        }
        bus.subscribe::<SystemConfigChangedEvent>(0, self.clone());
    }

    pub async fn on_error(&self, event: &mut ExceptionEvent) -> Result<(), AppError> {
        if self.kernel_debug || event.request.attributes.store_api_proxy {
            debug!(path = %event.request.path, "Error page caching bypassed");
            return Ok(());
        }

        event.stop_propagation();

        let context = match event.request.attributes.context.clone() {
            Some(context) => context,
            None => {
                let context = Arc::new(self.resolve_context(&event.request).await?);
                event.request.attributes.context = Some(context.clone());
                context
            }
        };

        if !event.exception.is_not_found() {
            let response = self
                .renderer
                .render(&event.exception, &event.request, &context)
                .await?;
            event.set_response(response.strip_transient());
            return Ok(());
        }

        let attributes = &event.request.attributes;
        let name = build_name(
            attributes.sales_channel_id,
            attributes.domain_id,
            event.request.language_id(),
        );
        let key = self.generate_key(&name, &event.request, &context).await?;

        let response = self
            .cache
            .get_or_compute(&key, async {
                let (rendered, traced) = self
                    .tracer
                    .trace_collect(
                        &name,
                        self.renderer
                            .render(&event.exception, &event.request, &context),
                    )
                    .await;
                let response = rendered?.strip_transient();
                let tags = self
                    .generate_tags(&name, traced, &event.request, &context)
                    .await?;
                debug!(key = %key, tags = ?tags, "Error page stored");
                Ok::<_, AppError>((response, tags))
            })
            .await?;

        event.set_response(response);
        Ok(())
    }

    pub fn on_system_config_changed(&self, event: &SystemConfigChangedEvent) {
        if event.key != NOT_FOUND_PAGE_CONFIG_KEY {
            return;
        }

        let evicted = self.invalidator.invalidate(&[ALL_TAG.to_string()]);
        info!(key = %event.key, evicted, "Not-found page setting changed");
    }

    async fn resolve_context(
        &self,
        request: &StorefrontRequest,
    ) -> Result<SalesChannelContext, AppError> {
        let attributes = &request.attributes;
        let sales_channel_id = attributes.sales_channel_id.ok_or_else(|| {
            AppError::context_resolution(format!("request `{}` has no sales channel", request.path))
        })?;

        self.contexts
            .resolve(ContextParameters::with_random_token(
                sales_channel_id,
                request.language_id(),
                attributes.domain_currency_id,
                attributes.domain_id,
            ))
            .await
    }

    async fn generate_key(
        &self,
        name: &str,
        request: &StorefrontRequest,
        context: &Arc<SalesChannelContext>,
    ) -> Result<String, AppError> {
        let mut event = NotFoundPageCacheKeyEvent {
            key: build_key(name, &context_hash(context)),
            request: request.clone(),
            context: context.clone(),
        };
        if let Some(hooks) = self.hooks.upgrade() {
            hooks.dispatch(&mut event).await?;
        }
        Ok(event.key)
    }

    async fn generate_tags(
        &self,
        name: &str,
        traced: Vec<String>,
        request: &StorefrontRequest,
        context: &Arc<SalesChannelContext>,
    ) -> Result<Vec<String>, AppError> {
        let mut tags = traced;
        tags.push(name.to_string());
        tags.push(ALL_TAG.to_string());

        let mut event = NotFoundPageTagsEvent {
            tags,
            request: request.clone(),
            context: context.clone(),
        };
        if let Some(hooks) = self.hooks.upgrade() {
            hooks.dispatch(&mut event).await?;
        }
        Ok(normalize_tags(event.tags))
    }
}

#[async_trait]
impl EventHandler<ExceptionEvent> for NotFoundSubscriber {
    async fn handle(&self, event: &mut ExceptionEvent) -> Result<(), AppError> {
        self.on_error(event).await
    }
}

#[async_trait]
impl EventHandler<SystemConfigChangedEvent> for NotFoundSubscriber {
    async fn handle(&self, event: &mut SystemConfigChangedEvent) -> Result<(), AppError> {
        self.on_system_config_changed(event);
        Ok(())
    }
}
