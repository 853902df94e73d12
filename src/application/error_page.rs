//! Error page rendering for storefront requests.

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use serde_json::Value;
use tracing::debug;

use crate::{
    cache::tracer,
    domain::context::SalesChannelContext,
    presentation::views::{ErrorPageTemplate, ErrorPageView, render_template},
};

use super::{error::AppError, repos::SystemConfigRepo, request::StorefrontRequest};

/// System config key holding the shop page shown for missing pages.
pub const NOT_FOUND_PAGE_CONFIG_KEY: &str = "core.basicInformation.http404Page";

/// A failure raised while handling a storefront request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorefrontException {
    /// `None` for failures that did not carry an HTTP status.
    pub status: Option<StatusCode>,
    pub message: String,
}

impl StorefrontException {
    pub fn http(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        self.status.unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    pub fn is_not_found(&self) -> bool {
        self.status == Some(StatusCode::NOT_FOUND)
    }
}

/// Data the renderer used to build the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorPageData {
    pub cms_page_id: Option<String>,
}

/// Rendered page together with the request-bound data it was built from.
#[derive(Debug, Clone)]
pub struct StorefrontResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
    pub data: Option<ErrorPageData>,
    pub context: Option<Arc<SalesChannelContext>>,
}

impl StorefrontResponse {
    /// Drop the page data and context so the response can be shared.
    pub fn strip_transient(self) -> CachedErrorResponse {
        CachedErrorResponse {
            status: self.status,
            headers: self.headers,
            body: self.body,
        }
    }
}

/// Error page as stored in and served from the cache.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedErrorResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl IntoResponse for CachedErrorResponse {
    fn into_response(self) -> Response {
        let mut response = (self.status, self.body).into_response();
        response.headers_mut().extend(self.headers);
        response
    }
}

#[async_trait]
pub trait ErrorRenderer: Send + Sync {
    async fn render(
        &self,
        exception: &StorefrontException,
        request: &StorefrontRequest,
        context: &Arc<SalesChannelContext>,
    ) -> Result<StorefrontResponse, AppError>;
}

/// Renders error pages with the configured missing-page reference.
#[derive(Clone)]
pub struct ErrorPageService {
    system_config: Arc<dyn SystemConfigRepo>,
}

impl ErrorPageService {
    pub fn new(system_config: Arc<dyn SystemConfigRepo>) -> Self {
        Self { system_config }
    }

    async fn configured_not_found_page(
        &self,
        context: &SalesChannelContext,
    ) -> Result<Option<String>, AppError> {
        tracer::record("system-config");
        tracer::record(format!("config.{NOT_FOUND_PAGE_CONFIG_KEY}"));
        tracer::record(format!("sales-channel-{}", context.sales_channel_id.simple()));

        let value = self
            .system_config
            .get(NOT_FOUND_PAGE_CONFIG_KEY, Some(context.sales_channel_id))
            .await?;

        Ok(match value {
            Some(Value::String(id)) if !id.is_empty() => Some(id),
            _ => None,
        })
    }
}

#[async_trait]
impl ErrorRenderer for ErrorPageService {
    async fn render(
        &self,
        exception: &StorefrontException,
        request: &StorefrontRequest,
        context: &Arc<SalesChannelContext>,
    ) -> Result<StorefrontResponse, AppError> {
        let status = exception.status_code();
        let view = if exception.is_not_found() {
            ErrorPageView::not_found(self.configured_not_found_page(context).await?)
        } else {
            ErrorPageView::server_error(status.as_u16())
        };
        let data = ErrorPageData {
            cms_page_id: view.cms_page_id.clone(),
        };

        debug!(
            path = %request.path,
            status = status.as_u16(),
            "Rendering storefront error page"
        );

        let html = render_template(ErrorPageTemplate { view })
            .map_err(|err| AppError::render(err.error.to_string()))?;

        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/html; charset=utf-8"),
        );

        Ok(StorefrontResponse {
            status,
            headers,
            body: Bytes::from(html),
            data: Some(data),
            context: Some(context.clone()),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use uuid::Uuid;

    use super::*;
    use crate::application::repos::RepoError;
    use crate::cache::CacheTracer;
    use crate::domain::context::{LIVE_VERSION_ID, TaxState};

    #[derive(Default)]
    struct MemoryConfig(Mutex<HashMap<String, Value>>);

    #[async_trait]
    impl SystemConfigRepo for MemoryConfig {
        async fn get(
            &self,
            key: &str,
            _sales_channel_id: Option<Uuid>,
        ) -> Result<Option<Value>, RepoError> {
            Ok(self.0.lock().unwrap().get(key).cloned())
        }

        async fn set(
            &self,
            key: &str,
            value: &Value,
            _sales_channel_id: Option<Uuid>,
        ) -> Result<(), RepoError> {
            self.0.lock().unwrap().insert(key.to_string(), value.clone());
            Ok(())
        }
    }

    fn context() -> Arc<SalesChannelContext> {
        Arc::new(SalesChannelContext {
            token: "token".into(),
            sales_channel_id: Uuid::from_u128(1),
            domain_id: None,
            language_id: Uuid::from_u128(2),
            language_chain: vec![Uuid::from_u128(2)],
            currency_id: Uuid::from_u128(3),
            customer_group_id: Uuid::from_u128(4),
            country_id: Uuid::from_u128(5),
            tax_state: TaxState::Gross,
            rule_ids: Vec::new(),
            version_id: LIVE_VERSION_ID,
        })
    }

    #[tokio::test]
    async fn not_found_page_records_config_tags() {
        let config = Arc::new(MemoryConfig::default());
        config
            .set(NOT_FOUND_PAGE_CONFIG_KEY, &Value::from("cms-404"), None)
            .await
            .unwrap();
        let service = ErrorPageService::new(config);
        let tracer = CacheTracer::new();
        let exception = StorefrontException::http(StatusCode::NOT_FOUND, "no route");

        let response = tracer
            .trace("page", service.render(&exception, &StorefrontRequest::default(), &context()))
            .await
            .expect("render");

        assert_eq!(response.status, StatusCode::NOT_FOUND);
        assert_eq!(
            response.data,
            Some(ErrorPageData {
                cms_page_id: Some("cms-404".into())
            })
        );
        assert_eq!(
            tracer.get("page"),
            vec![
                "system-config".to_string(),
                "config.core.basicInformation.http404Page".to_string(),
                format!("sales-channel-{}", Uuid::from_u128(1).simple()),
            ]
        );
    }

    #[tokio::test]
    async fn other_errors_render_without_config_lookup() {
        let service = ErrorPageService::new(Arc::new(MemoryConfig::default()));
        let tracer = CacheTracer::new();
        let exception = StorefrontException::internal("database down");

        let response = tracer
            .trace("page", service.render(&exception, &StorefrontRequest::default(), &context()))
            .await
            .expect("render");

        assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(tracer.get("page").is_empty());
        assert_eq!(
            response.headers.get(header::CONTENT_TYPE).unwrap(),
            "text/html; charset=utf-8"
        );
    }

    #[test]
    fn strip_transient_keeps_wire_fields() {
        let response = StorefrontResponse {
            status: StatusCode::NOT_FOUND,
            headers: HeaderMap::new(),
            body: Bytes::from_static(b"<html></html>"),
            data: Some(ErrorPageData { cms_page_id: None }),
            context: Some(context()),
        };

        let cached = response.strip_transient();
        assert_eq!(cached.status, StatusCode::NOT_FOUND);
        assert_eq!(cached.body, Bytes::from_static(b"<html></html>"));
    }
}
