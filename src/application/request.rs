//! Storefront request as seen by the error-page subsystem.

use std::sync::Arc;

use axum::http::HeaderMap;
use uuid::Uuid;

use crate::domain::context::SalesChannelContext;

/// Header carrying an explicit language choice.
pub const LANGUAGE_HEADER: &str = "sw-language-id";

/// Values the storefront routing layer resolved for a request.
#[derive(Debug, Clone, Default)]
pub struct RequestAttributes {
    pub sales_channel_id: Option<Uuid>,
    pub domain_id: Option<Uuid>,
    pub language_id: Option<Uuid>,
    pub domain_currency_id: Option<Uuid>,
    /// Internal store-API call proxied through the storefront.
    pub store_api_proxy: bool,
    pub context: Option<Arc<SalesChannelContext>>,
}

#[derive(Debug, Clone, Default)]
pub struct StorefrontRequest {
    pub path: String,
    pub headers: HeaderMap,
    pub attributes: RequestAttributes,
}

impl StorefrontRequest {
    pub fn new(path: impl Into<String>, headers: HeaderMap, attributes: RequestAttributes) -> Self {
        Self {
            path: path.into(),
            headers,
            attributes,
        }
    }

    /// Language the routing layer resolved, else the language header.
    ///
    /// The routing layer only honors header languages the sales channel
    /// offers, so an arbitrary header cannot select an unknown language.
    pub fn language_id(&self) -> Option<Uuid> {
        self.attributes.language_id.or_else(|| self.header_language_id())
    }

    pub fn header_language_id(&self) -> Option<Uuid> {
        language_from_headers(&self.headers)
    }
}

/// Language id sent in the language header, if it parses.
pub fn language_from_headers(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get(LANGUAGE_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| Uuid::parse_str(value.trim()).ok())
}
