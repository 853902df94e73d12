use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    extract::State,
    http::{HeaderMap, Request, header::HOST},
    middleware::{self, Next},
    response::{Html, IntoResponse, Response},
    routing::get,
};
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::application::{
    error::{AppError, ErrorReport, HttpError},
    error_page::StorefrontException,
    events::EventBus,
    not_found::ExceptionEvent,
    repos::SalesChannelRepo,
    request::{RequestAttributes, StorefrontRequest, language_from_headers},
};

use super::{
    STORE_API_PROXY_PREFIX,
    middleware::{ResolvedSalesChannel, log_responses, set_request_context},
};

const SOURCE: &str = "infra::http::storefront";

#[derive(Clone)]
pub struct StorefrontState {
    pub bus: Arc<EventBus>,
    pub sales_channels: Arc<dyn SalesChannelRepo>,
}

pub fn build_storefront_router(state: StorefrontState) -> Router {
    Router::new()
        .route("/", get(home))
        .route(&format!("{STORE_API_PROXY_PREFIX}/{{*path}}"), get(store_api_proxy))
        .fallback(fallback)
        .layer(middleware::from_fn_with_state(state.clone(), error_page_layer))
        .layer(middleware::from_fn_with_state(state, resolve_sales_channel))
        .layer(middleware::from_fn(log_responses))
        .layer(middleware::from_fn(set_request_context))
}

/// Attach the sales channel bound to the request host.
///
/// Requests for unknown hosts continue without attributes.
#[instrument(skip_all, fields(path = %request.uri().path()))]
pub async fn resolve_sales_channel(
    State(state): State<StorefrontState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let Some(host) = request_host(&request) else {
        return next.run(request).await;
    };

    let domain = match state.sales_channels.find_domain_by_host(&host).await {
        Ok(domain) => domain,
        Err(err) => return AppError::from(err).into_response(),
    };
    let Some(domain) = domain else {
        debug!(host = %host, "No sales channel domain for host");
        return next.run(request).await;
    };

    let offered = offered_header_language(&state, request.headers(), domain.sales_channel_id).await;
    let language_id = match offered {
        Ok(language) => language.unwrap_or(domain.language_id),
        Err(err) => return err.into_response(),
    };

    let attributes = RequestAttributes {
        sales_channel_id: Some(domain.sales_channel_id),
        domain_id: Some(domain.id),
        language_id: Some(language_id),
        domain_currency_id: Some(domain.currency_id),
        store_api_proxy: request.uri().path().starts_with(STORE_API_PROXY_PREFIX),
        context: None,
    };

    request.extensions_mut().insert(attributes);
    let mut response = next.run(request).await;
    response
        .extensions_mut()
        .insert(ResolvedSalesChannel(domain.sales_channel_id));
    response
}

/// Turn failed storefront responses into error pages.
///
/// Only responses carrying an [`ErrorReport`] for a resolved sales channel
/// are handed to the exception handlers; everything else passes through.
pub async fn error_page_layer(
    State(state): State<StorefrontState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let Some(attributes) = request.extensions().get::<RequestAttributes>().cloned() else {
        return next.run(request).await;
    };
    let storefront_request =
        StorefrontRequest::new(request.uri().path(), request.headers().clone(), attributes);

    let response = next.run(request).await;
    let status = response.status();
    if !(status.is_client_error() || status.is_server_error()) {
        return response;
    }
    let Some(report) = response.extensions().get::<ErrorReport>().cloned() else {
        return response;
    };

    let exception = StorefrontException::http(status, report.headline());
    let mut event = ExceptionEvent::new(storefront_request, exception);
    if let Err(err) = state.bus.dispatch(&mut event).await {
        return err.into_response();
    }

    match event.take_response() {
        Some(page) => {
            let mut page = page.into_response();
            report.attach(&mut page);
            page
        }
        None => response,
    }
}

/// Header language, if the sales channel offers it.
async fn offered_header_language(
    state: &StorefrontState,
    headers: &HeaderMap,
    sales_channel_id: Uuid,
) -> Result<Option<Uuid>, AppError> {
    let Some(language_id) = language_from_headers(headers) else {
        return Ok(None);
    };

    let offered = state.sales_channels.language_ids(sales_channel_id).await?;
    if offered.contains(&language_id) {
        return Ok(Some(language_id));
    }

    debug!(
        sales_channel_id = %sales_channel_id,
        language_id = %language_id,
        "Ignoring language the sales channel does not offer"
    );
    Ok(None)
}

fn request_host(request: &Request<Body>) -> Option<String> {
    let host = request
        .headers()
        .get(HOST)
        .and_then(|value| value.to_str().ok())
        .or_else(|| request.uri().authority().map(|authority| authority.as_str()))?;
    let host = host.trim().to_ascii_lowercase();
    (!host.is_empty()).then_some(host)
}

async fn home(request: Request<Body>) -> Response {
    let sales_channel_id = request
        .extensions()
        .get::<RequestAttributes>()
        .and_then(|attributes| attributes.sales_channel_id);
    match sales_channel_id {
        Some(id) => Html(format!(
            "<!DOCTYPE html><html><body><main data-sales-channel=\"{}\">Welcome</main></body></html>",
            id.simple()
        ))
        .into_response(),
        None => HttpError::not_found(SOURCE, "no sales channel bound to host").into_response(),
    }
}

async fn store_api_proxy(request: Request<Body>) -> Response {
    HttpError::not_found(
        SOURCE,
        format!("no store-api route for {}", request.uri().path()),
    )
    .into_response()
}

async fn fallback(request: Request<Body>) -> Response {
    HttpError::not_found(SOURCE, format!("no route for {}", request.uri().path())).into_response()
}
