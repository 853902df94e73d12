mod admin;
mod middleware;
mod storefront;

pub use admin::{AdminState, build_admin_router};
pub use middleware::{
    REQUEST_ID_HEADER, RequestContext, ResolvedSalesChannel, log_responses, set_request_context,
};
pub use storefront::{
    StorefrontState, build_storefront_router, error_page_layer, resolve_sales_channel,
};

/// Path prefix of store-API calls proxied through the storefront.
pub const STORE_API_PROXY_PREFIX: &str = "/_proxy/store-api";
