//! Domain types shared by the storefront cache and the SEO propagation layer.

pub mod category;
pub mod context;
pub mod error;
pub mod events;
pub mod sales_channel;
