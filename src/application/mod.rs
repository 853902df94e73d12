//! Application services layer.

pub mod context;
pub mod error;
pub mod error_page;
pub mod events;
pub mod info;
pub mod not_found;
pub mod repos;
pub mod request;
pub mod sales_channels;
pub mod seo;
pub mod system_config;
