//! Repository traits describing persistence adapters and outbound hand-offs.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::sales_channel::{EntryPoints, SalesChannelDomainRecord, SalesChannelRecord};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("integrity error: {message}")]
    Integrity { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

#[async_trait]
pub trait CategoryRepo: Send + Sync {
    /// Ids of non-link categories whose materialized path mentions any of `ids`.
    async fn find_descendant_ids(&self, ids: &[Uuid]) -> Result<Vec<Uuid>, RepoError>;
}

#[async_trait]
pub trait SalesChannelRepo: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<SalesChannelRecord>, RepoError>;

    /// Domain whose URL host (and optional port) equals `host`.
    async fn find_domain_by_host(
        &self,
        host: &str,
    ) -> Result<Option<SalesChannelDomainRecord>, RepoError>;

    /// Languages the sales channel offers: its default, its domains' and
    /// any additionally assigned ones.
    async fn language_ids(&self, sales_channel_id: Uuid) -> Result<Vec<Uuid>, RepoError>;

    async fn update_entry_points(
        &self,
        id: Uuid,
        entry_points: &EntryPoints,
    ) -> Result<(), RepoError>;
}

#[async_trait]
pub trait SystemConfigRepo: Send + Sync {
    /// Value for `key`, preferring the sales-channel scope over the global one.
    async fn get(&self, key: &str, sales_channel_id: Option<Uuid>)
    -> Result<Option<Value>, RepoError>;

    async fn set(
        &self,
        key: &str,
        value: &Value,
        sales_channel_id: Option<Uuid>,
    ) -> Result<(), RepoError>;
}

/// Hands SEO URL recomputation requests to the slug generator.
#[async_trait]
pub trait SeoUrlUpdater: Send + Sync {
    async fn update(&self, route_name: &str, ids: &[Uuid]) -> Result<(), RepoError>;
}

/// Queues full re-index runs for the named indexers.
#[async_trait]
pub trait IndexerRegistry: Send + Sync {
    async fn send_indexing_message(&self, indexers: &[&str]) -> Result<(), RepoError>;
}
