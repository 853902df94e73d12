//! Outbox tables drained by the external SEO URL generator and indexers.

use async_trait::async_trait;
use uuid::Uuid;

use crate::application::repos::{IndexerRegistry, RepoError, SeoUrlUpdater};

use super::{PostgresRepositories, map_sqlx_error};

#[async_trait]
impl SeoUrlUpdater for PostgresRepositories {
    async fn update(&self, route_name: &str, ids: &[Uuid]) -> Result<(), RepoError> {
        sqlx::query("INSERT INTO seo_url_update_request (route_name, entity_ids) VALUES ($1, $2)")
            .bind(route_name)
            .bind(ids)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(())
    }
}

#[async_trait]
impl IndexerRegistry for PostgresRepositories {
    async fn send_indexing_message(&self, indexers: &[&str]) -> Result<(), RepoError> {
        let indexers: Vec<String> = indexers.iter().map(|name| (*name).to_string()).collect();

        sqlx::query("INSERT INTO indexing_message (indexer) SELECT unnest($1::text[])")
            .bind(&indexers)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(())
    }
}
