use async_trait::async_trait;
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    application::repos::{CategoryRepo, RepoError},
    domain::category::CategoryType,
};

use super::{PostgresRepositories, map_sqlx_error};

/// `type <> 'link' AND path LIKE '%<id>%'` for every id, OR-ed together.
fn descendants_query(ids: &[Uuid]) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new("SELECT id FROM category WHERE ");
    for (index, id) in ids.iter().enumerate() {
        if index > 0 {
            qb.push(" OR ");
        }
        qb.push("(type <> ");
        qb.push_bind(CategoryType::Link.as_str());
        qb.push(" AND path LIKE ");
        qb.push_bind(format!("%{}%", id.simple()));
        qb.push(")");
    }
    qb
}

#[async_trait]
impl CategoryRepo for PostgresRepositories {
    async fn find_descendant_ids(&self, ids: &[Uuid]) -> Result<Vec<Uuid>, RepoError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut qb = descendants_query(ids);
        qb.build_query_scalar::<Uuid>()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)
    }
}
