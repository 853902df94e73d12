use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

use crate::application::repos::{RepoError, SystemConfigRepo};

use super::{PostgresRepositories, map_sqlx_error};

#[async_trait]
impl SystemConfigRepo for PostgresRepositories {
    async fn get(
        &self,
        key: &str,
        sales_channel_id: Option<Uuid>,
    ) -> Result<Option<Value>, RepoError> {
        // Channel-scoped rows sort before the global row.
        sqlx::query_scalar::<_, Value>(
            r#"
            SELECT configuration_value
            FROM system_config
            WHERE configuration_key = $1
              AND (sales_channel_id = $2 OR sales_channel_id IS NULL)
            ORDER BY sales_channel_id NULLS LAST
            LIMIT 1
            "#,
        )
        .bind(key)
        .bind(sales_channel_id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)
    }

    async fn set(
        &self,
        key: &str,
        value: &Value,
        sales_channel_id: Option<Uuid>,
    ) -> Result<(), RepoError> {
        sqlx::query(
            r#"
            INSERT INTO system_config (configuration_key, configuration_value, sales_channel_id)
            VALUES ($1, $2, $3)
            ON CONFLICT (configuration_key, sales_channel_id)
            DO UPDATE SET configuration_value = EXCLUDED.configuration_value,
                          updated_at = now()
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(sales_channel_id)
        .execute(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }
}
