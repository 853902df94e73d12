use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    application::repos::{RepoError, SalesChannelRepo},
    domain::{
        context::TaxState,
        sales_channel::{EntryPoints, SalesChannelDomainRecord, SalesChannelRecord},
    },
};

use super::{PostgresRepositories, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct SalesChannelRow {
    id: Uuid,
    name: String,
    language_id: Uuid,
    currency_id: Uuid,
    customer_group_id: Uuid,
    country_id: Uuid,
    tax_state: String,
    navigation_category_id: Uuid,
    footer_category_id: Option<Uuid>,
    service_category_id: Option<Uuid>,
}

impl TryFrom<SalesChannelRow> for SalesChannelRecord {
    type Error = RepoError;

    fn try_from(row: SalesChannelRow) -> Result<Self, Self::Error> {
        let tax_state: TaxState = row.tax_state.parse().map_err(|err| RepoError::Integrity {
            message: format!("sales channel `{}`: {err}", row.id),
        })?;

        Ok(Self {
            id: row.id,
            name: row.name,
            language_id: row.language_id,
            currency_id: row.currency_id,
            customer_group_id: row.customer_group_id,
            country_id: row.country_id,
            tax_state,
            entry_points: EntryPoints {
                navigation_category_id: row.navigation_category_id,
                footer_category_id: row.footer_category_id,
                service_category_id: row.service_category_id,
            },
        })
    }
}

#[derive(sqlx::FromRow)]
struct SalesChannelDomainRow {
    id: Uuid,
    sales_channel_id: Uuid,
    url: String,
    language_id: Uuid,
    currency_id: Uuid,
}

impl From<SalesChannelDomainRow> for SalesChannelDomainRecord {
    fn from(row: SalesChannelDomainRow) -> Self {
        Self {
            id: row.id,
            sales_channel_id: row.sales_channel_id,
            url: row.url,
            language_id: row.language_id,
            currency_id: row.currency_id,
        }
    }
}

#[async_trait]
impl SalesChannelRepo for PostgresRepositories {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<SalesChannelRecord>, RepoError> {
        let row = sqlx::query_as::<_, SalesChannelRow>(
            r#"
            SELECT id,
                   name,
                   language_id,
                   currency_id,
                   customer_group_id,
                   country_id,
                   tax_state,
                   navigation_category_id,
                   footer_category_id,
                   service_category_id
            FROM sales_channel
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        row.map(SalesChannelRecord::try_from).transpose()
    }

    async fn find_domain_by_host(
        &self,
        host: &str,
    ) -> Result<Option<SalesChannelDomainRecord>, RepoError> {
        let row = sqlx::query_as::<_, SalesChannelDomainRow>(
            r#"
            SELECT id, sales_channel_id, url, language_id, currency_id
            FROM sales_channel_domain
            WHERE host = lower($1)
            ORDER BY url
            LIMIT 1
            "#,
        )
        .bind(host)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(Into::into))
    }

    async fn language_ids(&self, sales_channel_id: Uuid) -> Result<Vec<Uuid>, RepoError> {
        sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT language_id FROM sales_channel WHERE id = $1
            UNION
            SELECT language_id FROM sales_channel_domain WHERE sales_channel_id = $1
            UNION
            SELECT language_id FROM sales_channel_language WHERE sales_channel_id = $1
            "#,
        )
        .bind(sales_channel_id)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)
    }

    async fn update_entry_points(
        &self,
        id: Uuid,
        entry_points: &EntryPoints,
    ) -> Result<(), RepoError> {
        let result = sqlx::query(
            r#"
            UPDATE sales_channel
            SET navigation_category_id = $2,
                footer_category_id = $3,
                service_category_id = $4,
                updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(entry_points.navigation_category_id)
        .bind(entry_points.footer_category_id)
        .bind(entry_points.service_category_id)
        .execute(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}
