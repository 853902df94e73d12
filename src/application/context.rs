//! Sales-channel context resolution.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::domain::context::{ContextParameters, LIVE_VERSION_ID, SalesChannelContext};

use super::{error::AppError, repos::SalesChannelRepo};

#[async_trait]
pub trait ContextResolver: Send + Sync {
    async fn resolve(&self, params: ContextParameters) -> Result<SalesChannelContext, AppError>;
}

/// Builds contexts from the persisted sales-channel defaults.
#[derive(Clone)]
pub struct SalesChannelContextService {
    sales_channels: Arc<dyn SalesChannelRepo>,
}

impl SalesChannelContextService {
    pub fn new(sales_channels: Arc<dyn SalesChannelRepo>) -> Self {
        Self { sales_channels }
    }
}

#[async_trait]
impl ContextResolver for SalesChannelContextService {
    async fn resolve(&self, params: ContextParameters) -> Result<SalesChannelContext, AppError> {
        let channel = self
            .sales_channels
            .find_by_id(params.sales_channel_id)
            .await?
            .ok_or_else(|| {
                AppError::context_resolution(format!(
                    "unknown sales channel `{}`",
                    params.sales_channel_id
                ))
            })?;

        let language_id = params.language_id.unwrap_or(channel.language_id);
        let mut language_chain = vec![language_id];
        if language_id != channel.language_id {
            language_chain.push(channel.language_id);
        }

        debug!(
            sales_channel_id = %channel.id,
            language_id = %language_id,
            "Resolved sales channel context"
        );

        Ok(SalesChannelContext {
            token: params.token,
            sales_channel_id: channel.id,
            domain_id: params.domain_id,
            language_id,
            language_chain,
            currency_id: params.currency_id.unwrap_or(channel.currency_id),
            customer_group_id: channel.customer_group_id,
            country_id: channel.country_id,
            tax_state: channel.tax_state,
            rule_ids: Vec::new(),
            version_id: LIVE_VERSION_ID,
        })
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;
    use crate::application::repos::RepoError;
    use crate::domain::context::TaxState;
    use crate::domain::sales_channel::{EntryPoints, SalesChannelDomainRecord, SalesChannelRecord};

    struct OneChannel(SalesChannelRecord);

    #[async_trait]
    impl SalesChannelRepo for OneChannel {
        async fn find_by_id(&self, id: Uuid) -> Result<Option<SalesChannelRecord>, RepoError> {
            Ok((id == self.0.id).then(|| self.0.clone()))
        }

        async fn find_domain_by_host(
            &self,
            _host: &str,
        ) -> Result<Option<SalesChannelDomainRecord>, RepoError> {
            Ok(None)
        }

        async fn language_ids(&self, _sales_channel_id: Uuid) -> Result<Vec<Uuid>, RepoError> {
            Ok(vec![self.0.language_id])
        }

        async fn update_entry_points(
            &self,
            _id: Uuid,
            _entry_points: &EntryPoints,
        ) -> Result<(), RepoError> {
            Ok(())
        }
    }

    fn channel() -> SalesChannelRecord {
        SalesChannelRecord {
            id: Uuid::from_u128(1),
            name: "Storefront".into(),
            language_id: Uuid::from_u128(10),
            currency_id: Uuid::from_u128(20),
            customer_group_id: Uuid::from_u128(30),
            country_id: Uuid::from_u128(40),
            tax_state: TaxState::Gross,
            entry_points: EntryPoints {
                navigation_category_id: Uuid::from_u128(50),
                footer_category_id: None,
                service_category_id: None,
            },
        }
    }

    #[tokio::test]
    async fn overrides_language_and_currency() {
        let service = SalesChannelContextService::new(Arc::new(OneChannel(channel())));
        let params = ContextParameters::with_random_token(
            Uuid::from_u128(1),
            Some(Uuid::from_u128(11)),
            Some(Uuid::from_u128(21)),
            Some(Uuid::from_u128(99)),
        );

        let context = service.resolve(params).await.expect("context");
        assert_eq!(context.language_id, Uuid::from_u128(11));
        assert_eq!(
            context.language_chain,
            vec![Uuid::from_u128(11), Uuid::from_u128(10)]
        );
        assert_eq!(context.currency_id, Uuid::from_u128(21));
        assert_eq!(context.domain_id, Some(Uuid::from_u128(99)));
        assert_eq!(context.version_id, LIVE_VERSION_ID);
    }

    #[tokio::test]
    async fn defaults_come_from_the_channel() {
        let service = SalesChannelContextService::new(Arc::new(OneChannel(channel())));
        let params = ContextParameters::with_random_token(Uuid::from_u128(1), None, None, None);

        let context = service.resolve(params).await.expect("context");
        assert_eq!(context.language_chain, vec![Uuid::from_u128(10)]);
        assert_eq!(context.currency_id, Uuid::from_u128(20));
    }

    #[tokio::test]
    async fn unknown_channel_fails() {
        let service = SalesChannelContextService::new(Arc::new(OneChannel(channel())));
        let params = ContextParameters::with_random_token(Uuid::from_u128(2), None, None, None);

        let err = service.resolve(params).await.expect_err("unknown channel");
        assert!(matches!(err, AppError::ContextResolution(_)));
    }
}
