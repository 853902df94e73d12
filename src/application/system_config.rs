//! System configuration writes.

use std::sync::Arc;

use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use crate::domain::{error::DomainError, events::SystemConfigChangedEvent};

use super::{error::AppError, events::EventBus, repos::SystemConfigRepo};

#[derive(Clone)]
pub struct SystemConfigService {
    repo: Arc<dyn SystemConfigRepo>,
    bus: Arc<EventBus>,
}

impl SystemConfigService {
    pub fn new(repo: Arc<dyn SystemConfigRepo>, bus: Arc<EventBus>) -> Self {
        Self { repo, bus }
    }

    pub async fn get(
        &self,
        key: &str,
        sales_channel_id: Option<Uuid>,
    ) -> Result<Option<Value>, AppError> {
        Ok(self.repo.get(key, sales_channel_id).await?)
    }

    /// Persist `value` and announce the change.
    pub async fn set(
        &self,
        key: &str,
        value: Value,
        sales_channel_id: Option<Uuid>,
    ) -> Result<(), AppError> {
        let key = key.trim();
        if key.is_empty() {
            return Err(DomainError::validation("config key must not be empty").into());
        }

        self.repo.set(key, &value, sales_channel_id).await?;
        info!(key, sales_channel_id = ?sales_channel_id, "System config updated");

        let mut event = SystemConfigChangedEvent {
            key: key.to_string(),
            value,
            sales_channel_id,
        };
        self.bus.dispatch(&mut event).await
    }
}
