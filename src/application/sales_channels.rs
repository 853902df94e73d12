//! Sales-channel entry point writes.

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::info;
use uuid::Uuid;

use crate::domain::{
    error::DomainError,
    events::{EntityWriteResult, EntityWrittenContainerEvent, WriteOperation},
    sales_channel::{EntryPoints, EntryPointsUpdate, SALES_CHANNEL_ENTITY},
};

use super::{error::AppError, events::EventBus, repos::SalesChannelRepo};

#[derive(Clone)]
pub struct SalesChannelWriteService {
    repo: Arc<dyn SalesChannelRepo>,
    bus: Arc<EventBus>,
}

impl SalesChannelWriteService {
    pub fn new(repo: Arc<dyn SalesChannelRepo>, bus: Arc<EventBus>) -> Self {
        Self { repo, bus }
    }

    /// Apply `update` and announce the changed properties.
    ///
    /// Updates that change nothing are neither written nor announced.
    pub async fn update_entry_points(
        &self,
        id: Uuid,
        update: EntryPointsUpdate,
    ) -> Result<EntryPoints, AppError> {
        let channel = self
            .repo
            .find_by_id(id)
            .await?
            .ok_or(DomainError::not_found("sales channel"))?;

        let mut entry_points = channel.entry_points;
        let changed = entry_points.apply(&update);
        if changed.is_empty() {
            return Ok(entry_points);
        }

        self.repo.update_entry_points(id, &entry_points).await?;
        info!(sales_channel_id = %id, changed = ?changed, "Sales channel entry points updated");

        let payload: Map<String, Value> = changed
            .iter()
            .map(|property| {
                let value = entry_points
                    .value_of(property)
                    .map_or(Value::Null, |id| Value::String(id.simple().to_string()));
                ((*property).to_string(), value)
            })
            .collect();

        let mut event = EntityWrittenContainerEvent::new(vec![EntityWriteResult {
            entity_name: SALES_CHANNEL_ENTITY.to_string(),
            primary_key: id,
            operation: WriteOperation::Update,
            payload,
        }]);
        self.bus.dispatch(&mut event).await?;

        Ok(entry_points)
    }
}
