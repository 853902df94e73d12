//! Events raised by writes, configuration changes and entity indexers.

use std::collections::BTreeSet;

use serde_json::{Map, Value};
use uuid::Uuid;

/// A system configuration value was written.
#[derive(Debug, Clone, PartialEq)]
pub struct SystemConfigChangedEvent {
    pub key: String,
    pub value: Value,
    /// `None` for the global scope.
    pub sales_channel_id: Option<Uuid>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOperation {
    Insert,
    Update,
    Delete,
}

/// Outcome of writing a single entity row.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityWriteResult {
    pub entity_name: String,
    pub primary_key: Uuid,
    pub operation: WriteOperation,
    /// Written properties keyed by their API name.
    pub payload: Map<String, Value>,
}

/// Every row touched by one write transaction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityWrittenContainerEvent {
    pub results: Vec<EntityWriteResult>,
}

impl EntityWrittenContainerEvent {
    pub fn new(results: Vec<EntityWriteResult>) -> Self {
        Self { results }
    }

    /// Primary keys of `entity_name` rows whose payload contains any of
    /// `properties`. Each key is reported once, in write order.
    pub fn primary_keys_with_property_change(
        &self,
        entity_name: &str,
        properties: &[&str],
    ) -> Vec<Uuid> {
        let mut keys = Vec::new();
        for result in &self.results {
            if result.entity_name != entity_name || keys.contains(&result.primary_key) {
                continue;
            }
            if properties
                .iter()
                .any(|property| result.payload.contains_key(*property))
            {
                keys.push(result.primary_key);
            }
        }
        keys
    }
}

/// Ids refreshed by one indexer run plus the follow-up updaters to skip.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexedEntities {
    pub ids: Vec<Uuid>,
    pub skip: BTreeSet<String>,
}

impl IndexedEntities {
    pub fn new(ids: Vec<Uuid>) -> Self {
        Self {
            ids,
            skip: BTreeSet::new(),
        }
    }

    pub fn skipping(mut self, updater: impl Into<String>) -> Self {
        self.skip.insert(updater.into());
        self
    }

    pub fn skips(&self, updater: &str) -> bool {
        self.skip.contains(updater)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductIndexerEvent(pub IndexedEntities);

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryIndexerEvent(pub IndexedEntities);

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LandingPageIndexerEvent(pub IndexedEntities);

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn write(entity: &str, id: u128, payload: Value) -> EntityWriteResult {
        EntityWriteResult {
            entity_name: entity.to_string(),
            primary_key: Uuid::from_u128(id),
            operation: WriteOperation::Update,
            payload: payload.as_object().cloned().unwrap_or_default(),
        }
    }

    #[test]
    fn property_change_filters_by_entity_and_property() {
        let event = EntityWrittenContainerEvent::new(vec![
            write("sales_channel", 1, json!({ "navigationCategoryId": "x" })),
            write("sales_channel", 2, json!({ "name": "Outlet" })),
            write("category", 3, json!({ "navigationCategoryId": "x" })),
        ]);

        let keys = event.primary_keys_with_property_change(
            "sales_channel",
            &["navigationCategoryId", "footerCategoryId"],
        );
        assert_eq!(keys, vec![Uuid::from_u128(1)]);
    }

    #[test]
    fn property_change_reports_each_key_once() {
        let event = EntityWrittenContainerEvent::new(vec![
            write("sales_channel", 1, json!({ "footerCategoryId": "a" })),
            write("sales_channel", 1, json!({ "serviceCategoryId": "b" })),
        ]);

        let keys = event.primary_keys_with_property_change(
            "sales_channel",
            &["footerCategoryId", "serviceCategoryId"],
        );
        assert_eq!(keys.len(), 1);
    }

    #[test]
    fn skip_marker_is_exact_match() {
        let entities = IndexedEntities::new(vec![]).skipping("category.seo-url");
        assert!(entities.skips("category.seo-url"));
        assert!(!entities.skips("product.seo-url"));
    }
}
