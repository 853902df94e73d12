//! Administration info endpoints.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use super::error::AppError;

/// A flow action available to automation rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlowActionDefinition {
    pub name: String,
    pub requirements: Vec<String>,
    pub extensions: Vec<String>,
}

#[async_trait]
pub trait FlowActionCollector: Send + Sync {
    async fn collect(&self) -> Result<Vec<FlowActionDefinition>, AppError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionInfo {
    pub version: String,
}

#[derive(Clone)]
pub struct InfoService {
    version: String,
    flow_actions: Option<Arc<dyn FlowActionCollector>>,
}

impl InfoService {
    pub fn new(version: impl Into<String>, flow_actions: Option<Arc<dyn FlowActionCollector>>) -> Self {
        Self {
            version: version.into(),
            flow_actions,
        }
    }

    pub fn version(&self) -> VersionInfo {
        VersionInfo {
            version: self.version.clone(),
        }
    }

    /// Flow actions of the configured collector; none without a collector.
    pub async fn flow_actions(&self) -> Result<Vec<FlowActionDefinition>, AppError> {
        match &self.flow_actions {
            Some(collector) => collector.collect().await,
            None => Ok(Vec::new()),
        }
    }
}
