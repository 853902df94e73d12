use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, patch, post},
};
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::{
    application::{
        error::AppError, info::InfoService, sales_channels::SalesChannelWriteService,
        system_config::SystemConfigService,
    },
    domain::sales_channel::EntryPointsUpdate,
};

use super::middleware::{log_responses, set_request_context};

#[derive(Clone)]
pub struct AdminState {
    pub system_config: Arc<SystemConfigService>,
    pub sales_channels: Arc<SalesChannelWriteService>,
    pub info: Arc<InfoService>,
}

pub fn build_admin_router(state: AdminState) -> Router {
    Router::new()
        .route("/api/_action/system-config", post(save_system_config))
        .route("/api/sales-channel/{id}", patch(update_sales_channel))
        .route("/api/_info/version", get(version))
        .route("/api/_info/flow-actions.json", get(flow_actions))
        .with_state(state)
        .layer(middleware::from_fn(log_responses))
        .layer(middleware::from_fn(set_request_context))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct SystemConfigScope {
    sales_channel_id: Option<Uuid>,
}

async fn save_system_config(
    State(state): State<AdminState>,
    Query(scope): Query<SystemConfigScope>,
    Json(values): Json<Map<String, Value>>,
) -> Result<StatusCode, AppError> {
    for (key, value) in values {
        state
            .system_config
            .set(&key, value, scope.sales_channel_id)
            .await?;
    }
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct SalesChannelPatch {
    navigation_category_id: Option<Uuid>,
    #[serde(deserialize_with = "present")]
    footer_category_id: Option<Option<Uuid>>,
    #[serde(deserialize_with = "present")]
    service_category_id: Option<Option<Uuid>>,
}

/// Tell an explicit `null` (`Some(None)`) apart from an absent field (`None`).
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

async fn update_sales_channel(
    State(state): State<AdminState>,
    Path(id): Path<Uuid>,
    Json(patch): Json<SalesChannelPatch>,
) -> Result<StatusCode, AppError> {
    state
        .sales_channels
        .update_entry_points(
            id,
            EntryPointsUpdate {
                navigation_category_id: patch.navigation_category_id,
                footer_category_id: patch.footer_category_id,
                service_category_id: patch.service_category_id,
            },
        )
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn version(State(state): State<AdminState>) -> Response {
    Json(state.info.version()).into_response()
}

async fn flow_actions(State(state): State<AdminState>) -> Result<Response, AppError> {
    let actions = state.info.flow_actions().await?;
    Ok(Json(actions).into_response())
}
