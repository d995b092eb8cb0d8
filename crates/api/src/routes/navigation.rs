//! Navigation placeholders

use agent::tools::{
    localization_tool, object_memory_tool, route_planning_tool, LocalizationReport, ObjectMemoryReport,
    RoutePlan,
};
use axum::{extract::State, Json};
use serde::Deserialize;

use crate::{ApiError, ApiResult, SharedState};

pub async fn get_location() -> Json<LocalizationReport> {
    Json(localization_tool())
}

#[derive(Debug, Deserialize)]
pub struct RouteRequest {
    #[serde(default)]
    pub start: Option<String>,
    pub destination: String,
}

pub async fn post_route(Json(request): Json<RouteRequest>) -> ApiResult<Json<RoutePlan>> {
    if request.destination.trim().is_empty() {
        return Err(ApiError::BadRequest("destination must not be empty".to_string()));
    }
    let start = request.start.as_deref().unwrap_or("current location");
    Ok(Json(route_planning_tool(start, &request.destination)))
}

/// Objects of the latest scene as they would be remembered
pub async fn get_memory(State(state): State<SharedState>) -> Json<ObjectMemoryReport> {
    let state = state.read().await;
    let objects = state
        .latest
        .as_ref()
        .map(|latest| latest.analysis.scene.objects.as_slice())
        .unwrap_or_default();
    Json(object_memory_tool(objects))
}
