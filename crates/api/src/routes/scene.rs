//! Latest scene

use axum::{extract::State, Json};
use perception::{BoundingBox, SafetyLevel, SceneRecord};
use serde::Serialize;

use crate::{ApiError, ApiResult, SharedState};

fn no_scene() -> ApiError {
    ApiError::NotFound("no frame has been processed yet".to_string())
}

pub async fn get_scene(State(state): State<SharedState>) -> ApiResult<Json<SceneRecord>> {
    let state = state.read().await;
    state
        .latest
        .as_ref()
        .map(|latest| Json(latest.analysis.scene.clone()))
        .ok_or_else(no_scene)
}

/// One colored box for a client-side overlay
#[derive(Debug, Serialize)]
pub struct OverlayBand {
    pub class_name: String,
    pub bounding_box: BoundingBox,
    pub distance_m: f64,
    pub safety_level: SafetyLevel,
    pub color_bgr: [u8; 3],
}

/// Boxes of the latest scene, nearest first, colored by safety tier
pub async fn get_overlay(State(state): State<SharedState>) -> ApiResult<Json<Vec<OverlayBand>>> {
    let state = state.read().await;
    let latest = state.latest.as_ref().ok_or_else(no_scene)?;

    let bands = latest
        .analysis
        .scene
        .objects
        .iter()
        .map(|d| OverlayBand {
            class_name: d.class_name.clone(),
            bounding_box: d.bounding_box,
            distance_m: d.distance_m,
            safety_level: d.safety_level,
            color_bgr: d.safety_level.color_bgr(),
        })
        .collect();
    Ok(Json(bands))
}
