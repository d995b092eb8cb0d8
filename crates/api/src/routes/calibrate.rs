//! Distance calibration

use axum::{extract::State, Json};
use perception::{BoundingBox, CameraCalibration};
use serde::Deserialize;

use crate::{ApiResult, SharedState};

#[derive(Debug, Deserialize)]
pub struct CalibrateRequest {
    /// `[x1, y1, x2, y2]` of the reference object
    pub bbox: BoundingBox,
    pub class_name: String,
    pub known_distance_m: f64,
}

pub async fn post_calibrate(
    State(state): State<SharedState>,
    Json(request): Json<CalibrateRequest>,
) -> ApiResult<Json<CameraCalibration>> {
    let mut state = state.write().await;
    let calibration =
        state
            .perception
            .calibrate(&request.bbox, &request.class_name, request.known_distance_m)?;
    Ok(Json(calibration))
}
