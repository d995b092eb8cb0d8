//! Frame upload

use axum::{body::Bytes, extract::State, Json};
use camera_capture::VideoFrame;
use chrono::Utc;
use perception::SceneRecord;

use crate::{ingest_frame, ApiResult, SharedState};

/// Decode an uploaded JPEG/PNG, run perception and return the scene
pub async fn post_frame(State(state): State<SharedState>, body: Bytes) -> ApiResult<Json<SceneRecord>> {
    let timestamp_ns = Utc::now()
        .timestamp_nanos_opt()
        .map(|ns| ns.max(0) as u64)
        .unwrap_or(0);
    // Sequence is assigned once the frame is admitted
    let frame = VideoFrame::decode(&body, timestamp_ns, 0)?;

    let analysis = ingest_frame(&state, frame).await?;
    Ok(Json(analysis.scene))
}
