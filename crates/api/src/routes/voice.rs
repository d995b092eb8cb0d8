//! Spoken queries

use agent::AgentResponse;
use axum::{body::Bytes, extract::State, Json};
use serde::Serialize;
use tracing::debug;

use super::query::answer;
use crate::{ApiError, ApiResult, SharedState};

#[derive(Debug, Serialize)]
pub struct VoiceResponse {
    pub transcript: String,
    pub response: AgentResponse,
}

/// Transcribe WAV audio and handle it as a query
pub async fn post_voice(State(state): State<SharedState>, body: Bytes) -> ApiResult<Json<VoiceResponse>> {
    let stt = state.read().await.stt.clone();

    let transcript = stt
        .transcribe(&body)
        .await
        .ok_or_else(|| ApiError::Unprocessable("no speech recognized".to_string()))?;
    debug!("Transcript: '{}'", transcript);

    let response = answer(&state, &transcript).await?;
    Ok(Json(VoiceResponse { transcript, response }))
}
