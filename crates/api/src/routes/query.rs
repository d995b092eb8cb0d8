//! Navigation queries

use agent::AgentResponse;
use axum::{extract::State, Json};
use serde::Deserialize;
use tracing::info;

use crate::{metrics, ApiError, ApiResult, SharedState};

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub query: String,
}

pub async fn post_query(
    State(state): State<SharedState>,
    Json(request): Json<QueryRequest>,
) -> ApiResult<Json<AgentResponse>> {
    let query = request.query.trim();
    if query.is_empty() {
        return Err(ApiError::BadRequest("query must not be empty".to_string()));
    }
    answer(&state, query).await.map(Json)
}

/// Answer a query against the latest frame and speak the reply.
///
/// The state lock is released before the agent runs, so frames keep
/// flowing while a vision model call is in flight.
pub(crate) async fn answer(state: &SharedState, query: &str) -> ApiResult<AgentResponse> {
    let (frame, scene, agent, tts) = {
        let state = state.read().await;
        let latest = state.latest.as_ref().ok_or_else(ApiError::no_frame)?;
        (
            latest.frame.clone(),
            latest.analysis.scene.clone(),
            state.agent.clone(),
            state.tts.clone(),
        )
    };

    let response = agent.lock().await.process_query(query, &frame, &scene).await;
    info!("Query answered via {}: '{}'", response.backend(), query);
    metrics::record_query(response.backend());

    tts.speak(&response.text_response);
    Ok(response)
}
