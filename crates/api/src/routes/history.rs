//! Conversation history

use agent::Exchange;
use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::SharedState;

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub agent_type: &'static str,
    pub exchanges: Vec<Exchange>,
}

pub async fn get_history(State(state): State<SharedState>) -> Json<HistoryResponse> {
    let agent = state.read().await.agent.clone();
    let agent = agent.lock().await;
    Json(HistoryResponse {
        agent_type: agent.agent_type(),
        exchanges: agent.history(),
    })
}

pub async fn clear_history(State(state): State<SharedState>) -> StatusCode {
    let agent = state.read().await.agent.clone();
    agent.lock().await.clear_history();
    StatusCode::NO_CONTENT
}
