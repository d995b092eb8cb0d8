//! Navigation Agent
//!
//! Answers user queries about the current scene:
//! - Local agent: scene validation, haptics, vision model or templates
//! - Remote agent: external orchestration service with local fallback
//! - Gemini vision-language client
//! - Factory that picks the strategy once at startup

mod factory;
mod history;
mod local;
mod remote;
mod response;
pub mod tools;
mod vlm;

pub use factory::AgentFactory;
pub use history::{ConversationHistory, Exchange, HISTORY_CAPACITY};
pub use local::LocalAgent;
pub use remote::{format_remote_context, RemoteAgent};
pub use response::{AgentResponse, CvSummary, ObjectsByPosition};
pub use vlm::{format_cv_context, GeminiVlm, VisionModel};

use async_trait::async_trait;
use camera_capture::{CameraError, VideoFrame};
use perception::SceneRecord;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Agent error types
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Invalid scene payload: {0}")]
    InvalidScene(String),

    #[error("Vision model unavailable: {0}")]
    VlmUnavailable(String),

    #[error("Vision model request failed: {0}")]
    Vlm(String),

    #[error("Remote agent request failed: {0}")]
    Remote(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Frame encoding failed: {0}")]
    Frame(#[from] CameraError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

const PLACEHOLDER_GEMINI_KEY: &str = "your_gemini_api_key_here";

/// Agent configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Use the Gemini vision model for descriptive queries
    pub use_gemini: bool,
    pub gemini_api_key: String,
    pub gemini_model: String,
    /// API root, overridable for testing
    pub gemini_base_url: String,

    /// Route queries through the remote agent service
    pub use_remote_agent: bool,
    pub agent_endpoint: Option<String>,
    pub agent_api_key: Option<String>,

    /// Never call external services; answer from templates only
    pub mock_mode: bool,

    /// Timeout for external calls (seconds)
    pub request_timeout_secs: u64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            use_gemini: false,
            gemini_api_key: String::new(),
            gemini_model: "gemini-2.0-flash-exp".to_string(),
            gemini_base_url: "https://generativelanguage.googleapis.com".to_string(),
            use_remote_agent: false,
            agent_endpoint: None,
            agent_api_key: None,
            mock_mode: false,
            request_timeout_secs: 30,
        }
    }
}

impl AgentConfig {
    /// A real key is set (the sample placeholder does not count)
    pub fn has_gemini_key(&self) -> bool {
        !self.gemini_api_key.is_empty() && self.gemini_api_key != PLACEHOLDER_GEMINI_KEY
    }

    pub fn has_remote_agent(&self) -> bool {
        self.agent_endpoint.as_deref().is_some_and(|e| !e.is_empty())
    }

    /// Vision model should be attached
    pub fn vlm_enabled(&self) -> bool {
        !self.mock_mode && self.use_gemini && self.has_gemini_key()
    }

    /// Remote agent should be used
    pub fn remote_enabled(&self) -> bool {
        !self.mock_mode && self.use_remote_agent && self.has_remote_agent()
    }
}

/// A conversational navigation agent
#[async_trait]
pub trait NavigationAgent: Send + Sync {
    /// Answer a query about the given frame and its scene record.
    ///
    /// Never fails: backend errors degrade to template answers, and an
    /// invalid scene yields an error response.
    async fn process_query(&mut self, query: &str, frame: &VideoFrame, scene: &SceneRecord) -> AgentResponse;

    /// Recent exchanges, oldest first
    fn history(&self) -> Vec<Exchange>;

    fn clear_history(&mut self);

    fn agent_type(&self) -> &'static str;

    /// Whether a vision model is attached
    fn vlm_available(&self) -> bool;
}
