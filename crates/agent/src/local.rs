//! Local navigation agent

use std::sync::Arc;

use async_trait::async_trait;
use camera_capture::VideoFrame;
use chrono::Utc;
use fallback::ResponseTemplates;
use feedback::HapticFeedback;
use perception::SceneRecord;
use tracing::{debug, error, info, warn};

use crate::history::{ConversationHistory, Exchange};
use crate::response::{AgentResponse, CvSummary};
use crate::tools::{cv_perception_tool, haptic_feedback_tool};
use crate::vlm::VisionModel;
use crate::{AgentError, NavigationAgent};

/// Query fragments that call for the vision model
const VLM_KEYWORDS: [&str; 16] = [
    "describe",
    "what",
    "where",
    "how many",
    "tell me about",
    "explain",
    "identify",
    "recognize",
    "scene",
    "environment",
    "see",
    "look",
    "show",
    "detail",
    "color",
    "appearance",
];

/// Whether a query needs semantic understanding beyond the detections
pub fn needs_vlm(query: &str) -> bool {
    let query = query.to_lowercase();
    VLM_KEYWORDS.iter().any(|k| query.contains(k))
}

/// Agent that answers in-process, optionally through a vision model
pub struct LocalAgent {
    vlm: Option<Arc<dyn VisionModel>>,
    history: ConversationHistory,
}

impl LocalAgent {
    pub fn new(vlm: Option<Arc<dyn VisionModel>>) -> Self {
        info!(
            "Local agent initialized (vision model: {})",
            vlm.as_ref().map(|v| v.name()).unwrap_or("none")
        );
        Self {
            vlm,
            history: ConversationHistory::default(),
        }
    }

    /// Template-only agent
    pub fn templates_only() -> Self {
        Self::new(None)
    }

    async fn answer(&self, query: &str, frame: &VideoFrame, scene: &SceneRecord) -> (String, bool) {
        let vlm = match &self.vlm {
            Some(vlm) if needs_vlm(query) => vlm,
            _ => return (ResponseTemplates::respond(scene, query), false),
        };

        match vlm.describe(frame, scene, query).await {
            Ok(text) => (text, true),
            Err(e) => {
                warn!("Vision model failed, falling back to templates: {}", e);
                (ResponseTemplates::respond(scene, query), false)
            }
        }
    }
}

#[async_trait]
impl NavigationAgent for LocalAgent {
    async fn process_query(&mut self, query: &str, frame: &VideoFrame, scene: &SceneRecord) -> AgentResponse {
        let scene = match serde_json::to_value(scene)
            .map_err(AgentError::from)
            .and_then(cv_perception_tool)
        {
            Ok(scene) => scene,
            Err(e) => {
                error!("Error in agent processing: {}", e);
                return AgentResponse::error(e.to_string());
            }
        };

        let haptic_feedback = scene
            .nearest_critical()
            .map(|d| haptic_feedback_tool(d.distance_m, d.position))
            .unwrap_or_else(HapticFeedback::disabled);
        let (text_response, used_vlm) = self.answer(query, frame, &scene).await;
        debug!("Local agent answered (vlm={}): {}", used_vlm, text_response);

        self.history.push(Exchange {
            timestamp: Utc::now(),
            query: query.to_string(),
            response: text_response.clone(),
            safety_status: Some(scene.safety_status),
            num_objects: scene.num_objects,
            used_vlm,
            used_remote: false,
        });

        AgentResponse {
            text_response,
            haptic_feedback,
            safety_status: Some(scene.safety_status),
            cv_summary: Some(CvSummary::from_scene(&scene)),
            used_vlm,
            used_remote: false,
            error: None,
        }
    }

    fn history(&self) -> Vec<Exchange> {
        self.history.entries()
    }

    fn clear_history(&mut self) {
        self.history.clear();
        info!("Conversation history cleared");
    }

    fn agent_type(&self) -> &'static str {
        "local"
    }

    fn vlm_available(&self) -> bool {
        self.vlm.is_some()
    }
}
