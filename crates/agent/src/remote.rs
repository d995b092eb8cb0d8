//! Remote agent-orchestration client

use std::time::Duration;

use async_trait::async_trait;
use camera_capture::VideoFrame;
use chrono::Utc;
use feedback::HapticFeedback;
use perception::SceneRecord;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::history::{ConversationHistory, Exchange};
use crate::local::LocalAgent;
use crate::response::{AgentResponse, CvSummary};
use crate::{AgentConfig, AgentError, NavigationAgent};

/// Objects listed in the remote context
const CONTEXT_OBJECTS: usize = 5;

const EMPTY_COMPLETION: &str = "No response from remote agent.";

/// Scene summary sent to the remote agent
pub fn format_remote_context(scene: &SceneRecord) -> String {
    if scene.num_objects == 0 {
        return format!("No objects detected. Safety Status: {}", scene.safety_status);
    }

    let mut lines = vec![format!(
        "Detected {} object(s). Safety Status: {}\n",
        scene.num_objects, scene.safety_status
    )];

    for object in scene.objects.iter().take(CONTEXT_OBJECTS) {
        let distance = if object.has_known_distance() {
            format!("{:.1}m", object.distance_m)
        } else {
            "unknown".to_string()
        };
        lines.push(format!("  - {} at {}, {}", object.class_name, distance, object.position));
    }

    if !scene.critical_alerts.is_empty() {
        lines.push("\nCRITICAL ALERTS:".to_string());
        for alert in &scene.critical_alerts {
            lines.push(format!("  ⚠ {} only {:.1}m away!", alert.class_name, alert.distance_m));
        }
    }

    lines.join("\n")
}

#[derive(Debug, Serialize)]
struct InvokeRequest<'a> {
    session_id: &'a str,
    input_text: String,
}

#[derive(Debug, Deserialize)]
struct InvokeResponse {
    #[serde(default)]
    completion: String,
}

/// Agent backed by an external orchestration service.
///
/// Any failure of the service is answered by the embedded local agent.
pub struct RemoteAgent {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    session_id: String,
    local: LocalAgent,
    history: ConversationHistory,
}

impl RemoteAgent {
    pub fn new(config: &AgentConfig, local: LocalAgent) -> Result<Self, AgentError> {
        let endpoint = config
            .agent_endpoint
            .clone()
            .filter(|e| !e.is_empty())
            .ok_or_else(|| AgentError::Remote("no agent endpoint configured".to_string()))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        let session_id = Uuid::new_v4().to_string();
        info!("Remote agent at {} (session {})", endpoint, session_id);

        Ok(Self {
            client,
            endpoint,
            api_key: config.agent_api_key.clone(),
            session_id,
            local,
            history: ConversationHistory::default(),
        })
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    async fn invoke(&self, input_text: String) -> Result<String, AgentError> {
        let mut request = self.client.post(&self.endpoint).json(&InvokeRequest {
            session_id: &self.session_id,
            input_text,
        });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(AgentError::Remote(format!("agent returned {}: {}", status, error_text)));
        }

        let body: InvokeResponse = response.json().await?;
        let completion = body.completion.trim();
        Ok(if completion.is_empty() {
            EMPTY_COMPLETION.to_string()
        } else {
            completion.to_string()
        })
    }
}

#[async_trait]
impl NavigationAgent for RemoteAgent {
    async fn process_query(&mut self, query: &str, frame: &VideoFrame, scene: &SceneRecord) -> AgentResponse {
        let input_text = format!(
            "User Query: {}\n\nCurrent Environment:\n{}\n\n\
             Provide a helpful, safety-focused response for navigation assistance.",
            query,
            format_remote_context(scene)
        );

        let text_response = match self.invoke(input_text).await {
            Ok(text) => text,
            Err(e) => {
                warn!("Remote agent failed, falling back to local agent: {}", e);
                return self.local.process_query(query, frame, scene).await;
            }
        };
        debug!("Remote agent answered: {}", text_response);

        self.history.push(Exchange {
            timestamp: Utc::now(),
            query: query.to_string(),
            response: text_response.clone(),
            safety_status: Some(scene.safety_status),
            num_objects: scene.num_objects,
            used_vlm: false,
            used_remote: true,
        });

        AgentResponse {
            text_response,
            haptic_feedback: HapticFeedback::for_scene(scene),
            safety_status: Some(scene.safety_status),
            cv_summary: Some(CvSummary::from_scene(scene)),
            used_vlm: false,
            used_remote: true,
            error: None,
        }
    }

    /// Remote exchanges and local fallbacks, in time order
    fn history(&self) -> Vec<Exchange> {
        let mut entries = self.history.entries();
        entries.extend(self.local.history());
        entries.sort_by_key(|e| e.timestamp);
        let skip = entries.len().saturating_sub(crate::HISTORY_CAPACITY);
        entries.split_off(skip)
    }

    fn clear_history(&mut self) {
        self.history.clear();
        self.local.clear_history();
    }

    fn agent_type(&self) -> &'static str {
        "remote"
    }

    fn vlm_available(&self) -> bool {
        self.local.vlm_available()
    }
}
