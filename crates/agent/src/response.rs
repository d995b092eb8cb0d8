//! Agent response records

use feedback::HapticFeedback;
use perception::{Position, SafetyStatus, SceneRecord};
use serde::{Deserialize, Serialize};

/// Object classes per horizontal position, nearest first
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectsByPosition {
    pub left: Vec<String>,
    pub center: Vec<String>,
    pub right: Vec<String>,
}

/// Compact scene digest for display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CvSummary {
    pub total_objects: usize,
    pub critical_count: usize,
    pub safety_status: SafetyStatus,
    pub objects_by_position: ObjectsByPosition,
}

impl CvSummary {
    pub fn from_scene(scene: &SceneRecord) -> Self {
        let mut grouped = ObjectsByPosition::default();
        for object in &scene.objects {
            let bucket = match object.position {
                Position::Left => &mut grouped.left,
                Position::Center => &mut grouped.center,
                Position::Right => &mut grouped.right,
            };
            bucket.push(object.class_name.clone());
        }

        Self {
            total_objects: scene.num_objects,
            critical_count: scene.critical_alerts.len(),
            safety_status: scene.safety_status,
            objects_by_position: grouped,
        }
    }
}

const ERROR_TEXT: &str = "I encountered an error processing your request. Please try again.";

/// Answer to one query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentResponse {
    pub text_response: String,
    pub haptic_feedback: HapticFeedback,
    /// `None` when the scene could not be read
    pub safety_status: Option<SafetyStatus>,
    pub cv_summary: Option<CvSummary>,
    pub used_vlm: bool,
    #[serde(default)]
    pub used_remote: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AgentResponse {
    /// Apology answer carrying the failure
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            text_response: ERROR_TEXT.to_string(),
            haptic_feedback: HapticFeedback::disabled(),
            safety_status: None,
            cv_summary: None,
            used_vlm: false,
            used_remote: false,
            error: Some(message.into()),
        }
    }

    /// Which backend produced the text
    pub fn backend(&self) -> &'static str {
        if self.error.is_some() {
            "error"
        } else if self.used_remote {
            "remote"
        } else if self.used_vlm {
            "vlm"
        } else {
            "templates"
        }
    }
}
