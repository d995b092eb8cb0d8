//! Navigation tools
//!
//! Scene validation, haptics, and placeholders for localization, route
//! planning and object memory.

use feedback::{select_haptic, HapticFeedback};
use perception::distance::CRITICAL_DISTANCE_M;
use perception::scene::is_critical;
use perception::{Detection, Position, SafetyStatus, SceneRecord};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::AgentError;

const REQUIRED_KEYS: [&str; 3] = ["timestamp", "num_objects", "objects"];

/// Validate a scene payload that may come from outside the process.
///
/// The payload must carry `timestamp`, `num_objects` and `objects`.
/// Missing `critical_alerts` are derived from the objects and a missing
/// `safety_status` is re-derived with the usual four-way rule.
pub fn cv_perception_tool(mut payload: Value) -> Result<SceneRecord, AgentError> {
    let fields = payload
        .as_object_mut()
        .ok_or_else(|| AgentError::InvalidScene("scene payload must be a JSON object".to_string()))?;

    if let Some(missing) = REQUIRED_KEYS.iter().find(|k| !fields.contains_key(**k)) {
        return Err(AgentError::InvalidScene(format!("Missing required key: {}", missing)));
    }

    if !fields.contains_key("critical_alerts") {
        let objects: Vec<Detection> = serde_json::from_value(fields["objects"].clone())?;
        let alerts: Vec<Detection> = objects.into_iter().filter(is_critical).collect();
        fields.insert("critical_alerts".to_string(), serde_json::to_value(alerts)?);
    }

    if !fields.contains_key("safety_status") {
        let status = assess_safety(fields);
        debug!("Derived safety status '{}' for scene payload", status);
        fields.insert("safety_status".to_string(), Value::from(status.as_str()));
    }

    Ok(serde_json::from_value(payload)?)
}

/// Four-way status read straight off a JSON scene
fn assess_safety(fields: &Map<String, Value>) -> SafetyStatus {
    let alerts = fields
        .get("critical_alerts")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    if !alerts.is_empty() {
        let immediate = alerts.iter().any(|a| {
            a.get("distance_m")
                .and_then(Value::as_f64)
                .is_some_and(|d| d < CRITICAL_DISTANCE_M)
        });
        if immediate {
            SafetyStatus::Danger
        } else {
            SafetyStatus::Warning
        }
    } else if fields.get("num_objects").and_then(Value::as_u64).unwrap_or(0) == 0 {
        SafetyStatus::Clear
    } else {
        SafetyStatus::Caution
    }
}

/// Vibration pattern for an obstacle
pub fn haptic_feedback_tool(distance_m: f64, direction: Position) -> HapticFeedback {
    select_haptic(distance_m, direction)
}

/// Simulated location fix
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalizationReport {
    pub mode: String,
    pub location_type: String,
    pub description: String,
    pub coordinates: Option<(f64, f64)>,
    pub orientation: String,
    pub confidence: f64,
    pub note: String,
}

/// Current position. There is no VIO or GPS source yet, so this is a
/// fixed indoor fix.
pub fn localization_tool() -> LocalizationReport {
    LocalizationReport {
        mode: "simulated".to_string(),
        location_type: "indoor".to_string(),
        description: "Demo environment".to_string(),
        coordinates: None,
        orientation: "north".to_string(),
        confidence: 0.95,
        note: "Localization requires VIO/GPS integration".to_string(),
    }
}

/// Route planning result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutePlan {
    pub status: String,
    pub message: String,
    pub start: String,
    pub destination: String,
    pub estimated_distance_m: Option<f64>,
    pub estimated_duration_s: Option<f64>,
}

/// Route planning is not backed by a maps service
pub fn route_planning_tool(start: &str, destination: &str) -> RoutePlan {
    RoutePlan {
        status: "not_implemented".to_string(),
        message: "Route planning requires a maps API integration".to_string(),
        start: start.to_string(),
        destination: destination.to_string(),
        estimated_distance_m: None,
        estimated_duration_s: None,
    }
}

/// Object memory summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectMemoryReport {
    pub stored_objects: usize,
    pub storage_type: String,
    pub note: String,
}

/// Remember the objects of a scene. Nothing is persisted yet; this only
/// reports what would be stored.
pub fn object_memory_tool(objects: &[Detection]) -> ObjectMemoryReport {
    ObjectMemoryReport {
        stored_objects: objects.len(),
        storage_type: "in_memory".to_string(),
        note: "Persistent object memory requires a database integration".to_string(),
    }
}
