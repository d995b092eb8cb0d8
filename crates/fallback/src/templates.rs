//! Keyword-routed response templates

use perception::{Detection, Position, SceneRecord};
use tracing::debug;

const SAFETY_WORDS: [&str; 4] = ["safe", "clear", "walk", "move"];
const DESCRIPTION_WORDS: [&str; 4] = ["describe", "what", "see", "scene"];
const LOCATION_WORDS: [&str; 3] = ["where", "find", "locate"];

/// Objects named individually in a scene description
const DESCRIBED_OBJECTS: usize = 3;

/// Kind of answer a query asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    Safety,
    Description,
    Location,
    Summary,
}

impl QueryKind {
    /// Classify by keyword; safety words take precedence over description
    /// words, which take precedence over location words.
    pub fn classify(query: &str) -> Self {
        let query = query.to_lowercase();
        let contains_any = |words: &[&str]| words.iter().any(|w| query.contains(w));

        if contains_any(&SAFETY_WORDS) {
            QueryKind::Safety
        } else if contains_any(&DESCRIPTION_WORDS) {
            QueryKind::Description
        } else if contains_any(&LOCATION_WORDS) {
            QueryKind::Location
        } else {
            QueryKind::Summary
        }
    }
}

/// Template response generator
pub struct ResponseTemplates;

impl ResponseTemplates {
    /// Answer a query from the scene alone
    pub fn respond(scene: &SceneRecord, query: &str) -> String {
        let kind = QueryKind::classify(query);
        debug!("Template response for {:?} query", kind);

        match kind {
            QueryKind::Safety => Self::safety(scene),
            QueryKind::Description => Self::describe_scene(scene),
            QueryKind::Location => Self::locate(scene, query),
            QueryKind::Summary => Self::summary(scene),
        }
    }

    /// Is the path safe to walk
    pub fn safety(scene: &SceneRecord) -> String {
        if let Some(closest) = scene.critical_alerts.first() {
            return format!(
                "Caution! There is a {} only {:.1} meters away on your {}. Please move carefully.",
                closest.class_name, closest.distance_m, closest.position
            );
        }

        match scene.objects.first() {
            None => "The path ahead appears clear. No obstacles detected within range.".to_string(),
            Some(closest) => format!(
                "The path is generally clear. The nearest object is a {} about {:.1} meters away on your {}.",
                closest.class_name, closest.distance_m, closest.position
            ),
        }
    }

    /// Nearest object ahead, then left, then right
    pub fn describe_scene(scene: &SceneRecord) -> String {
        if scene.objects.is_empty() {
            return "I don't see any objects in the current view. The area appears open.".to_string();
        }

        let nearest_at = |position: Position| -> Option<&Detection> {
            scene.objects.iter().find(|o| o.position == position)
        };

        let mut parts = Vec::with_capacity(3);
        if let Some(o) = nearest_at(Position::Center) {
            parts.push(format!(
                "Directly ahead, there's a {} at {:.1} meters",
                o.class_name, o.distance_m
            ));
        }
        if let Some(o) = nearest_at(Position::Left) {
            parts.push(format!("on your left, a {} at {:.1} meters", o.class_name, o.distance_m));
        }
        if let Some(o) = nearest_at(Position::Right) {
            parts.push(format!("on your right, a {} at {:.1} meters", o.class_name, o.distance_m));
        }

        let mut description = format!("I can see: {}.", parts.join(", "));
        if scene.num_objects > DESCRIBED_OBJECTS {
            description.push_str(&format!(
                " There are {} more objects in the scene.",
                scene.num_objects - DESCRIBED_OBJECTS
            ));
        }
        description
    }

    /// Find an object named in the query, else report the nearest one.
    ///
    /// A class matches when it equals a query word or contains one.
    pub fn locate(scene: &SceneRecord, query: &str) -> String {
        let Some(closest) = scene.objects.first() else {
            return "I don't see any objects matching your query in the current view.".to_string();
        };

        let query = query.to_lowercase();
        let words: Vec<&str> = query.split_whitespace().collect();
        let found = scene.objects.iter().find(|o| {
            let class = o.class_name.to_lowercase();
            words.iter().any(|w| class == *w || class.contains(w))
        });

        match found {
            Some(o) => format!(
                "I found a {} at {:.1} meters on your {}.",
                o.class_name, o.distance_m, o.position
            ),
            None => format!(
                "The nearest object is a {} at {:.1} meters on your {}.",
                closest.class_name, closest.distance_m, closest.position
            ),
        }
    }

    pub fn summary(scene: &SceneRecord) -> String {
        match scene.objects.first() {
            None => "No objects detected in the current view.".to_string(),
            Some(closest) => format!(
                "I detect {} object(s). Closest is a {} at {:.1} meters. Status: {}",
                scene.num_objects, closest.class_name, closest.distance_m, scene.safety_status
            ),
        }
    }
}
