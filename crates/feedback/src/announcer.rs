//! Spoken alert throttling

use std::time::{Duration, Instant};

use perception::{SafetyStatus, SceneRecord};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Announcer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnouncerConfig {
    /// Minimum gap before repeating the same status (seconds)
    pub cooldown_seconds: u64,
}

impl Default for AnnouncerConfig {
    fn default() -> Self {
        Self { cooldown_seconds: 5 }
    }
}

/// Decides which scenes get an unprompted spoken warning.
///
/// Only DANGER and WARNING scenes are announced. A status is not repeated
/// inside the cooldown, but an escalation is always spoken.
pub struct AlertAnnouncer {
    config: AnnouncerConfig,
    last: Option<(SafetyStatus, Instant)>,
    announced: usize,
}

impl AlertAnnouncer {
    pub fn new(config: AnnouncerConfig) -> Self {
        info!("Creating alert announcer with config: {:?}", config);
        Self {
            config,
            last: None,
            announced: 0,
        }
    }

    /// Message to speak for this scene, if any
    pub fn check(&mut self, scene: &SceneRecord) -> Option<String> {
        self.check_at(scene, Instant::now())
    }

    fn check_at(&mut self, scene: &SceneRecord, now: Instant) -> Option<String> {
        let status = scene.safety_status;
        if !matches!(status, SafetyStatus::Danger | SafetyStatus::Warning) {
            return None;
        }

        if let Some((last_status, at)) = self.last {
            let escalated = status.severity() > last_status.severity();
            let cooling = now.duration_since(at) < Duration::from_secs(self.config.cooldown_seconds);
            if !escalated && cooling {
                debug!("Announcement suppressed: '{}' in cooldown", status);
                return None;
            }
        }

        self.last = Some((status, now));
        self.announced += 1;
        Some(Self::message(scene))
    }

    fn message(scene: &SceneRecord) -> String {
        let lead = match scene.safety_status {
            SafetyStatus::Danger => "Danger!",
            _ => "Warning.",
        };
        match scene.nearest_critical() {
            Some(d) => format!(
                "{} {} {:.1} meters away on your {}.",
                lead, d.class_name, d.distance_m, d.position
            ),
            None => format!("{} {}", lead, scene.safety_status),
        }
    }

    /// Number of announcements made
    pub fn announced_count(&self) -> usize {
        self.announced
    }

    /// Forget the last announcement
    pub fn reset(&mut self) {
        self.last = None;
    }
}

impl Default for AlertAnnouncer {
    fn default() -> Self {
        Self::new(AnnouncerConfig::default())
    }
}
