//! Haptic pattern selection

use perception::{Position, SceneRecord};
use serde::{Deserialize, Serialize};

/// Vibration pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PulsePattern {
    RapidPulse,
    FastPulse,
    MediumPulse,
}

impl PulsePattern {
    pub fn as_str(&self) -> &'static str {
        match self {
            PulsePattern::RapidPulse => "rapid_pulse",
            PulsePattern::FastPulse => "fast_pulse",
            PulsePattern::MediumPulse => "medium_pulse",
        }
    }
}

/// Active vibration parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HapticPulse {
    pub pattern: PulsePattern,
    /// 0.0 - 1.0
    pub intensity: f64,
    pub frequency_hz: u32,
    pub direction: Position,
    pub duration_ms: u32,
}

/// Haptic output; serializes as `{"enabled": false}` when off
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HapticFeedback {
    pub enabled: bool,
    #[serde(flatten)]
    pub pulse: Option<HapticPulse>,
}

impl HapticFeedback {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            pulse: None,
        }
    }

    /// Feedback for the nearest critical object of a scene
    pub fn for_scene(scene: &SceneRecord) -> Self {
        scene
            .nearest_critical()
            .map(|d| select_haptic(d.distance_m, d.position))
            .unwrap_or_else(Self::disabled)
    }
}

const PULSE_DURATION_MS: u32 = 500;

/// Pick a pattern from obstacle distance; only obstacles under 1.5m vibrate
pub fn select_haptic(distance_m: f64, direction: Position) -> HapticFeedback {
    let (pattern, intensity, frequency_hz) = if distance_m < 0.0 {
        return HapticFeedback::disabled();
    } else if distance_m < 0.5 {
        (PulsePattern::RapidPulse, 1.0, 30)
    } else if distance_m < 1.0 {
        (PulsePattern::FastPulse, 0.8, 20)
    } else if distance_m < 1.5 {
        (PulsePattern::MediumPulse, 0.5, 10)
    } else {
        return HapticFeedback::disabled();
    };

    HapticFeedback {
        enabled: true,
        pulse: Some(HapticPulse {
            pattern,
            intensity,
            frequency_hz,
            direction,
            duration_ms: PULSE_DURATION_MS,
        }),
    }
}
