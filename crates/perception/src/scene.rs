//! Per-frame scene aggregation and safety status

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::distance::{CRITICAL_DISTANCE_M, WARNING_DISTANCE_M};
use crate::object::Detection;

/// Aggregate safety status of a scene
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SafetyStatus {
    Danger,
    Warning,
    Caution,
    Clear,
}

impl SafetyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SafetyStatus::Danger => "DANGER - Immediate obstacles detected",
            SafetyStatus::Warning => "WARNING - Close obstacles detected",
            SafetyStatus::Caution => "CAUTION - Objects present, path negotiable",
            SafetyStatus::Clear => "CLEAR - No obstacles detected",
        }
    }

    /// Four-way classification from the critical alerts and object count
    pub fn assess(critical_alerts: &[Detection], num_objects: usize) -> Self {
        if !critical_alerts.is_empty() {
            if critical_alerts
                .iter()
                .any(|d| d.distance_m < CRITICAL_DISTANCE_M)
            {
                SafetyStatus::Danger
            } else {
                SafetyStatus::Warning
            }
        } else if num_objects == 0 {
            SafetyStatus::Clear
        } else {
            SafetyStatus::Caution
        }
    }

    /// Escalation order (clear < caution < warning < danger)
    pub fn severity(&self) -> u8 {
        match self {
            SafetyStatus::Clear => 0,
            SafetyStatus::Caution => 1,
            SafetyStatus::Warning => 2,
            SafetyStatus::Danger => 3,
        }
    }
}

impl fmt::Display for SafetyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SafetyStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [
            SafetyStatus::Danger,
            SafetyStatus::Warning,
            SafetyStatus::Caution,
            SafetyStatus::Clear,
        ]
        .into_iter()
        .find(|status| status.as_str() == s)
        .ok_or_else(|| format!("unrecognized safety status: {}", s))
    }
}

impl TryFrom<String> for SafetyStatus {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<SafetyStatus> for String {
    fn from(status: SafetyStatus) -> Self {
        status.as_str().to_string()
    }
}

/// Whether a detection counts as a critical (near) alert
pub fn is_critical(detection: &Detection) -> bool {
    detection.distance_m > 0.0 && detection.distance_m < WARNING_DISTANCE_M
}

fn distance_key(detection: &Detection) -> f64 {
    if detection.distance_m > 0.0 {
        detection.distance_m
    } else {
        f64::INFINITY
    }
}

/// Nearest first, unknown distances last; ties broken on label then box
fn compare_for_scene(a: &Detection, b: &Detection) -> Ordering {
    distance_key(a)
        .total_cmp(&distance_key(b))
        .then_with(|| a.class_name.cmp(&b.class_name))
        .then_with(|| a.bounding_box.total_cmp(&b.bounding_box))
        .then_with(|| b.confidence.total_cmp(&a.confidence))
        .then_with(|| a.class_id.cmp(&b.class_id))
}

/// Everything detected in one frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneRecord {
    /// Capture time
    pub timestamp: DateTime<Utc>,

    /// Number of detections
    pub num_objects: usize,

    /// Detections, nearest first
    pub objects: Vec<Detection>,

    /// Detections closer than 1.5m, nearest first
    pub critical_alerts: Vec<Detection>,

    /// Aggregate status
    pub safety_status: SafetyStatus,
}

impl SceneRecord {
    /// Sort, extract critical alerts and classify
    pub fn aggregate(mut detections: Vec<Detection>, timestamp: DateTime<Utc>) -> Self {
        detections.sort_by(compare_for_scene);

        let critical_alerts: Vec<Detection> =
            detections.iter().filter(|d| is_critical(d)).cloned().collect();
        let safety_status = SafetyStatus::assess(&critical_alerts, detections.len());

        Self {
            timestamp,
            num_objects: detections.len(),
            objects: detections,
            critical_alerts,
            safety_status,
        }
    }

    /// Scene with nothing in view
    pub fn empty(timestamp: DateTime<Utc>) -> Self {
        Self::aggregate(Vec::new(), timestamp)
    }

    /// Nearest critical object
    pub fn nearest_critical(&self) -> Option<&Detection> {
        self.critical_alerts.first()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance::safety_level;
    use crate::object::{BoundingBox, Position};
    use proptest::prelude::*;

    fn detection(class: &str, distance_m: f64) -> Detection {
        Detection {
            class_name: class.to_string(),
            class_id: None,
            confidence: 0.9,
            bounding_box: BoundingBox::new(0.0, 0.0, 10.0, 10.0),
            distance_m,
            position: Position::Center,
            safety_level: safety_level(distance_m),
        }
    }

    fn at_epoch() -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp(0, 0).unwrap()
    }

    #[test]
    fn test_danger_with_unknown_last() {
        let scene = SceneRecord::aggregate(
            vec![
                detection("chair", 2.0),
                detection("person", -1.0),
                detection("dog", 0.8),
            ],
            at_epoch(),
        );

        let distances: Vec<f64> = scene.objects.iter().map(|d| d.distance_m).collect();
        assert_eq!(distances, vec![0.8, 2.0, -1.0]);
        assert_eq!(scene.critical_alerts.len(), 1);
        assert_eq!(scene.critical_alerts[0].distance_m, 0.8);
        assert_eq!(scene.safety_status, SafetyStatus::Danger);
        assert_eq!(
            scene.safety_status.as_str(),
            "DANGER - Immediate obstacles detected"
        );
    }

    #[test]
    fn test_empty_is_clear() {
        let scene = SceneRecord::empty(at_epoch());
        assert!(scene.critical_alerts.is_empty());
        assert_eq!(scene.num_objects, 0);
        assert_eq!(scene.safety_status.as_str(), "CLEAR - No obstacles detected");
    }

    #[test]
    fn test_warning_and_caution() {
        let warning = SceneRecord::aggregate(vec![detection("chair", 1.2)], at_epoch());
        assert_eq!(warning.safety_status, SafetyStatus::Warning);

        let caution = SceneRecord::aggregate(vec![detection("chair", 1.5)], at_epoch());
        assert!(caution.critical_alerts.is_empty());
        assert_eq!(caution.safety_status, SafetyStatus::Caution);

        let unknown_only = SceneRecord::aggregate(vec![detection("chair", -1.0)], at_epoch());
        assert_eq!(unknown_only.safety_status, SafetyStatus::Caution);
    }

    #[test]
    fn test_status_serializes_as_wording() {
        let json = serde_json::to_string(&SafetyStatus::Warning).unwrap();
        assert_eq!(json, "\"WARNING - Close obstacles detected\"");
        let back: SafetyStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(back, SafetyStatus::Warning);
        assert!(serde_json::from_str::<SafetyStatus>("\"clear\"").is_err());
    }

    #[test]
    fn test_aggregate_is_idempotent() {
        let input = vec![detection("cup", 0.4), detection("tv", 3.5), detection("cat", 1.1)];
        let a = SceneRecord::aggregate(input.clone(), at_epoch());
        let b = SceneRecord::aggregate(input, at_epoch());
        assert_eq!(a, b);
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }

    proptest! {
        #[test]
        fn prop_aggregate_order_independent(
            distances in proptest::collection::vec(
                prop_oneof![Just(-1.0f64), 0.1f64..20.0, Just(1.0f64), Just(1.5f64)],
                0..12,
            ),
            seed in any::<u64>(),
        ) {
            let classes = ["person", "chair", "dog", "cup"];
            let detections: Vec<Detection> = distances
                .iter()
                .enumerate()
                .map(|(i, d)| detection(classes[i % classes.len()], *d))
                .collect();

            let mut shuffled = detections.clone();
            // Deterministic rotation plus reversal as the permutation
            if !shuffled.is_empty() {
                let k = (seed as usize) % shuffled.len();
                shuffled.rotate_left(k);
                if seed % 2 == 0 {
                    shuffled.reverse();
                }
            }

            let a = SceneRecord::aggregate(detections, at_epoch());
            let b = SceneRecord::aggregate(shuffled, at_epoch());
            prop_assert_eq!(&a.critical_alerts, &b.critical_alerts);
            prop_assert_eq!(a.safety_status, b.safety_status);
            prop_assert_eq!(&a.objects, &b.objects);
        }

        #[test]
        fn prop_critical_is_ordered_subsequence(
            distances in proptest::collection::vec(-1.0f64..5.0, 0..15),
        ) {
            let detections: Vec<Detection> =
                distances.iter().map(|d| detection("box", *d)).collect();
            let scene = SceneRecord::aggregate(detections, at_epoch());

            let mut cursor = scene.objects.iter();
            for alert in &scene.critical_alerts {
                prop_assert!(alert.distance_m > 0.0 && alert.distance_m < 1.5);
                prop_assert!(cursor.any(|o| o == alert));
            }
        }
    }
}
