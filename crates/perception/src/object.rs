//! Detection records: bounding boxes, positions and safety tiers

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Axis-aligned box in pixel coordinates, serialized as `[x1, y1, x2, y2]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct BoundingBox {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl BoundingBox {
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Pixel height, regardless of corner order
    pub fn height(&self) -> f64 {
        (self.y2 - self.y1).abs()
    }

    /// Pixel width, regardless of corner order
    pub fn width(&self) -> f64 {
        (self.x2 - self.x1).abs()
    }

    /// Horizontal center
    pub fn center_x(&self) -> f64 {
        (self.x1 + self.x2) / 2.0
    }

    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    /// Lexicographic total order over the four coordinates
    pub fn total_cmp(&self, other: &Self) -> Ordering {
        self.x1
            .total_cmp(&other.x1)
            .then_with(|| self.y1.total_cmp(&other.y1))
            .then_with(|| self.x2.total_cmp(&other.x2))
            .then_with(|| self.y2.total_cmp(&other.y2))
    }
}

impl From<[f64; 4]> for BoundingBox {
    fn from(c: [f64; 4]) -> Self {
        Self::new(c[0], c[1], c[2], c[3])
    }
}

impl From<BoundingBox> for [f64; 4] {
    fn from(b: BoundingBox) -> Self {
        [b.x1, b.y1, b.x2, b.y2]
    }
}

/// Horizontal position of an object in the frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    Left,
    Center,
    Right,
}

impl Position {
    /// Classify by the box center against the frame thirds.
    ///
    /// Comparisons are strict, so a center exactly on `width/3` or
    /// `2*width/3` resolves to `Center`.
    pub fn from_bbox(bbox: &BoundingBox, image_width: u32) -> Self {
        let center_x = bbox.center_x();
        let width = image_width as f64;

        if center_x < width / 3.0 {
            Position::Left
        } else if center_x > 2.0 * width / 3.0 {
            Position::Right
        } else {
            Position::Center
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Position::Left => "left",
            Position::Center => "center",
            Position::Right => "right",
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Discrete proximity risk tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SafetyLevel {
    Unknown,
    Critical,
    Warning,
    Caution,
    Safe,
}

impl SafetyLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SafetyLevel::Unknown => "unknown",
            SafetyLevel::Critical => "critical",
            SafetyLevel::Warning => "warning",
            SafetyLevel::Caution => "caution",
            SafetyLevel::Safe => "safe",
        }
    }

    /// Rank along the distance axis (unknown < critical < ... < safe)
    pub fn rank(&self) -> u8 {
        match self {
            SafetyLevel::Unknown => 0,
            SafetyLevel::Critical => 1,
            SafetyLevel::Warning => 2,
            SafetyLevel::Caution => 3,
            SafetyLevel::Safe => 4,
        }
    }

    /// Annotation color as BGR
    pub fn color_bgr(&self) -> [u8; 3] {
        match self {
            SafetyLevel::Unknown => [128, 128, 128],
            SafetyLevel::Critical => [0, 0, 255],
            SafetyLevel::Warning => [0, 69, 255],
            SafetyLevel::Caution => [0, 165, 255],
            SafetyLevel::Safe => [0, 255, 0],
        }
    }
}

impl fmt::Display for SafetyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Detector output before distance estimation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawDetection {
    /// Detector label (e.g. "person")
    pub class_name: String,

    /// Detector class index, if the backend has one
    pub class_id: Option<usize>,

    /// Detection confidence [0, 1]
    pub confidence: f32,

    /// Box in pixel coordinates
    pub bounding_box: BoundingBox,
}

impl RawDetection {
    pub fn new(class_name: impl Into<String>, confidence: f32, bounding_box: BoundingBox) -> Self {
        Self {
            class_name: class_name.into(),
            class_id: None,
            confidence,
            bounding_box,
        }
    }
}

/// One detected object in one frame, with distance and safety tier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Detector label
    #[serde(rename = "class")]
    pub class_name: String,

    /// Detector class index
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_id: Option<usize>,

    /// Detection confidence [0, 1]
    pub confidence: f32,

    /// Box in pixel coordinates
    #[serde(rename = "bbox")]
    pub bounding_box: BoundingBox,

    /// Estimated distance (meters), -1.0 when unknown
    pub distance_m: f64,

    /// Horizontal position
    pub position: Position,

    /// Safety tier derived from distance
    pub safety_level: SafetyLevel,
}

impl Detection {
    /// Whether the distance estimate is usable
    pub fn has_known_distance(&self) -> bool {
        self.distance_m > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_thirds() {
        let width = 600;
        let left = BoundingBox::new(0.0, 0.0, 100.0, 50.0);
        let center = BoundingBox::new(250.0, 0.0, 350.0, 50.0);
        let right = BoundingBox::new(500.0, 0.0, 600.0, 50.0);

        assert_eq!(Position::from_bbox(&left, width), Position::Left);
        assert_eq!(Position::from_bbox(&center, width), Position::Center);
        assert_eq!(Position::from_bbox(&right, width), Position::Right);
    }

    #[test]
    fn test_position_boundaries_resolve_to_center() {
        // center_x == 200 == width/3, and center_x == 400 == 2*width/3
        let on_first = BoundingBox::new(150.0, 0.0, 250.0, 10.0);
        let on_second = BoundingBox::new(350.0, 0.0, 450.0, 10.0);
        assert_eq!(Position::from_bbox(&on_first, 600), Position::Center);
        assert_eq!(Position::from_bbox(&on_second, 600), Position::Center);

        let just_left = BoundingBox::new(149.0, 0.0, 250.0, 10.0);
        assert_eq!(Position::from_bbox(&just_left, 600), Position::Left);
    }

    #[test]
    fn test_bbox_serializes_as_array() {
        let bbox = BoundingBox::new(1.0, 2.0, 3.0, 4.0);
        let json = serde_json::to_string(&bbox).unwrap();
        assert_eq!(json, "[1.0,2.0,3.0,4.0]");
        let back: BoundingBox = serde_json::from_str(&json).unwrap();
        assert_eq!(back, bbox);
    }

    #[test]
    fn test_inverted_box_height() {
        let bbox = BoundingBox::new(0.0, 300.0, 10.0, 100.0);
        assert_eq!(bbox.height(), 200.0);
    }

    #[test]
    fn test_detection_json_keys() {
        let detection = Detection {
            class_name: "person".to_string(),
            class_id: None,
            confidence: 0.9,
            bounding_box: BoundingBox::new(0.0, 0.0, 10.0, 10.0),
            distance_m: 2.5,
            position: Position::Left,
            safety_level: SafetyLevel::Caution,
        };
        let value = serde_json::to_value(&detection).unwrap();
        assert_eq!(value["class"], "person");
        assert_eq!(value["position"], "left");
        assert_eq!(value["safety_level"], "caution");
        assert!(value.get("class_id").is_none());
    }
}
