//! Monocular distance estimation
//!
//! Pinhole camera approximation: `distance = real_height * focal_px / pixel_height`.
//! Accuracy depends entirely on the object height table and the focal
//! length; without a reference calibration the result is a rough guess.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::{LensSpec, PerceptionConfig};
use crate::object::{BoundingBox, Position, SafetyLevel};

/// Distance reported for a degenerate (zero-height) box
pub const UNKNOWN_DISTANCE: f64 = -1.0;

/// Clamp range for estimates (meters)
pub const MIN_DISTANCE_M: f64 = 0.1;
pub const MAX_DISTANCE_M: f64 = 20.0;

/// Safety tier cutoffs (meters)
pub const CRITICAL_DISTANCE_M: f64 = 1.0;
pub const WARNING_DISTANCE_M: f64 = 1.5;
pub const CAUTION_DISTANCE_M: f64 = 3.0;

/// Height assumed for classes missing from the table (meters)
pub const DEFAULT_OBJECT_HEIGHT_M: f64 = 1.0;

/// Average real-world heights (meters) by lowercase class name
pub const OBJECT_HEIGHTS: [(&str, f64); 26] = [
    ("person", 1.7),
    ("car", 1.5),
    ("chair", 0.9),
    ("bottle", 0.25),
    ("cup", 0.12),
    ("laptop", 0.02),
    ("cell phone", 0.15),
    ("door", 2.0),
    ("bicycle", 1.1),
    ("dog", 0.6),
    ("cat", 0.25),
    ("couch", 0.8),
    ("table", 0.75),
    ("bed", 0.6),
    ("tv", 0.5),
    ("potted plant", 0.5),
    ("backpack", 0.5),
    ("handbag", 0.3),
    ("suitcase", 0.7),
    ("book", 0.25),
    ("clock", 0.3),
    ("vase", 0.3),
    ("scissors", 0.2),
    ("teddy bear", 0.3),
    ("hair drier", 0.25),
    ("toothbrush", 0.2),
];

/// Real-world height for a class, falling back to 1.0 m
pub fn real_height_m(class_name: &str) -> f64 {
    let lower = class_name.to_lowercase();
    OBJECT_HEIGHTS
        .iter()
        .find(|(name, _)| *name == lower)
        .map(|(_, height)| *height)
        .unwrap_or(DEFAULT_OBJECT_HEIGHT_M)
}

/// Safety tier for a distance
pub fn safety_level(distance_m: f64) -> SafetyLevel {
    if distance_m < 0.0 {
        SafetyLevel::Unknown
    } else if distance_m < CRITICAL_DISTANCE_M {
        SafetyLevel::Critical
    } else if distance_m < WARNING_DISTANCE_M {
        SafetyLevel::Warning
    } else if distance_m < CAUTION_DISTANCE_M {
        SafetyLevel::Caution
    } else {
        SafetyLevel::Safe
    }
}

/// Focal length guess from the resolution tier.
///
/// Placeholder heuristic with no physical basis; replace with a measured
/// focal length or lens specs when available.
pub fn focal_length_for_resolution(image_height_px: u32) -> f64 {
    let h = image_height_px as f64;
    if image_height_px >= 720 {
        h * 0.9
    } else if image_height_px >= 480 {
        h
    } else {
        h * 1.2
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Camera calibration state for one detection session
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraCalibration {
    /// Focal length (pixels)
    pub focal_length_px: f64,

    /// Multiplicative bias on every estimate
    pub calibration_factor: f64,
}

impl CameraCalibration {
    pub fn new(focal_length_px: f64) -> Self {
        Self {
            focal_length_px,
            calibration_factor: 1.0,
        }
    }

    /// Derive focal length for an image height.
    ///
    /// Precedence: explicit pixels, then lens specs, then the resolution tier.
    pub fn for_image_height(
        image_height_px: u32,
        focal_length_px: Option<f64>,
        lens: Option<&LensSpec>,
    ) -> Self {
        let focal = focal_length_px
            .filter(|f| *f > 0.0)
            .or_else(|| lens.and_then(|l| l.focal_length_px(image_height_px)))
            .unwrap_or_else(|| focal_length_for_resolution(image_height_px));
        Self::new(focal)
    }

    pub fn with_factor(mut self, calibration_factor: f64) -> Self {
        self.calibration_factor = calibration_factor;
        self
    }
}

/// Distance and position estimator for one camera
#[derive(Debug, Clone)]
pub struct DistanceEstimator {
    calibration: CameraCalibration,
}

impl DistanceEstimator {
    pub fn new(calibration: CameraCalibration) -> Self {
        Self { calibration }
    }

    /// Build an estimator for the first frame's height using configured optics
    pub fn for_image(image_height_px: u32, config: &PerceptionConfig) -> Self {
        let calibration = CameraCalibration::for_image_height(
            image_height_px,
            config.focal_length_px,
            config.lens.as_ref(),
        )
        .with_factor(config.calibration_factor);

        info!(
            "Distance estimator initialized: height={}px focal={:.1}px factor={:.3}",
            image_height_px, calibration.focal_length_px, calibration.calibration_factor
        );
        Self::new(calibration)
    }

    pub fn calibration(&self) -> CameraCalibration {
        self.calibration
    }

    /// Estimate distance (meters) to an object of a known class.
    ///
    /// Returns [`UNKNOWN_DISTANCE`] for a zero-height box; otherwise the
    /// result is clamped to [0.1, 20.0] and rounded to centimeters.
    pub fn estimate_distance(&self, bbox: &BoundingBox, class_name: &str) -> f64 {
        let object_height_px = bbox.height();
        if object_height_px == 0.0 {
            return UNKNOWN_DISTANCE;
        }

        let real_height = real_height_m(class_name);
        let distance = (real_height
            * self.calibration.focal_length_px
            * self.calibration.calibration_factor)
            / object_height_px;

        round2(distance.clamp(MIN_DISTANCE_M, MAX_DISTANCE_M))
    }

    /// Recompute the calibration factor from one reference observation.
    ///
    /// Returns `false` (and leaves state untouched) for a zero-height box or
    /// a non-positive reference distance.
    pub fn calibrate(&mut self, bbox: &BoundingBox, class_name: &str, known_distance_m: f64) -> bool {
        let object_height_px = bbox.height();
        if object_height_px == 0.0 || !(known_distance_m > 0.0) {
            debug!("Calibration ignored: height={} known={}", object_height_px, known_distance_m);
            return false;
        }

        let real_height = real_height_m(class_name);
        self.calibration.calibration_factor =
            (known_distance_m * object_height_px) / (real_height * self.calibration.focal_length_px);

        info!(
            "Calibrated on {} at {:.2}m: factor={:.4}",
            class_name, known_distance_m, self.calibration.calibration_factor
        );
        true
    }

    /// Horizontal position of a box within a frame of the given width
    pub fn calculate_relative_position(&self, bbox: &BoundingBox, image_width: u32) -> Position {
        Position::from_bbox(bbox, image_width)
    }

    pub fn get_safety_level(&self, distance_m: f64) -> SafetyLevel {
        safety_level(distance_m)
    }
}
