//! Perception Pipeline
//!
//! Frame analysis for the navigation assistant:
//! - Object detection (YOLOv8 on ONNX Runtime, or a mock backend)
//! - Monocular distance estimation (pinhole model + object height table)
//! - Safety tiers and horizontal position per object
//! - Scene aggregation with an overall safety status

pub mod config;
pub mod detector;
pub mod distance;
pub mod object;
pub mod scene;
pub mod yolo;

#[cfg(feature = "onnx")]
pub mod onnx;

pub use config::{LensSpec, PerceptionConfig};
pub use detector::{MockDetector, ObjectDetector};
pub use distance::{safety_level, CameraCalibration, DistanceEstimator, UNKNOWN_DISTANCE};
pub use object::{BoundingBox, Detection, Position, RawDetection, SafetyLevel};
pub use scene::{SafetyStatus, SceneRecord};

use std::sync::Arc;
use std::time::Instant;

use camera_capture::{CameraError, VideoFrame};
use chrono::Utc;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Perception error types
#[derive(Error, Debug)]
pub enum PerceptionError {
    #[error("Model loading failed: {0}")]
    ModelLoad(String),

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Invalid frame: {0}")]
    InvalidFrame(#[from] CameraError),

    #[error("Distance estimator not initialized (no frame processed yet)")]
    NotInitialized,
}

/// Result of processing one frame
#[derive(Debug, Clone, Serialize)]
pub struct FrameAnalysis {
    /// Aggregated scene
    pub scene: SceneRecord,

    /// Processing latency (milliseconds)
    pub latency_ms: f64,

    /// Frame sequence number
    pub sequence: u32,
}

/// Running processing statistics
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct PerceptionStats {
    pub frames_processed: u64,
    pub average_latency_ms: f64,
}

/// Perception module: detector plus the per-session calibration state
pub struct PerceptionModule {
    config: PerceptionConfig,
    detector: Arc<dyn ObjectDetector>,
    estimator: Option<DistanceEstimator>,
    frame_count: u64,
    total_latency_ms: f64,
}

impl PerceptionModule {
    /// Create a module around an existing detector
    pub fn new(config: PerceptionConfig, detector: Box<dyn ObjectDetector>) -> Self {
        info!("Perception module using '{}' detector", detector.name());
        Self {
            config,
            detector: Arc::from(detector),
            estimator: None,
            frame_count: 0,
            total_latency_ms: 0.0,
        }
    }

    /// Create a module, loading the configured model when possible.
    ///
    /// A model that cannot be loaded leaves the module on the mock
    /// detector, which reports no objects.
    pub fn from_config(config: PerceptionConfig) -> Self {
        let detector = Self::build_detector(&config);
        Self::new(config, detector)
    }

    #[cfg(feature = "onnx")]
    fn build_detector(config: &PerceptionConfig) -> Box<dyn ObjectDetector> {
        let Some(path) = &config.model_path else {
            warn!("No detection model path configured. Using mock detector.");
            return Box::new(MockDetector::new());
        };
        match onnx::OnnxDetector::new(path, config) {
            Ok(detector) => Box::new(detector),
            Err(e) => {
                warn!("Could not load detection model: {}. Using mock detector.", e);
                Box::new(MockDetector::new())
            }
        }
    }

    #[cfg(not(feature = "onnx"))]
    fn build_detector(config: &PerceptionConfig) -> Box<dyn ObjectDetector> {
        if let Some(path) = &config.model_path {
            warn!(
                "Model {} configured but ONNX support is not compiled in. Using mock detector.",
                path
            );
        }
        Box::new(MockDetector::new())
    }

    /// Shared handle to the detector, for running inference off the caller's
    /// lock (see [`detect`])
    pub fn detector(&self) -> Arc<dyn ObjectDetector> {
        Arc::clone(&self.detector)
    }

    /// Detect, estimate and aggregate one frame
    pub fn process(&mut self, frame: &VideoFrame) -> Result<FrameAnalysis, PerceptionError> {
        let started = Instant::now();
        let raw = detect(self.detector.as_ref(), frame)?;
        Ok(self.analyze(frame, raw, started))
    }

    /// Estimate distances for already detected objects and aggregate them.
    ///
    /// `started` marks when work on the frame began; latency is measured
    /// from there.
    pub fn analyze(&mut self, frame: &VideoFrame, raw: Vec<RawDetection>, started: Instant) -> FrameAnalysis {
        let config = &self.config;
        let estimator = self
            .estimator
            .get_or_insert_with(|| DistanceEstimator::for_image(frame.height, config));

        let detections: Vec<Detection> = raw
            .into_iter()
            .map(|r| enrich(estimator, r, frame.width))
            .collect();

        let scene = SceneRecord::aggregate(detections, Utc::now());

        let latency_ms = started.elapsed().as_secs_f64() * 1000.0;
        self.frame_count += 1;
        self.total_latency_ms += latency_ms;

        debug!(
            "Frame {}: {} objects, {} critical, status '{}' ({:.1}ms)",
            frame.sequence,
            scene.num_objects,
            scene.critical_alerts.len(),
            scene.safety_status,
            latency_ms
        );

        FrameAnalysis {
            scene,
            latency_ms,
            sequence: frame.sequence,
        }
    }

    /// Recalibrate from a reference object at a known distance
    pub fn calibrate(
        &mut self,
        bbox: &BoundingBox,
        class_name: &str,
        known_distance_m: f64,
    ) -> Result<CameraCalibration, PerceptionError> {
        let estimator = self.estimator.as_mut().ok_or(PerceptionError::NotInitialized)?;
        estimator.calibrate(bbox, class_name, known_distance_m);
        Ok(estimator.calibration())
    }

    /// Current calibration, once the first frame has been seen
    pub fn calibration(&self) -> Option<CameraCalibration> {
        self.estimator.as_ref().map(|e| e.calibration())
    }

    pub fn detector_name(&self) -> &'static str {
        self.detector.name()
    }

    pub fn model_loaded(&self) -> bool {
        self.detector.model_loaded()
    }

    pub fn config(&self) -> &PerceptionConfig {
        &self.config
    }

    pub fn stats(&self) -> PerceptionStats {
        PerceptionStats {
            frames_processed: self.frame_count,
            average_latency_ms: if self.frame_count == 0 {
                0.0
            } else {
                self.total_latency_ms / self.frame_count as f64
            },
        }
    }
}

/// Validate a frame and run the detector on it.
///
/// Touches no calibration state, so it can run on a blocking thread while
/// the module itself stays available.
pub fn detect(detector: &dyn ObjectDetector, frame: &VideoFrame) -> Result<Vec<RawDetection>, PerceptionError> {
    frame.validate()?;
    detector.detect(frame)
}

/// Attach distance, position and safety tier to a raw detection
pub fn enrich(estimator: &DistanceEstimator, raw: RawDetection, image_width: u32) -> Detection {
    let distance_m = estimator.estimate_distance(&raw.bounding_box, &raw.class_name);
    Detection {
        position: estimator.calculate_relative_position(&raw.bounding_box, image_width),
        safety_level: estimator.get_safety_level(distance_m),
        distance_m,
        confidence: (raw.confidence * 100.0).round() / 100.0,
        class_id: raw.class_id,
        bounding_box: raw.bounding_box,
        class_name: raw.class_name,
    }
}
