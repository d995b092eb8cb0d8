//! Detection adapter

use camera_capture::VideoFrame;
use tracing::debug;

use crate::object::RawDetection;
use crate::PerceptionError;

/// Object detector backend
pub trait ObjectDetector: Send + Sync {
    /// Detect objects in a frame
    fn detect(&self, frame: &VideoFrame) -> Result<Vec<RawDetection>, PerceptionError>;

    /// Backend name for health reporting
    fn name(&self) -> &'static str;

    /// Whether a real model backs this detector
    fn model_loaded(&self) -> bool {
        false
    }
}

/// Detector used when no model is configured.
///
/// Returns a fixed list of detections for every frame (empty by default),
/// so the rest of the pipeline runs without a model.
#[derive(Debug, Clone, Default)]
pub struct MockDetector {
    detections: Vec<RawDetection>,
}

impl MockDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report these detections for every frame
    pub fn scripted(detections: Vec<RawDetection>) -> Self {
        Self { detections }
    }
}

impl ObjectDetector for MockDetector {
    fn detect(&self, frame: &VideoFrame) -> Result<Vec<RawDetection>, PerceptionError> {
        debug!(
            "Mock detector: frame {} ({}x{}), {} scripted detections",
            frame.sequence,
            frame.width,
            frame.height,
            self.detections.len()
        );
        Ok(self.detections.clone())
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
