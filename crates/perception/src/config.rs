//! Perception configuration

use serde::{Deserialize, Serialize};

/// Physical lens description used to derive the focal length in pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LensSpec {
    /// Lens focal length (millimeters)
    pub focal_length_mm: f64,

    /// Sensor height (millimeters)
    pub sensor_height_mm: f64,
}

impl LensSpec {
    /// Focal length in pixels for a given image height.
    ///
    /// Returns `None` for a non-positive sensor height.
    pub fn focal_length_px(&self, image_height_px: u32) -> Option<f64> {
        if self.sensor_height_mm <= 0.0 || self.focal_length_mm <= 0.0 {
            return None;
        }
        Some((self.focal_length_mm / self.sensor_height_mm) * image_height_px as f64)
    }
}

/// Perception configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerceptionConfig {
    /// YOLOv8 ONNX model path (mock detector when unset)
    pub model_path: Option<String>,

    /// Detector confidence threshold
    pub confidence_threshold: f32,

    /// Detector IoU threshold for NMS
    pub iou_threshold: f32,

    /// Square model input size
    pub input_size: u32,

    /// Lens specs, if known
    pub lens: Option<LensSpec>,

    /// Explicit focal length in pixels, overrides lens specs
    pub focal_length_px: Option<f64>,

    /// Initial multiplicative bias applied to every distance
    pub calibration_factor: f64,
}

impl Default for PerceptionConfig {
    fn default() -> Self {
        Self {
            model_path: None,
            confidence_threshold: 0.5,
            iou_threshold: 0.45,
            input_size: 640,
            lens: None,
            focal_length_px: None,
            calibration_factor: 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lens_focal_length() {
        let lens = LensSpec {
            focal_length_mm: 4.0,
            sensor_height_mm: 6.0,
        };
        let f = lens.focal_length_px(480).unwrap();
        assert!((f - 320.0).abs() < 1e-9);
    }

    #[test]
    fn test_degenerate_lens() {
        let lens = LensSpec {
            focal_length_mm: 4.0,
            sensor_height_mm: 0.0,
        };
        assert!(lens.focal_length_px(480).is_none());
    }
}
