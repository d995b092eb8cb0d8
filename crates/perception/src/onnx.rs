//! YOLOv8 detector on ONNX Runtime

use std::path::Path;
use std::sync::Mutex;

use camera_capture::VideoFrame;
use image::imageops::FilterType;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::{Tensor, Value};
use tracing::{debug, error, info};

use crate::detector::ObjectDetector;
use crate::object::RawDetection;
use crate::yolo::{decode_output, non_maximum_suppression, DecodeParams, COCO_CLASSES};
use crate::{PerceptionConfig, PerceptionError};

/// YOLOv8 object detector
pub struct OnnxDetector {
    session: Mutex<Session>,
    input_size: u32,
    confidence_threshold: f32,
    iou_threshold: f32,
}

impl OnnxDetector {
    /// Load the model named in the config
    pub fn new(model_path: &str, config: &PerceptionConfig) -> Result<Self, PerceptionError> {
        if !Path::new(model_path).exists() {
            return Err(PerceptionError::ModelLoad(format!("model not found: {}", model_path)));
        }

        info!("Loading detection model from {}", model_path);
        let session = Session::builder()
            .and_then(|b| b.with_optimization_level(GraphOptimizationLevel::Level3))
            .and_then(|b| b.commit_from_file(model_path))
            .map_err(|e| {
                error!("Failed to load detection model: {}", e);
                PerceptionError::ModelLoad(e.to_string())
            })?;

        Ok(Self {
            session: Mutex::new(session),
            input_size: config.input_size,
            confidence_threshold: config.confidence_threshold,
            iou_threshold: config.iou_threshold,
        })
    }

    /// Resize to the model input and lay out as normalized NCHW
    fn preprocess(&self, frame: &VideoFrame) -> Result<Value, PerceptionError> {
        let img = frame.to_rgb_image()?;
        let size = self.input_size;
        let resized = image::imageops::resize(&img, size, size, FilterType::Triangle);

        let plane = (size * size) as usize;
        let mut chw = vec![0.0f32; 3 * plane];
        for (x, y, pixel) in resized.enumerate_pixels() {
            let idx = (y * size + x) as usize;
            chw[idx] = pixel[0] as f32 / 255.0;
            chw[plane + idx] = pixel[1] as f32 / 255.0;
            chw[2 * plane + idx] = pixel[2] as f32 / 255.0;
        }

        let shape = vec![1usize, 3, size as usize, size as usize];
        Tensor::from_array((shape, chw.into_boxed_slice()))
            .map(Value::from)
            .map_err(|e| PerceptionError::Inference(e.to_string()))
    }

    fn run(&self, input: Value) -> Result<Vec<f32>, PerceptionError> {
        let mut session = self
            .session
            .lock()
            .map_err(|_| PerceptionError::Inference("session lock poisoned".to_string()))?;

        let outputs = session
            .run(ort::inputs![input])
            .map_err(|e| PerceptionError::Inference(e.to_string()))?;

        let (_, data) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| PerceptionError::Inference(e.to_string()))?;

        Ok(data.to_vec())
    }
}

impl ObjectDetector for OnnxDetector {
    fn detect(&self, frame: &VideoFrame) -> Result<Vec<RawDetection>, PerceptionError> {
        frame.validate()?;

        let input = self.preprocess(frame)?;
        let output = self.run(input)?;

        let params = DecodeParams {
            input_size: self.input_size,
            frame_width: frame.width,
            frame_height: frame.height,
            confidence_threshold: self.confidence_threshold,
        };
        let candidates = decode_output(&output, COCO_CLASSES.len(), &params)?;
        let detections = non_maximum_suppression(candidates, self.iou_threshold);

        debug!("ONNX detector: {} detections in frame {}", detections.len(), frame.sequence);
        Ok(detections)
    }

    fn name(&self) -> &'static str {
        "yolov8-onnx"
    }

    fn model_loaded(&self) -> bool {
        true
    }
}
