//! YOLOv8 output decoding and non-maximum suppression
//!
//! Pure functions over the raw `[1, 4 + classes, boxes]` output tensor, kept
//! separate from the runtime so they can be tested without a model.

use ndarray::ArrayView2;

use crate::object::{BoundingBox, RawDetection};
use crate::PerceptionError;

/// COCO class names (80 classes)
pub const COCO_CLASSES: [&str; 80] = [
    "person", "bicycle", "car", "motorcycle", "airplane", "bus", "train", "truck",
    "boat", "traffic light", "fire hydrant", "stop sign", "parking meter", "bench",
    "bird", "cat", "dog", "horse", "sheep", "cow", "elephant", "bear", "zebra",
    "giraffe", "backpack", "umbrella", "handbag", "tie", "suitcase", "frisbee",
    "skis", "snowboard", "sports ball", "kite", "baseball bat", "baseball glove",
    "skateboard", "surfboard", "tennis racket", "bottle", "wine glass", "cup",
    "fork", "knife", "spoon", "bowl", "banana", "apple", "sandwich", "orange",
    "broccoli", "carrot", "hot dog", "pizza", "donut", "cake", "chair", "couch",
    "potted plant", "bed", "dining table", "toilet", "tv", "laptop", "mouse",
    "remote", "keyboard", "cell phone", "microwave", "oven", "toaster", "sink",
    "refrigerator", "book", "clock", "vase", "scissors", "teddy bear", "hair drier",
    "toothbrush",
];

/// Geometry of one decode call
#[derive(Debug, Clone, Copy)]
pub struct DecodeParams {
    /// Square model input size
    pub input_size: u32,
    /// Original frame width
    pub frame_width: u32,
    /// Original frame height
    pub frame_height: u32,
    /// Minimum class score kept
    pub confidence_threshold: f32,
}

/// Decode a flattened `[4 + classes, boxes]` tensor into pixel-space detections
pub fn decode_output(
    output: &[f32],
    num_classes: usize,
    params: &DecodeParams,
) -> Result<Vec<RawDetection>, PerceptionError> {
    let num_features = 4 + num_classes;
    if output.is_empty() || output.len() % num_features != 0 {
        return Err(PerceptionError::Inference(format!(
            "output length {} is not a multiple of {}",
            output.len(),
            num_features
        )));
    }
    let num_boxes = output.len() / num_features;

    let view = ArrayView2::from_shape((num_features, num_boxes), output)
        .map_err(|e| PerceptionError::Inference(e.to_string()))?;
    let rows = view.t();

    let scale_w = params.frame_width as f64 / params.input_size as f64;
    let scale_h = params.frame_height as f64 / params.input_size as f64;
    let max_x = params.frame_width as f64;
    let max_y = params.frame_height as f64;

    let mut detections = Vec::new();
    for row in rows.outer_iter() {
        let (best_class, best_score) = (0..num_classes)
            .map(|c| (c, row[4 + c]))
            .fold((0, f32::MIN), |best, cur| if cur.1 > best.1 { cur } else { best });

        if best_score < params.confidence_threshold {
            continue;
        }

        let (cx, cy, w, h) = (row[0] as f64, row[1] as f64, row[2] as f64, row[3] as f64);
        let bbox = BoundingBox::new(
            ((cx - w / 2.0) * scale_w).clamp(0.0, max_x),
            ((cy - h / 2.0) * scale_h).clamp(0.0, max_y),
            ((cx + w / 2.0) * scale_w).clamp(0.0, max_x),
            ((cy + h / 2.0) * scale_h).clamp(0.0, max_y),
        );

        detections.push(RawDetection {
            class_name: COCO_CLASSES
                .get(best_class)
                .copied()
                .unwrap_or("unknown")
                .to_string(),
            class_id: Some(best_class),
            confidence: best_score,
            bounding_box: bbox,
        });
    }

    Ok(detections)
}

/// Intersection over union of two boxes
pub fn iou(a: &BoundingBox, b: &BoundingBox) -> f64 {
    let x1 = a.x1.max(b.x1);
    let y1 = a.y1.max(b.y1);
    let x2 = a.x2.min(b.x2);
    let y2 = a.y2.min(b.y2);

    let intersection = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
    let union = a.area() + b.area() - intersection;

    if union > 0.0 {
        intersection / union
    } else {
        0.0
    }
}

/// Per-class NMS, highest confidence first
pub fn non_maximum_suppression(mut detections: Vec<RawDetection>, iou_threshold: f32) -> Vec<RawDetection> {
    detections.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

    let mut keep: Vec<RawDetection> = Vec::with_capacity(detections.len());
    for candidate in detections {
        let overlaps = keep.iter().any(|kept| {
            kept.class_id == candidate.class_id
                && iou(&kept.bounding_box, &candidate.bounding_box) > iou_threshold as f64
        });
        if !overlaps {
            keep.push(candidate);
        }
    }
    keep
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build a `[4 + classes, boxes]` tensor from per-box rows
    fn tensor(rows: &[Vec<f32>]) -> Vec<f32> {
        let features = rows[0].len();
        let mut flat = vec![0.0; features * rows.len()];
        for (b, row) in rows.iter().enumerate() {
            for (f, value) in row.iter().enumerate() {
                flat[f * rows.len() + b] = *value;
            }
        }
        flat
    }

    fn params() -> DecodeParams {
        DecodeParams {
            input_size: 640,
            frame_width: 1280,
            frame_height: 640,
            confidence_threshold: 0.5,
        }
    }

    #[test]
    fn test_coco_classes() {
        assert_eq!(COCO_CLASSES[0], "person");
        assert_eq!(COCO_CLASSES[56], "chair");
        assert_eq!(COCO_CLASSES.len(), 80);
    }

    #[test]
    fn test_decode_scales_to_frame() {
        // Two classes: person, bicycle. One strong person, one weak box.
        let output = tensor(&[
            vec![320.0, 320.0, 100.0, 200.0, 0.9, 0.1],
            vec![100.0, 100.0, 10.0, 10.0, 0.2, 0.3],
        ]);
        let detections = decode_output(&output, 2, &params()).unwrap();

        assert_eq!(detections.len(), 1);
        let person = &detections[0];
        assert_eq!(person.class_name, "person");
        assert_eq!(person.class_id, Some(0));
        assert_eq!(person.bounding_box, BoundingBox::new(540.0, 220.0, 740.0, 420.0));
    }

    #[test]
    fn test_decode_rejects_bad_shape() {
        assert!(decode_output(&[0.0; 7], 2, &params()).is_err());
        assert!(decode_output(&[], 2, &params()).is_err());
    }

    #[test]
    fn test_iou() {
        let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        let b = BoundingBox::new(5.0, 0.0, 15.0, 10.0);
        assert!((iou(&a, &b) - 50.0 / 150.0).abs() < 1e-9);
        assert_eq!(iou(&a, &BoundingBox::new(20.0, 20.0, 30.0, 30.0)), 0.0);
    }

    #[test]
    fn test_nms_suppresses_same_class_only() {
        let mut strong = RawDetection::new("person", 0.9, BoundingBox::new(0.0, 0.0, 10.0, 10.0));
        strong.class_id = Some(0);
        let mut weak = RawDetection::new("person", 0.6, BoundingBox::new(1.0, 0.0, 11.0, 10.0));
        weak.class_id = Some(0);
        let mut other = RawDetection::new("dog", 0.7, BoundingBox::new(1.0, 0.0, 11.0, 10.0));
        other.class_id = Some(16);

        let kept = non_maximum_suppression(vec![weak, other, strong], 0.45);
        let labels: Vec<&str> = kept.iter().map(|d| d.class_name.as_str()).collect();
        assert_eq!(labels, vec!["person", "dog"]);
        assert_eq!(kept[0].confidence, 0.9);
    }
}
