use crate::domain::model::Detection;
use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};
use std::cmp::Ordering;

const PAD_VALUE: u8 = 114;

/// Mapping between the square model canvas and the source image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Letterbox {
    pub scale: f32,
    pub pad_x: f32,
    pub pad_y: f32,
    pub src_width: u32,
    pub src_height: u32,
}

impl Letterbox {
    /// Canvas coordinates back to source image pixels, clamped to the image.
    pub fn unmap(&self, bbox: [f32; 4]) -> [f32; 4] {
        let max_x = self.src_width as f32;
        let max_y = self.src_height as f32;
        [
            ((bbox[0] - self.pad_x) / self.scale).clamp(0.0, max_x),
            ((bbox[1] - self.pad_y) / self.scale).clamp(0.0, max_y),
            ((bbox[2] - self.pad_x) / self.scale).clamp(0.0, max_x),
            ((bbox[3] - self.pad_y) / self.scale).clamp(0.0, max_y),
        ]
    }
}

/// Resize onto a `size x size` grey canvas and flatten to normalised CHW floats.
pub fn letterbox(image: &RgbImage, size: u32) -> (Vec<f32>, Letterbox) {
    let (src_w, src_h) = image.dimensions();
    let scale = (size as f32 / src_w as f32).min(size as f32 / src_h as f32);
    let scaled_w = ((src_w as f32 * scale) as u32).clamp(1, size);
    let scaled_h = ((src_h as f32 * scale) as u32).clamp(1, size);

    let pad_x = (size - scaled_w) / 2;
    let pad_y = (size - scaled_h) / 2;

    let resized = imageops::resize(image, scaled_w, scaled_h, FilterType::Triangle);
    let mut canvas = RgbImage::from_pixel(size, size, Rgb([PAD_VALUE; 3]));
    imageops::replace(&mut canvas, &resized, i64::from(pad_x), i64::from(pad_y));

    let plane = (size * size) as usize;
    let mut input = vec![0.0f32; 3 * plane];
    for (idx, pixel) in canvas.pixels().enumerate() {
        for c in 0..3 {
            input[c * plane + idx] = f32::from(pixel.0[c]) / 255.0;
        }
    }

    let mapping = Letterbox {
        scale,
        pad_x: pad_x as f32,
        pad_y: pad_y as f32,
        src_width: src_w,
        src_height: src_h,
    };
    (input, mapping)
}

/// Decode a YOLOv8-style `[4 + classes, predictions]` output (feature-major).
/// Each prediction is `cx, cy, w, h` followed by per-class scores.
pub fn decode_predictions(
    output: &[f32],
    features: usize,
    predictions: usize,
    mapping: &Letterbox,
    confidence_threshold: f32,
) -> Vec<Detection> {
    let num_classes = features.saturating_sub(4);
    let mut detections = Vec::new();

    for i in 0..predictions {
        let mut best_class = 0;
        let mut best_score = f32::MIN;
        for c in 0..num_classes {
            let score = output[(4 + c) * predictions + i];
            if score > best_score {
                best_score = score;
                best_class = c;
            }
        }

        if best_score < confidence_threshold {
            continue;
        }

        let cx = output[i];
        let cy = output[predictions + i];
        let w = output[2 * predictions + i];
        let h = output[3 * predictions + i];
        let bbox = mapping.unmap([cx - w / 2.0, cy - h / 2.0, cx + w / 2.0, cy + h / 2.0]);

        detections.push(Detection {
            bbox,
            confidence: best_score,
            class_id: best_class,
        });
    }

    detections
}

pub fn calculate_iou(box1: &[f32; 4], box2: &[f32; 4]) -> f32 {
    let x1 = box1[0].max(box2[0]);
    let y1 = box1[1].max(box2[1]);
    let x2 = box1[2].min(box2[2]);
    let y2 = box1[3].min(box2[3]);

    let intersection = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
    let area1 = (box1[2] - box1[0]) * (box1[3] - box1[1]);
    let area2 = (box2[2] - box2[0]) * (box2[3] - box2[1]);
    let union = area1 + area2 - intersection;

    if union > 0.0 {
        intersection / union
    } else {
        0.0
    }
}

/// Class-aware NMS: boxes only suppress boxes of the same class.
pub fn non_max_suppression(mut detections: Vec<Detection>, iou_threshold: f32) -> Vec<Detection> {
    detections.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(Ordering::Equal)
    });

    let mut keep: Vec<Detection> = Vec::with_capacity(detections.len());
    for candidate in detections {
        let suppressed = keep.iter().any(|kept| {
            kept.class_id == candidate.class_id
                && calculate_iou(&kept.bbox, &candidate.bbox) > iou_threshold
        });
        if !suppressed {
            keep.push(candidate);
        }
    }

    keep
}

#[cfg(test)]
mod tests {
    use super::*;

    fn det(class_id: usize, confidence: f32, bbox: [f32; 4]) -> Detection {
        Detection {
            bbox,
            confidence,
            class_id,
        }
    }

    #[test]
    fn test_letterbox_pads_short_side() {
        let image = RgbImage::from_pixel(200, 100, Rgb([255, 255, 255]));
        let (input, mapping) = letterbox(&image, 64);

        assert_eq!(input.len(), 3 * 64 * 64);
        assert_eq!(mapping.scale, 0.32);
        assert_eq!(mapping.pad_x, 0.0);
        assert_eq!(mapping.pad_y, 16.0);
        // top row is padding, centre row is image
        assert!((input[0] - 114.0 / 255.0).abs() < 1e-6);
        assert!((input[32 * 64 + 32] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_unmap_reverses_letterbox() {
        let mapping = Letterbox {
            scale: 0.5,
            pad_x: 0.0,
            pad_y: 80.0,
            src_width: 1280,
            src_height: 960,
        };
        let bbox = mapping.unmap([100.0, 180.0, 200.0, 280.0]);
        assert_eq!(bbox, [200.0, 200.0, 400.0, 400.0]);

        let clipped = mapping.unmap([-10.0, 0.0, 700.0, 700.0]);
        assert_eq!(clipped, [0.0, 0.0, 1280.0, 960.0]);
    }

    #[test]
    fn test_decode_predictions_picks_best_class() {
        // 3 classes, 2 predictions, feature-major layout
        let predictions = 2;
        let output = vec![
            50.0, 10.0, // cx
            50.0, 10.0, // cy
            20.0, 4.0, // w
            10.0, 4.0, // h
            0.1, 0.2, // class 0
            0.2, 0.3, // class 1
            0.9, 0.1, // class 2
        ];
        let mapping = Letterbox {
            scale: 1.0,
            pad_x: 0.0,
            pad_y: 0.0,
            src_width: 100,
            src_height: 100,
        };

        let detections = decode_predictions(&output, 7, predictions, &mapping, 0.5);

        assert_eq!(detections.len(), 1);
        assert_eq!(detections[0].class_id, 2);
        assert_eq!(detections[0].confidence, 0.9);
        assert_eq!(detections[0].bbox, [40.0, 45.0, 60.0, 55.0]);
    }

    #[test]
    fn test_iou() {
        let a = [0.0, 0.0, 10.0, 10.0];
        assert_eq!(calculate_iou(&a, &a), 1.0);
        assert_eq!(calculate_iou(&a, &[20.0, 20.0, 30.0, 30.0]), 0.0);
        let half = calculate_iou(&a, &[5.0, 0.0, 15.0, 10.0]);
        assert!((half - 1.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_nms_is_class_aware() {
        let detections = vec![
            det(2, 0.6, [0.0, 0.0, 10.0, 10.0]),
            det(2, 0.9, [1.0, 0.0, 11.0, 10.0]),
            det(7, 0.8, [0.0, 0.0, 10.0, 10.0]),
            det(2, 0.7, [50.0, 50.0, 60.0, 60.0]),
        ];

        let kept = non_max_suppression(detections, 0.7);

        assert_eq!(kept.len(), 3);
        assert_eq!(kept[0].confidence, 0.9);
        assert!(kept.iter().any(|d| d.class_id == 7));
        assert!(kept.iter().all(|d| d.confidence != 0.6));
    }
}
