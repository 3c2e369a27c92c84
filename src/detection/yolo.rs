use crate::core::VehicleDetector;
use crate::detection::postprocess::{decode_predictions, letterbox, non_max_suppression};
use crate::domain::model::Detection;
use crate::utils::error::{Result, TrafficError};
use image::RgbImage;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Tensor;
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy)]
pub struct DetectorSettings {
    pub input_size: u32,
    pub confidence_threshold: f32,
    pub iou_threshold: f32,
    pub num_threads: usize,
}

impl Default for DetectorSettings {
    fn default() -> Self {
        Self {
            input_size: 640,
            confidence_threshold: 0.5,
            iou_threshold: 0.7,
            num_threads: 4,
        }
    }
}

/// YOLO detector backed by an ONNX Runtime session.
pub struct YoloDetector {
    session: Mutex<Session>,
    input_name: String,
    settings: DetectorSettings,
}

impl YoloDetector {
    pub fn new(model_path: &str, settings: DetectorSettings) -> Result<Self> {
        info!("Loading YOLO model: {}", model_path);

        let load_error = |message: String| TrafficError::ModelLoadError {
            path: model_path.to_string(),
            message,
        };

        if !Path::new(model_path).is_file() {
            return Err(load_error("model file not found".to_string()));
        }

        let session = Session::builder()
            .map_err(|e| load_error(e.to_string()))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| load_error(e.to_string()))?
            .with_intra_threads(settings.num_threads)
            .map_err(|e| load_error(e.to_string()))?
            .commit_from_file(model_path)
            .map_err(|e| load_error(e.to_string()))?;

        let input_name = session
            .inputs
            .first()
            .map(|input| input.name.clone())
            .unwrap_or_else(|| "images".to_string());

        info!("✓ YOLO detector initialized (input '{}')", input_name);
        Ok(Self {
            session: Mutex::new(session),
            input_name,
            settings,
        })
    }

    /// Load `model_path`, falling back to `fallback` when the primary model
    /// cannot be loaded.
    pub fn load(
        model_path: &str,
        fallback: Option<&str>,
        settings: DetectorSettings,
    ) -> Result<Self> {
        load_with_fallback(model_path, fallback, |path| Self::new(path, settings))
    }

    fn infer(&self, input: Vec<f32>) -> Result<(Vec<i64>, Vec<f32>)> {
        let size = self.settings.input_size as usize;
        let shape = [1, 3, size, size];
        let input_value = Tensor::from_array((shape.as_slice(), input.into_boxed_slice()))?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| TrafficError::processing("detector session lock poisoned"))?;
        let outputs = session.run(ort::inputs![self.input_name.as_str() => input_value])?;

        let (output_shape, data) = outputs[0].try_extract_tensor::<f32>()?;
        debug!("Model output shape: {:?}", output_shape);

        Ok((output_shape.to_vec(), data.to_vec()))
    }
}

fn load_with_fallback<T>(
    primary: &str,
    fallback: Option<&str>,
    load: impl Fn(&str) -> Result<T>,
) -> Result<T> {
    match load(primary) {
        Err(err @ TrafficError::ModelLoadError { .. }) => match fallback {
            Some(fallback) if fallback != primary => {
                warn!("⚠️ {}; falling back to {}", err, fallback);
                load(fallback)
            }
            _ => Err(err),
        },
        loaded => loaded,
    }
}

/// Validate a `[1, 4 + classes, predictions]` output shape.
fn output_layout(shape: &[i64], len: usize) -> Result<(usize, usize)> {
    let invalid = |message: String| TrafficError::InvalidModelOutput { message };

    let &[batch, features, predictions] = shape else {
        return Err(invalid(format!("expected 3 dimensions, got {:?}", shape)));
    };
    if batch != 1 || features < 5 || predictions < 0 {
        return Err(invalid(format!("unsupported output shape {:?}", shape)));
    }

    let (features, predictions) = (features as usize, predictions as usize);
    if features * predictions != len {
        return Err(invalid(format!(
            "output has {} values, shape {:?} needs {}",
            len,
            shape,
            features * predictions
        )));
    }
    Ok((features, predictions))
}

impl VehicleDetector for YoloDetector {
    fn detect(&self, image: &RgbImage) -> Result<Vec<Detection>> {
        let (input, mapping) = letterbox(image, self.settings.input_size);
        let (shape, output) = self.infer(input)?;
        let (features, predictions) = output_layout(&shape, output.len())?;

        let candidates = decode_predictions(
            &output,
            features,
            predictions,
            &mapping,
            self.settings.confidence_threshold,
        );
        let candidate_count = candidates.len();
        let detections = non_max_suppression(candidates, self.settings.iou_threshold);

        debug!(
            "{} candidates above threshold, {} after NMS",
            candidate_count,
            detections.len()
        );
        Ok(detections)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_model_is_load_error() {
        let err = YoloDetector::new("no/such/model.onnx", DetectorSettings::default())
            .err()
            .unwrap();
        assert!(matches!(err, TrafficError::ModelLoadError { .. }));
    }

    fn fake_loader<'a>(
        available: &'static [&'static str],
        attempts: &'a std::cell::RefCell<Vec<String>>,
    ) -> impl Fn(&str) -> Result<String> + 'a {
        move |path: &str| {
            attempts.borrow_mut().push(path.to_string());
            if available.iter().any(|candidate| *candidate == path) {
                Ok(path.to_string())
            } else {
                Err(TrafficError::ModelLoadError {
                    path: path.to_string(),
                    message: "model file not found".to_string(),
                })
            }
        }
    }

    #[test]
    fn test_fallback_model_is_used_when_primary_fails() {
        let attempts = std::cell::RefCell::new(Vec::new());
        let loader = fake_loader(&["yolov8m.onnx"], &attempts);

        let chosen = load_with_fallback("yolov8l.onnx", Some("yolov8m.onnx"), loader).unwrap();

        assert_eq!(chosen, "yolov8m.onnx");
        assert_eq!(*attempts.borrow(), vec!["yolov8l.onnx", "yolov8m.onnx"]);
    }

    #[test]
    fn test_primary_model_skips_fallback() {
        let attempts = std::cell::RefCell::new(Vec::new());
        let loader = fake_loader(&["yolov8l.onnx", "yolov8m.onnx"], &attempts);

        let chosen = load_with_fallback("yolov8l.onnx", Some("yolov8m.onnx"), loader).unwrap();

        assert_eq!(chosen, "yolov8l.onnx");
        assert_eq!(attempts.borrow().len(), 1);
    }

    #[test]
    fn test_no_fallback_keeps_primary_error() {
        let attempts = std::cell::RefCell::new(Vec::new());
        let err = load_with_fallback("yolov8l.onnx", None, fake_loader(&[], &attempts)).unwrap_err();
        assert!(matches!(err, TrafficError::ModelLoadError { ref path, .. } if path == "yolov8l.onnx"));

        let err = load_with_fallback(
            "yolov8l.onnx",
            Some("yolov8m.onnx"),
            fake_loader(&[], &attempts),
        )
        .unwrap_err();
        assert!(matches!(err, TrafficError::ModelLoadError { ref path, .. } if path == "yolov8m.onnx"));
    }

    #[test]
    fn test_output_layout() {
        assert_eq!(output_layout(&[1, 84, 8400], 84 * 8400).unwrap(), (84, 8400));
        assert!(output_layout(&[84, 8400], 84 * 8400).is_err());
        assert!(output_layout(&[2, 84, 10], 2 * 84 * 10).is_err());
        assert!(output_layout(&[1, 84, 10], 100).is_err());
    }
}
