// Detector adapters: ONNX YOLO inference plus the model-independent
// letterbox / decode / NMS steps.

pub mod postprocess;
pub mod yolo;

pub use yolo::{DetectorSettings, YoloDetector};
