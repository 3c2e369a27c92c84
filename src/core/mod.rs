pub mod annotate;
pub mod engine;
pub mod pipeline;
pub mod preprocess;
pub mod signal;

pub use crate::domain::model::{CycleReport, DetectionOutcome, SignalPhase, TrafficImage};
pub use crate::domain::ports::{ConfigProvider, Pipeline, SignalDisplay, Storage, VehicleDetector};
pub use crate::utils::error::Result;
