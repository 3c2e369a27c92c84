use crate::domain::model::{CycleReport, Detection, DetectionOutcome, SignalPhase, TrafficImage};
use crate::domain::policy::GreenTimePolicy;
use crate::utils::error::Result;
use async_trait::async_trait;
use image::RgbImage;
use std::time::Duration;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
    /// Deletes `path`; a file that is already absent is not an error.
    fn remove_file(&self, path: &str) -> impl std::future::Future<Output = Result<()>> + Send;
    /// Path as it will appear on disk, for reporting.
    fn resolve(&self, path: &str) -> String;
}

pub trait ConfigProvider: Send + Sync {
    fn model_path(&self) -> &str;
    fn fallback_model_path(&self) -> Option<&str>;
    fn output_path(&self) -> &str;
    fn confidence_threshold(&self) -> f32;
    fn iou_threshold(&self) -> f32;
    fn max_image_size(&self) -> (u32, u32);
    fn contrast(&self) -> (f32, f32);
    fn policy(&self) -> GreenTimePolicy;
    fn save_annotated_image(&self) -> bool;
    fn write_count_file(&self) -> bool;
    fn write_report(&self) -> bool;
    fn red_hold(&self) -> Duration;
    fn yellow_hold(&self) -> Duration;
}

/// Object detector over a preprocessed RGB image. Returns every detection,
/// vehicle or not; counting is up to the caller.
pub trait VehicleDetector: Send + Sync {
    fn detect(&self, image: &RgbImage) -> Result<Vec<Detection>>;
}

pub trait SignalDisplay: Send + Sync {
    fn show_phase(&self, phase: SignalPhase);
    fn show_result(&self, report: &CycleReport);
    fn clear(&self);
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self, source: &str) -> Result<TrafficImage>;
    async fn transform(&self, image: TrafficImage) -> Result<DetectionOutcome>;
    async fn load(&self, outcome: DetectionOutcome) -> Result<CycleReport>;
}
