use crate::core::annotate::{draw_vehicle_boxes, encode_jpeg};
use crate::core::preprocess::{enhance_contrast, fit_within};
use crate::core::{
    ConfigProvider, CycleReport, DetectionOutcome, Pipeline, Storage, TrafficImage,
    VehicleDetector,
};
use crate::utils::error::{Result, TrafficError};
use chrono::Local;
use std::sync::atomic::{AtomicU64, Ordering};

pub const COUNT_FILE: &str = "vehicle_count.txt";
const IMAGE_DIR: &str = "images";
const REPORT_DIR: &str = "reports";

/// Image -> detections -> vehicle count -> green time, with debug artifacts
/// written through `Storage`.
pub struct DetectionPipeline<S: Storage, C: ConfigProvider, D: VehicleDetector> {
    storage: S,
    config: C,
    detector: D,
    sequence: AtomicU64,
}

impl<S: Storage, C: ConfigProvider, D: VehicleDetector> DetectionPipeline<S, C, D> {
    pub fn new(storage: S, config: C, detector: D) -> Self {
        Self {
            storage,
            config,
            detector,
            sequence: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &C {
        &self.config
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider, D: VehicleDetector> Pipeline for DetectionPipeline<S, C, D> {
    async fn extract(&self, source: &str) -> Result<TrafficImage> {
        // A failed image must not leave the previous image's count behind.
        if self.config.write_count_file() {
            self.storage.remove_file(COUNT_FILE).await?;
        }

        tracing::debug!("Reading image: {}", source);
        let bytes = tokio::fs::read(source)
            .await
            .map_err(|e| TrafficError::ImageReadError {
                path: source.to_string(),
                source: e,
            })?;

        let mut pixels = image::load_from_memory(&bytes)?.to_rgb8();
        let original_size = pixels.dimensions();
        if original_size.0 == 0 || original_size.1 == 0 {
            return Err(TrafficError::processing(format!("{} is empty", source)));
        }
        tracing::debug!("Image loaded: {}x{}", original_size.0, original_size.1);

        let (alpha, beta) = self.config.contrast();
        enhance_contrast(&mut pixels, alpha, beta);

        let (max_width, max_height) = self.config.max_image_size();
        let pixels = fit_within(pixels, max_width, max_height)?;

        Ok(TrafficImage {
            source: source.to_string(),
            original_size,
            pixels,
        })
    }

    async fn transform(&self, image: TrafficImage) -> Result<DetectionOutcome> {
        let detections = self.detector.detect(&image.pixels)?;
        let outcome = DetectionOutcome::from_detections(image, detections);

        tracing::debug!(
            "Detection complete: {} objects, {} vehicles {:?}",
            outcome.detections.len(),
            outcome.vehicle_count(),
            outcome.breakdown()
        );
        Ok(outcome)
    }

    async fn load(&self, outcome: DetectionOutcome) -> Result<CycleReport> {
        let vehicle_count = outcome.vehicle_count();
        let green_time = self.config.policy().green_time(vehicle_count);
        let processed_at = Local::now();
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed);
        let artifact = format!(
            "{}_{}_{}",
            outcome.image.stem(),
            processed_at.format("%Y%m%d%H%M%S"),
            sequence
        );

        let annotated_image = if self.config.save_annotated_image() {
            let mut canvas = outcome.image.pixels.clone();
            draw_vehicle_boxes(&mut canvas, &outcome.vehicles);
            let jpeg = encode_jpeg(&canvas)?;

            let path = format!("{}/output_{}.jpg", IMAGE_DIR, artifact);
            self.storage.write_file(&path, &jpeg).await?;
            tracing::debug!("Annotated image saved: {}", path);
            Some(self.storage.resolve(&path))
        } else {
            None
        };

        let count_file = if self.config.write_count_file() {
            self.storage
                .write_file(COUNT_FILE, vehicle_count.to_string().as_bytes())
                .await?;
            Some(self.storage.resolve(COUNT_FILE))
        } else {
            None
        };

        let report = CycleReport {
            source: outcome.image.source.clone(),
            vehicle_count,
            breakdown: outcome.breakdown(),
            green_time,
            annotated_image,
            count_file,
            processed_at,
        };

        if self.config.write_report() {
            let path = format!("{}/report_{}.json", REPORT_DIR, artifact);
            let json = serde_json::to_vec_pretty(&report)?;
            self.storage.write_file(&path, &json).await?;
            tracing::debug!("Report saved: {}", path);
        }

        Ok(report)
    }
}
