use crate::core::{CycleReport, Pipeline};
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;

pub struct TrafficEngine<P: Pipeline> {
    pipeline: P,
    monitor: SystemMonitor,
}

impl<P: Pipeline> TrafficEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    pub fn pipeline(&self) -> &P {
        &self.pipeline
    }

    /// Process one image. Any failure before the count is known returns
    /// early, so the green-time policy only ever sees a real count.
    pub async fn run(&self, source: &str) -> Result<CycleReport> {
        tracing::info!("🚦 Processing image: {}", source);
        self.monitor.log_stats("Start");

        let image = self.pipeline.extract(source).await?;
        tracing::info!(
            "🖼️ Image prepared: {}x{} (original {}x{})",
            image.pixels.width(),
            image.pixels.height(),
            image.original_size.0,
            image.original_size.1
        );
        self.monitor.log_stats("Extract");

        let outcome = self.pipeline.transform(image).await?;
        tracing::info!(
            "🚗 Detected {} vehicles ({} objects total)",
            outcome.vehicle_count(),
            outcome.detections.len()
        );
        self.monitor.log_stats("Detect");

        let report = self.pipeline.load(outcome).await?;
        tracing::info!(
            "🟢 Green signal time: {} for {} vehicles",
            report.green_time,
            report.vehicle_count
        );
        self.monitor.log_stats("Load");

        Ok(report)
    }

    /// Process images in order; each result is returned, failures included.
    pub async fn run_all(&self, sources: &[String]) -> Vec<(String, Result<CycleReport>)> {
        let mut results = Vec::with_capacity(sources.len());
        for source in sources {
            let result = self.run(source).await;
            if let Err(e) = &result {
                tracing::warn!("⚠️ Skipping {}: {}", source, e);
            }
            results.push((source.clone(), result));
        }
        self.monitor.log_final_stats();
        results
    }
}
