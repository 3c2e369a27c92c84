pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
use crate::utils::error::Result;
#[cfg(feature = "cli")]
use crate::utils::validation::{self, Validate};
#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use serde::{Deserialize, Serialize};
#[cfg(feature = "cli")]
use toml_config::{MonitoringConfig, TrafficConfig};

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "smart-traffic")]
#[command(about = "Count vehicles in traffic images and suggest a green-signal duration")]
pub struct CliConfig {
    /// Traffic images to process, in order (JPEG or PNG)
    #[arg(required = true)]
    pub images: Vec<String>,

    /// Path to a TOML configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// ONNX model exported from YOLO (overrides detector.model_path)
    #[arg(long)]
    pub model: Option<String>,

    /// Directory for annotated images and the count file
    #[arg(long)]
    pub output_path: Option<String>,

    /// Minimum detection confidence (overrides detector.confidence_threshold)
    #[arg(long)]
    pub confidence: Option<f32>,

    /// NMS IoU threshold (overrides detector.iou_threshold)
    #[arg(long)]
    pub iou: Option<f32>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub json_logs: bool,

    #[arg(long, help = "Also append logs to this file")]
    pub log_file: Option<String>,

    #[arg(long, help = "Log CPU and memory usage per stage")]
    pub monitor: bool,

    #[arg(long, help = "Print results without running the timed signal cycle")]
    pub no_signal: bool,

    #[arg(long, help = "Validate configuration and inputs, then exit")]
    pub dry_run: bool,
}

#[cfg(feature = "cli")]
impl CliConfig {
    /// Load the TOML file (or defaults) and apply command-line overrides on top.
    pub fn resolve(&self) -> Result<TrafficConfig> {
        let mut config = match &self.config {
            Some(path) => TrafficConfig::from_file(path)?,
            None => TrafficConfig::default(),
        };

        if let Some(model) = &self.model {
            config.detector.model_path = model.clone();
        }
        if let Some(output_path) = &self.output_path {
            config.output.output_path = output_path.clone();
        }
        if let Some(confidence) = self.confidence {
            config.detector.confidence_threshold = confidence;
        }
        if let Some(iou) = self.iou {
            config.detector.iou_threshold = iou;
        }
        if self.monitor || self.log_file.is_some() {
            let monitoring = config.monitoring.get_or_insert_with(MonitoringConfig::default);
            monitoring.enabled |= self.monitor;
            if let Some(log_file) = &self.log_file {
                monitoring.log_file = Some(log_file.clone());
            }
        }

        Ok(config)
    }
}

#[cfg(feature = "cli")]
impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_file_extensions("images", &self.images, validation::IMAGE_EXTENSIONS)?;
        if let Some(path) = &self.config {
            validation::validate_path("config", path)?;
        }
        Ok(())
    }
}

#[cfg(all(test, feature = "cli"))]
mod tests {
    use super::*;
    use crate::core::ConfigProvider;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_cli_overrides_defaults() {
        let cli = CliConfig::parse_from([
            "smart-traffic",
            "--model",
            "custom.onnx",
            "--confidence",
            "0.4",
            "--monitor",
            "junction.jpg",
        ]);

        let config = cli.resolve().unwrap();
        assert_eq!(config.model_path(), "custom.onnx");
        assert_eq!(config.confidence_threshold(), 0.4);
        assert_eq!(config.iou_threshold(), 0.7);
        assert!(config.monitoring_enabled());
        assert!(cli.validate().is_ok());
    }

    #[test]
    fn test_cli_overrides_config_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[output]\noutput_path = \"from-file\"\n\n[detector]\niou_threshold = 0.45\n")
            .unwrap();

        let path = temp_file.path().to_str().unwrap().to_string();
        let cli = CliConfig::parse_from([
            "smart-traffic",
            "-c",
            path.as_str(),
            "--output-path",
            "from-cli",
            "a.png",
        ]);

        let config = cli.resolve().unwrap();
        assert_eq!(config.output_path(), "from-cli");
        assert_eq!(config.iou_threshold(), 0.45);
    }

    #[test]
    fn test_rejects_unsupported_image_types() {
        let cli = CliConfig::parse_from(["smart-traffic", "traffic.gif"]);
        assert!(cli.validate().is_err());
    }
}
