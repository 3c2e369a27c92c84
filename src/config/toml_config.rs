use crate::core::ConfigProvider;
use crate::domain::policy::GreenTimePolicy;
use crate::utils::error::{Result, TrafficError};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::LazyLock;
use std::time::Duration;

static ENV_VAR_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("env var pattern is a valid regex"));

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TrafficConfig {
    pub detector: DetectorConfig,
    pub preprocess: PreprocessConfig,
    pub policy: GreenTimePolicy,
    pub signal: SignalConfig,
    pub output: OutputConfig,
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    pub model_path: String,
    /// Tried when `model_path` cannot be loaded.
    pub fallback_model_path: Option<String>,
    pub confidence_threshold: f32,
    pub iou_threshold: f32,
    pub input_size: u32,
    pub num_threads: usize,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            model_path: "yolov8l.onnx".to_string(),
            fallback_model_path: Some("yolov8m.onnx".to_string()),
            confidence_threshold: 0.5,
            iou_threshold: 0.7,
            input_size: 640,
            num_threads: 4,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessConfig {
    pub max_width: u32,
    pub max_height: u32,
    pub contrast_alpha: f32,
    pub contrast_beta: f32,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            max_width: 1280,
            max_height: 720,
            contrast_alpha: 1.2,
            contrast_beta: 10.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalConfig {
    pub red_hold_ms: u64,
    pub yellow_hold_ms: u64,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            red_hold_ms: 1000,
            yellow_hold_ms: 2000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub output_path: String,
    pub save_annotated_image: bool,
    pub write_count_file: bool,
    pub write_report: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            output_path: ".".to_string(),
            save_annotated_image: true,
            write_count_file: true,
            write_report: false,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
    pub log_file: Option<String>,
}

impl TrafficConfig {
    /// Load the configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(TrafficError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| TrafficError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Expand `${VAR}` references; undefined variables are left as written.
    fn substitute_env_vars(content: &str) -> String {
        ENV_VAR_PATTERN
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .into_owned()
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_non_empty_string("detector.model_path", &self.detector.model_path)?;
        validation::validate_path("detector.model_path", &self.detector.model_path)?;
        if let Some(fallback) = &self.detector.fallback_model_path {
            validation::validate_path("detector.fallback_model_path", fallback)?;
        }
        validation::validate_range(
            "detector.confidence_threshold",
            self.detector.confidence_threshold,
            0.0,
            1.0,
        )?;
        validation::validate_range("detector.iou_threshold", self.detector.iou_threshold, 0.0, 1.0)?;
        validation::validate_range("detector.input_size", self.detector.input_size, 32, 4096)?;
        if self.detector.input_size % 32 != 0 {
            return Err(TrafficError::InvalidConfigValueError {
                field: "detector.input_size".to_string(),
                value: self.detector.input_size.to_string(),
                reason: "Value must be a multiple of 32".to_string(),
            });
        }

        validation::validate_positive_number("preprocess.max_width", self.preprocess.max_width, 1)?;
        validation::validate_positive_number(
            "preprocess.max_height",
            self.preprocess.max_height,
            1,
        )?;
        validation::validate_range(
            "preprocess.contrast_alpha",
            self.preprocess.contrast_alpha,
            0.0,
            10.0,
        )?;

        validation::validate_positive_number(
            "policy.max_green_time",
            self.policy.max_green_time,
            1,
        )?;
        if self.policy.base_green_time > self.policy.max_green_time {
            return Err(TrafficError::InvalidConfigValueError {
                field: "policy.base_green_time".to_string(),
                value: self.policy.base_green_time.to_string(),
                reason: format!(
                    "Base green time must not exceed max_green_time ({})",
                    self.policy.max_green_time
                ),
            });
        }

        validation::validate_path("output.output_path", &self.output.output_path)?;
        if let Some(log_file) = self.log_file() {
            validation::validate_path("monitoring.log_file", log_file)?;
        }

        Ok(())
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }

    pub fn log_file(&self) -> Option<&str> {
        self.monitoring.as_ref().and_then(|m| m.log_file.as_deref())
    }
}

impl ConfigProvider for TrafficConfig {
    fn model_path(&self) -> &str {
        &self.detector.model_path
    }

    fn fallback_model_path(&self) -> Option<&str> {
        self.detector.fallback_model_path.as_deref()
    }

    fn output_path(&self) -> &str {
        &self.output.output_path
    }

    fn confidence_threshold(&self) -> f32 {
        self.detector.confidence_threshold
    }

    fn iou_threshold(&self) -> f32 {
        self.detector.iou_threshold
    }

    fn max_image_size(&self) -> (u32, u32) {
        (self.preprocess.max_width, self.preprocess.max_height)
    }

    fn contrast(&self) -> (f32, f32) {
        (self.preprocess.contrast_alpha, self.preprocess.contrast_beta)
    }

    fn policy(&self) -> GreenTimePolicy {
        self.policy
    }

    fn save_annotated_image(&self) -> bool {
        self.output.save_annotated_image
    }

    fn write_count_file(&self) -> bool {
        self.output.write_count_file
    }

    fn write_report(&self) -> bool {
        self.output.write_report
    }

    fn red_hold(&self) -> Duration {
        Duration::from_millis(self.signal.red_hold_ms)
    }

    fn yellow_hold(&self) -> Duration {
        Duration::from_millis(self.signal.yellow_hold_ms)
    }
}

impl Validate for TrafficConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
