use thiserror::Error;

#[derive(Error, Debug)]
pub enum TrafficError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Image error: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("Cannot read image '{path}': {source}")]
    ImageReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Inference error: {0}")]
    InferenceError(#[from] ort::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Failed to load model '{path}': {message}")]
    ModelLoadError { path: String, message: String },

    #[error("Unexpected model output: {message}")]
    InvalidModelOutput { message: String },

    #[error("Image processing error: {message}")]
    ProcessingError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Config,
    Io,
    Image,
    Inference,
    Processing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl TrafficError {
    pub fn processing(message: impl Into<String>) -> Self {
        Self::ProcessingError {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::IoError(_) | Self::SerializationError(_) => ErrorCategory::Io,
            Self::ImageError(_) | Self::ImageReadError { .. } => ErrorCategory::Image,
            Self::InferenceError(_) | Self::ModelLoadError { .. } | Self::InvalidModelOutput { .. } => {
                ErrorCategory::Inference
            }
            Self::ConfigValidationError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. } => ErrorCategory::Config,
            Self::ProcessingError { .. } => ErrorCategory::Processing,
        }
    }

    /// Severity drives the process exit code. A single unreadable image is
    /// recoverable (the next image can still be processed); a broken model
    /// or config is not.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::ImageError(_) | Self::ImageReadError { .. } | Self::ProcessingError { .. } => {
                ErrorSeverity::Medium
            }
            Self::ConfigValidationError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. }
            | Self::SerializationError(_)
            | Self::InvalidModelOutput { .. } => ErrorSeverity::High,
            Self::IoError(_) | Self::InferenceError(_) | Self::ModelLoadError { .. } => {
                ErrorSeverity::Critical
            }
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            Self::IoError(_) => "Check that the file exists and the output directory is writable",
            Self::ImageError(_) => "Use a valid JPEG or PNG image",
            Self::ImageReadError { .. } => "Check the image path and its permissions",
            Self::InferenceError(_) => "Verify the ONNX Runtime installation and the model file",
            Self::SerializationError(_) => "Disable the JSON report or check the output directory",
            Self::ConfigValidationError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. } => "Review the configuration file and CLI flags",
            Self::ModelLoadError { .. } => {
                "Export a YOLO model to ONNX (e.g. yolov8l.onnx) and pass it with --model"
            }
            Self::InvalidModelOutput { .. } => {
                "Use a YOLOv8-style detection model with output [1, 4 + classes, N]"
            }
            Self::ProcessingError { .. } => "Try another image",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Config => format!("Configuration problem: {}", self),
            ErrorCategory::Io => format!("File system problem: {}", self),
            ErrorCategory::Image => format!("Could not read the image: {}", self),
            ErrorCategory::Inference => format!("Vehicle detection failed: {}", self),
            ErrorCategory::Processing => format!("Image could not be processed: {}", self),
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }
}

pub type Result<T> = std::result::Result<T, TrafficError>;
