pub mod config;
pub mod core;
pub mod detection;
pub mod domain;
pub mod utils;

pub use config::cli::LocalStorage;
#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::toml_config::TrafficConfig;

pub use core::{
    engine::TrafficEngine,
    pipeline::DetectionPipeline,
    signal::{SignalController, SignalTimings, TerminalDisplay},
};
pub use detection::{DetectorSettings, YoloDetector};
pub use domain::model::{CycleReport, Detection, GreenTimeSeconds, VehicleClass, VehicleCount};
pub use domain::policy::{adjust_green_signal_time, GreenTimePolicy};
pub use utils::error::{Result, TrafficError};
