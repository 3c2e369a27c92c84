use chrono::{DateTime, Local};
use image::RgbImage;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// Number of vehicle-class detections in one image.
pub type VehicleCount = u32;

/// Suggested green-light duration in whole seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GreenTimeSeconds(pub u32);

impl GreenTimeSeconds {
    pub fn as_secs(self) -> u32 {
        self.0
    }

    pub fn as_duration(self) -> Duration {
        Duration::from_secs(u64::from(self.0))
    }
}

impl fmt::Display for GreenTimeSeconds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} seconds", self.0)
    }
}

/// COCO classes that count as vehicles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VehicleClass {
    Car,
    Motorcycle,
    Bus,
    Truck,
}

impl VehicleClass {
    pub const ALL: [VehicleClass; 4] = [Self::Car, Self::Motorcycle, Self::Bus, Self::Truck];

    pub fn from_coco_id(class_id: usize) -> Option<Self> {
        match class_id {
            2 => Some(Self::Car),
            3 => Some(Self::Motorcycle),
            5 => Some(Self::Bus),
            7 => Some(Self::Truck),
            _ => None,
        }
    }

    pub fn coco_id(self) -> usize {
        match self {
            Self::Car => 2,
            Self::Motorcycle => 3,
            Self::Bus => 5,
            Self::Truck => 7,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Car => "car",
            Self::Motorcycle => "motorcycle",
            Self::Bus => "bus",
            Self::Truck => "truck",
        }
    }

    /// Box colour (RGB) used on annotated images.
    pub fn color(self) -> [u8; 3] {
        match self {
            Self::Car => [0, 255, 0],
            Self::Motorcycle => [255, 0, 0],
            Self::Bus => [0, 0, 255],
            Self::Truck => [255, 255, 0],
        }
    }
}

impl fmt::Display for VehicleClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub bbox: [f32; 4], // [x1, y1, x2, y2] in preprocessed image pixels
    pub confidence: f32,
    pub class_id: usize,
}

impl Detection {
    pub fn vehicle_class(&self) -> Option<VehicleClass> {
        VehicleClass::from_coco_id(self.class_id)
    }

    pub fn is_vehicle(&self) -> bool {
        self.vehicle_class().is_some()
    }
}

/// A decoded and preprocessed input image.
#[derive(Debug, Clone)]
pub struct TrafficImage {
    pub source: String,
    pub original_size: (u32, u32),
    pub pixels: RgbImage,
}

impl TrafficImage {
    /// File stem of the source path, used to name artifacts.
    pub fn stem(&self) -> String {
        std::path::Path::new(&self.source)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("image")
            .to_string()
    }
}

#[derive(Debug, Clone)]
pub struct DetectionOutcome {
    pub image: TrafficImage,
    pub detections: Vec<Detection>,
    pub vehicles: Vec<Detection>,
}

impl DetectionOutcome {
    pub fn from_detections(image: TrafficImage, detections: Vec<Detection>) -> Self {
        let vehicles = detections.iter().filter(|d| d.is_vehicle()).cloned().collect();
        Self {
            image,
            detections,
            vehicles,
        }
    }

    pub fn vehicle_count(&self) -> VehicleCount {
        u32::try_from(self.vehicles.len()).unwrap_or(u32::MAX)
    }

    pub fn breakdown(&self) -> BTreeMap<VehicleClass, u32> {
        let mut counts = BTreeMap::new();
        for class in self.vehicles.iter().filter_map(Detection::vehicle_class) {
            *counts.entry(class).or_insert(0) += 1;
        }
        counts
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleReport {
    pub source: String,
    pub vehicle_count: VehicleCount,
    pub breakdown: BTreeMap<VehicleClass, u32>,
    pub green_time: GreenTimeSeconds,
    pub annotated_image: Option<String>,
    pub count_file: Option<String>,
    pub processed_at: DateTime<Local>,
}

impl CycleReport {
    pub fn summary(&self) -> String {
        format!(
            "Detected Vehicles: {}\nGreen Signal Time: {}",
            self.vehicle_count, self.green_time
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalPhase {
    Off,
    Red,
    Yellow,
    Green,
}
