use crate::domain::model::{GreenTimeSeconds, VehicleCount};
use serde::{Deserialize, Serialize};

pub const BASE_GREEN_TIME: u32 = 20;
pub const VEHICLE_MULTIPLIER: u32 = 1;
pub const MAX_GREEN_TIME: u32 = 60;

/// Linear green-time policy capped at `max_green_time`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GreenTimePolicy {
    pub base_green_time: u32,
    pub vehicle_multiplier: u32,
    pub max_green_time: u32,
}

impl Default for GreenTimePolicy {
    fn default() -> Self {
        Self {
            base_green_time: BASE_GREEN_TIME,
            vehicle_multiplier: VEHICLE_MULTIPLIER,
            max_green_time: MAX_GREEN_TIME,
        }
    }
}

impl GreenTimePolicy {
    pub fn green_time(&self, vehicle_count: VehicleCount) -> GreenTimeSeconds {
        let extra = vehicle_count.saturating_mul(self.vehicle_multiplier);
        GreenTimeSeconds(
            self.base_green_time
                .saturating_add(extra)
                .min(self.max_green_time),
        )
    }
}

/// Green time for `vehicle_count` under the default 20s + 1s/vehicle, 60s cap policy.
pub fn adjust_green_signal_time(vehicle_count: VehicleCount) -> GreenTimeSeconds {
    GreenTimePolicy::default().green_time(vehicle_count)
}
