use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::global_variables::{
    DEFAULT_GREEN_TIME, DEFAULT_MIN_PEDESTRIAN_TIME, DEFAULT_RED_TIME, DEFAULT_YELLOW_TIME,
};

/// The light currently shown by a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SignalStatus {
    Red,
    Yellow,
    Green,
    FlashingYellow,
    FlashingRed,
}

impl std::fmt::Display for SignalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let name = match self {
            SignalStatus::Red => "red",
            SignalStatus::Yellow => "yellow",
            SignalStatus::Green => "green",
            SignalStatus::FlashingYellow => "flashing-yellow",
            SignalStatus::FlashingRed => "flashing-red",
        };
        write!(f, "{}", name)
    }
}

/// The policy currently governing how a signal's status is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SignalMode {
    VehicleCount,
    Night,
    Emergency,
    Manual,
}

impl std::fmt::Display for SignalMode {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let name = match self {
            SignalMode::VehicleCount => "vehicle-count",
            SignalMode::Night => "night",
            SignalMode::Emergency => "emergency",
            SignalMode::Manual => "manual",
        };
        write!(f, "{}", name)
    }
}

/// Durations (seconds) of one signal cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalTiming {
    pub green_time: u32,
    pub yellow_time: u32,
    pub red_time: u32,
    pub minimum_pedestrian_time: u32,
}

impl Default for SignalTiming {
    fn default() -> Self {
        Self {
            green_time: DEFAULT_GREEN_TIME,
            yellow_time: DEFAULT_YELLOW_TIME,
            red_time: DEFAULT_RED_TIME,
            minimum_pedestrian_time: DEFAULT_MIN_PEDESTRIAN_TIME,
        }
    }
}

impl SignalTiming {
    /// Same profile with a new green time, never shorter than the pedestrian minimum.
    pub fn with_green_time(self, green_time: u32) -> Self {
        Self {
            green_time: green_time.max(self.minimum_pedestrian_time),
            ..self
        }
    }

    /// Lifts the green time to the pedestrian minimum if it falls short.
    pub fn normalized(self) -> Self {
        self.with_green_time(self.green_time)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiRecommendation {
    pub suggested_status: SignalStatus,
    /// Suggested green time in seconds.
    pub suggested_timing: u32,
    pub reason: String,
}

/// Snapshot of a single lane controller as reported by the telemetry feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrafficSignal {
    pub id: String,
    pub status: SignalStatus,
    pub location: Location,
    pub timing: SignalTiming,
    pub region: String,
    pub lane: u32,
    // Signed because feed readings are not validated upstream.
    pub vehicle_count: i64,
    pub mode: SignalMode,
    pub is_main_road: bool,
    pub last_update: DateTime<Local>,
    pub emergency_override: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_recommendation: Option<AiRecommendation>,
}

impl TrafficSignal {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: &str,
        region: &str,
        lane: u32,
        lat: f64,
        lng: f64,
        status: SignalStatus,
        mode: SignalMode,
        vehicle_count: i64,
        is_main_road: bool,
    ) -> Self {
        Self {
            id: id.to_string(),
            status,
            location: Location { lat, lng },
            timing: SignalTiming::default(),
            region: region.to_string(),
            lane,
            vehicle_count,
            mode,
            is_main_road,
            last_update: Local::now(),
            emergency_override: false,
            ai_recommendation: None,
        }
    }

    pub fn with_timing(mut self, timing: SignalTiming) -> Self {
        self.timing = timing;
        self
    }

    pub fn with_recommendation(
        mut self,
        suggested_status: SignalStatus,
        suggested_timing: u32,
        reason: &str,
    ) -> Self {
        self.ai_recommendation = Some(AiRecommendation {
            suggested_status,
            suggested_timing,
            reason: reason.to_string(),
        });
        self
    }
}
