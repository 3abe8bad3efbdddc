use serde::{Deserialize, Serialize};

use crate::models::signal::{SignalMode, SignalStatus, SignalTiming, TrafficSignal};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RegionStatus {
    Normal,
    Congested,
    Emergency,
}

/// A named group of signals shown together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Region {
    pub id: String,
    pub name: String,
    pub signals: Vec<TrafficSignal>,
    pub status: RegionStatus,
    pub current_mode: SignalMode,
}

impl Region {
    pub fn new(id: &str, name: &str, status: RegionStatus, current_mode: SignalMode) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            signals: Vec::new(),
            status,
            current_mode,
        }
    }

    pub fn with_signal(mut self, signal: TrafficSignal) -> Self {
        self.signals.push(signal);
        self
    }

    /// Sum of the member signals' vehicle counts. Negative readings count as zero.
    pub fn total_vehicles(&self) -> u64 {
        self.signals
            .iter()
            .map(|s| s.vehicle_count.max(0) as u64)
            .sum()
    }
}

/// Builds the fixed set of regions the dashboard starts from.
pub fn create_regions() -> Vec<Region> {
    let short_green = SignalTiming {
        green_time: 30,
        ..SignalTiming::default()
    };

    vec![
        Region::new("1", "Main Street", RegionStatus::Normal, SignalMode::VehicleCount)
            .with_signal(
                TrafficSignal::new(
                    "1",
                    "Main Street",
                    1,
                    51.505,
                    -0.09,
                    SignalStatus::Green,
                    SignalMode::VehicleCount,
                    35,
                    true,
                )
                .with_recommendation(SignalStatus::Green, 60, "High traffic volume detected"),
            )
            .with_signal(
                TrafficSignal::new(
                    "2",
                    "Main Street",
                    2,
                    51.506,
                    -0.1,
                    SignalStatus::Red,
                    SignalMode::VehicleCount,
                    12,
                    false,
                )
                .with_timing(short_green),
            ),
        Region::new("2", "Downtown", RegionStatus::Congested, SignalMode::Night)
            .with_signal(
                TrafficSignal::new(
                    "3",
                    "Downtown",
                    1,
                    51.507,
                    -0.11,
                    SignalStatus::Red,
                    SignalMode::Night,
                    28,
                    true,
                )
                .with_timing(short_green),
            )
            .with_signal(
                TrafficSignal::new(
                    "4",
                    "Downtown",
                    2,
                    51.508,
                    -0.12,
                    SignalStatus::Green,
                    SignalMode::VehicleCount,
                    42,
                    false,
                )
                .with_recommendation(SignalStatus::Green, 55, "Increasing traffic trend"),
            ),
    ]
}
