use serde::{Deserialize, Serialize};

use crate::config::ControlConfig;
use crate::error::{Result, SignalError};
use crate::global_variables::{
    HIGH_TRAFFIC_GREEN, HIGH_TRAFFIC_LIMIT, LOW_TRAFFIC_GREEN, LOW_TRAFFIC_LIMIT,
    MEDIUM_TRAFFIC_GREEN, NIGHT_END_HOUR, NIGHT_START_HOUR,
};
use crate::models::signal::{SignalMode, SignalStatus, SignalTiming, TrafficSignal};

/// The subset of a signal the policy reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PolicyInputs {
    pub vehicle_count: i64,
    pub emergency_override: bool,
    pub is_main_road: bool,
    /// Carried through unchanged in vehicle-count mode.
    pub current_status: SignalStatus,
}

impl From<&TrafficSignal> for PolicyInputs {
    fn from(signal: &TrafficSignal) -> Self {
        Self {
            vehicle_count: signal.vehicle_count,
            emergency_override: signal.emergency_override,
            is_main_road: signal.is_main_road,
            current_status: signal.status,
        }
    }
}

/// Result of one policy evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimingDecision {
    pub mode: SignalMode,
    pub status: SignalStatus,
    pub timing: SignalTiming,
}

/// Mode and timing selection for a single signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimingPolicy {
    pub default_timing: SignalTiming,
    pub night_start_hour: u32,
    pub night_end_hour: u32,
}

impl Default for TimingPolicy {
    fn default() -> Self {
        Self {
            default_timing: SignalTiming::default(),
            night_start_hour: NIGHT_START_HOUR,
            night_end_hour: NIGHT_END_HOUR,
        }
    }
}

impl From<&ControlConfig> for TimingPolicy {
    fn from(config: &ControlConfig) -> Self {
        Self {
            default_timing: config.default_timing.normalized(),
            night_start_hour: config.night_start_hour,
            night_end_hour: config.night_end_hour,
        }
    }
}

/// Green time for a vehicle count, before the pedestrian minimum is applied.
pub fn green_time_for_count(vehicle_count: u32) -> u32 {
    if vehicle_count < LOW_TRAFFIC_LIMIT {
        LOW_TRAFFIC_GREEN
    } else if vehicle_count <= HIGH_TRAFFIC_LIMIT {
        MEDIUM_TRAFFIC_GREEN
    } else {
        HIGH_TRAFFIC_GREEN
    }
}

impl TimingPolicy {
    /// A window with `start > end` wraps past midnight. `start == end` means
    /// no night window at all.
    pub fn is_night(&self, hour: u32) -> bool {
        if self.night_start_hour > self.night_end_hour {
            hour >= self.night_start_hour || hour < self.night_end_hour
        } else {
            self.night_start_hour <= hour && hour < self.night_end_hour
        }
    }

    fn profile(&self) -> SignalTiming {
        self.default_timing.normalized()
    }

    pub fn evaluate_signal(&self, signal: &TrafficSignal, hour: u32) -> Result<TimingDecision> {
        self.evaluate(PolicyInputs::from(signal), hour)
    }

    /// Rules are checked in order and the first match wins:
    /// emergency override, then the night window, then vehicle count.
    pub fn evaluate(&self, inputs: PolicyInputs, hour: u32) -> Result<TimingDecision> {
        if hour > 23 {
            return Err(SignalError::InvalidHour(hour));
        }

        if inputs.emergency_override {
            // Main roads carry the emergency corridor; cross traffic is held.
            let status = if inputs.is_main_road {
                SignalStatus::Green
            } else {
                SignalStatus::Red
            };
            return Ok(TimingDecision {
                mode: SignalMode::Emergency,
                status,
                timing: self.profile(),
            });
        }

        if self.is_night(hour) {
            let status = if inputs.is_main_road {
                SignalStatus::FlashingYellow
            } else {
                SignalStatus::FlashingRed
            };
            return Ok(TimingDecision {
                mode: SignalMode::Night,
                status,
                timing: self.profile(),
            });
        }

        let vehicle_count = if inputs.vehicle_count < 0 {
            log::warn!(
                "Negative vehicle count {} clamped to zero",
                inputs.vehicle_count
            );
            0
        } else {
            u32::try_from(inputs.vehicle_count).unwrap_or(u32::MAX)
        };

        Ok(TimingDecision {
            mode: SignalMode::VehicleCount,
            status: inputs.current_status,
            timing: self
                .profile()
                .with_green_time(green_time_for_count(vehicle_count)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(vehicle_count: i64, emergency_override: bool, is_main_road: bool) -> PolicyInputs {
        PolicyInputs {
            vehicle_count,
            emergency_override,
            is_main_road,
            current_status: SignalStatus::Red,
        }
    }

    #[test]
    fn step_function_boundaries() {
        assert_eq!(green_time_for_count(0), 30);
        assert_eq!(green_time_for_count(9), 30);
        assert_eq!(green_time_for_count(10), 45);
        assert_eq!(green_time_for_count(30), 45);
        assert_eq!(green_time_for_count(31), 60);
        assert_eq!(green_time_for_count(u32::MAX), 60);
    }

    #[test]
    fn green_never_below_pedestrian_minimum() {
        let policy = TimingPolicy::default();
        for count in -5..100 {
            for hour in 0..24 {
                for &main in &[true, false] {
                    let decision = policy.evaluate(inputs(count, false, main), hour).unwrap();
                    assert!(decision.timing.green_time >= 20);
                    assert!(
                        decision.timing.green_time >= decision.timing.minimum_pedestrian_time
                    );
                }
            }
        }

        // A profile whose step result falls under its own minimum gets lifted.
        let strict = TimingPolicy {
            default_timing: SignalTiming {
                minimum_pedestrian_time: 40,
                ..SignalTiming::default()
            },
            ..TimingPolicy::default()
        };
        let decision = strict.evaluate(inputs(3, false, true), 12).unwrap();
        assert_eq!(decision.timing.green_time, 40);
    }

    #[test]
    fn night_window_flashes_by_road_class() {
        let policy = TimingPolicy::default();
        for hour in (19..24).chain(0..6) {
            let main = policy.evaluate(inputs(50, false, true), hour).unwrap();
            assert_eq!(main.mode, SignalMode::Night);
            assert_eq!(main.status, SignalStatus::FlashingYellow);
            assert_eq!(main.timing, SignalTiming::default());

            let side = policy.evaluate(inputs(50, false, false), hour).unwrap();
            assert_eq!(side.status, SignalStatus::FlashingRed);
        }
        for hour in 6..19 {
            let decision = policy.evaluate(inputs(50, false, true), hour).unwrap();
            assert_eq!(decision.mode, SignalMode::VehicleCount);
        }
    }

    #[test]
    fn emergency_takes_precedence_over_everything() {
        let policy = TimingPolicy::default();
        for hour in 0..24 {
            for count in [0, 15, 90] {
                let main = policy.evaluate(inputs(count, true, true), hour).unwrap();
                assert_eq!(main.mode, SignalMode::Emergency);
                assert_eq!(main.status, SignalStatus::Green);
                assert_eq!(main.timing, SignalTiming::default());

                let side = policy.evaluate(inputs(count, true, false), hour).unwrap();
                assert_eq!(side.mode, SignalMode::Emergency);
                assert_eq!(side.status, SignalStatus::Red);
            }
        }
    }

    #[test]
    fn busy_main_road_at_midmorning() {
        let decision = TimingPolicy::default()
            .evaluate(inputs(35, false, true), 10)
            .unwrap();
        assert_eq!(decision.mode, SignalMode::VehicleCount);
        assert_eq!(decision.timing.green_time, 60);
        assert_eq!(decision.timing.yellow_time, 5);
        assert_eq!(decision.timing.red_time, 50);
        assert_eq!(decision.timing.minimum_pedestrian_time, 20);
        assert_eq!(decision.status, SignalStatus::Red);
    }

    #[test]
    fn quiet_side_road_at_night() {
        let decision = TimingPolicy::default()
            .evaluate(inputs(5, false, false), 22)
            .unwrap();
        assert_eq!(decision.mode, SignalMode::Night);
        assert_eq!(decision.status, SignalStatus::FlashingRed);
        assert_eq!(decision.timing.green_time, 45);
    }

    #[test]
    fn negative_count_behaves_like_zero() {
        let policy = TimingPolicy::default();
        let negative = policy.evaluate(inputs(-12, false, true), 9).unwrap();
        let zero = policy.evaluate(inputs(0, false, true), 9).unwrap();
        assert_eq!(negative, zero);
        assert_eq!(negative.timing.green_time, 30);
    }

    #[test]
    fn out_of_range_hour_is_rejected() {
        let result = TimingPolicy::default().evaluate(inputs(5, false, true), 24);
        assert!(matches!(result, Err(SignalError::InvalidHour(24))));
    }

    #[test]
    fn evaluation_is_idempotent_and_pure() {
        let policy = TimingPolicy::default();
        let signal = crate::models::create_regions().remove(0).signals.remove(0);
        let before = signal.clone();
        let first = policy.evaluate_signal(&signal, 14).unwrap();
        let second = policy.evaluate_signal(&signal, 14).unwrap();
        assert_eq!(first, second);
        assert_eq!(signal, before);
    }

    #[test]
    fn short_default_green_is_lifted_in_every_branch() {
        let policy = TimingPolicy {
            default_timing: SignalTiming {
                green_time: 10,
                minimum_pedestrian_time: 20,
                ..SignalTiming::default()
            },
            ..TimingPolicy::default()
        };

        let night = policy.evaluate(inputs(5, false, false), 22).unwrap();
        assert_eq!(night.mode, SignalMode::Night);
        assert_eq!(night.timing.green_time, 20);

        let emergency = policy.evaluate(inputs(5, true, true), 10).unwrap();
        assert_eq!(emergency.mode, SignalMode::Emergency);
        assert_eq!(emergency.timing.green_time, 20);

        let config = ControlConfig::from_json(
            r#"{ "default_timing": { "greenTime": 10, "yellowTime": 5, "redTime": 50, "minimumPedestrianTime": 20 } }"#,
        )
        .unwrap();
        let from_config = TimingPolicy::from(&config);
        for hour in 0..24 {
            for &emergency in &[true, false] {
                let decision = from_config.evaluate(inputs(0, emergency, true), hour).unwrap();
                assert!(decision.timing.green_time >= decision.timing.minimum_pedestrian_time);
            }
        }
    }

    #[test]
    fn non_wrapping_night_window() {
        let policy = TimingPolicy {
            night_start_hour: 2,
            night_end_hour: 5,
            ..TimingPolicy::default()
        };
        assert!(!policy.is_night(1));
        assert!(policy.is_night(2));
        assert!(policy.is_night(4));
        assert!(!policy.is_night(5));
        assert!(!policy.is_night(12));
        assert!(!policy.is_night(22));

        let never = TimingPolicy {
            night_start_hour: 6,
            night_end_hour: 6,
            ..TimingPolicy::default()
        };
        assert!((0..24).all(|h| !never.is_night(h)));
    }

    #[test]
    fn night_window_follows_config() {
        let config = ControlConfig {
            night_start_hour: 20,
            ..ControlConfig::default()
        };
        let policy = TimingPolicy::from(&config);
        assert!(!policy.is_night(19));
        assert!(policy.is_night(20));
        assert!(policy.is_night(5));
        assert!(!policy.is_night(6));
    }
}
