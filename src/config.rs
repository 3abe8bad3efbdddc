use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{Result, SignalError};
use crate::global_variables::{
    COUNTDOWN_TICK_SECS, DECISION_LOG_FILE, NIGHT_END_HOUR, NIGHT_START_HOUR,
    NOTIFICATION_CAPACITY, RECOMPUTE_INTERVAL_SECS,
};
use crate::models::signal::SignalTiming;

/// Runtime settings for the signal controller. Every field falls back to the
/// compiled-in default when missing from the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlConfig {
    pub default_timing: SignalTiming,
    pub night_start_hour: u32,
    pub night_end_hour: u32,
    pub recompute_interval_secs: u64,
    pub countdown_tick_secs: u64,
    pub notification_capacity: usize,
    pub decision_log_path: String,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            default_timing: SignalTiming::default(),
            night_start_hour: NIGHT_START_HOUR,
            night_end_hour: NIGHT_END_HOUR,
            recompute_interval_secs: RECOMPUTE_INTERVAL_SECS,
            countdown_tick_secs: COUNTDOWN_TICK_SECS,
            notification_capacity: NOTIFICATION_CAPACITY,
            decision_log_path: DECISION_LOG_FILE.to_string(),
        }
    }
}

impl ControlConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validated()
    }

    /// Rejects night hours outside 0-23 and lifts a default green time that
    /// falls under the pedestrian minimum.
    pub fn validated(mut self) -> Result<Self> {
        for hour in [self.night_start_hour, self.night_end_hour] {
            if hour > 23 {
                return Err(SignalError::InvalidHour(hour));
            }
        }
        if self.default_timing.green_time < self.default_timing.minimum_pedestrian_time {
            log::warn!(
                "Default green time {}s is below the pedestrian minimum, using {}s",
                self.default_timing.green_time,
                self.default_timing.minimum_pedestrian_time
            );
            self.default_timing = self.default_timing.normalized();
        }
        Ok(self)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref())?;
        let config = Self::from_json(&contents)?;
        log::info!("Loaded control config from {}", path.as_ref().display());
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config = ControlConfig::from_json(r#"{ "night_start_hour": 20 }"#).unwrap();
        assert_eq!(config.night_start_hour, 20);
        assert_eq!(config.default_timing, SignalTiming::default());
        assert_eq!(config.recompute_interval_secs, 60);
        assert_eq!(config.notification_capacity, 5);
    }

    #[test]
    fn empty_object_is_the_default_config() {
        assert_eq!(ControlConfig::from_json("{}").unwrap(), ControlConfig::default());
    }

    #[test]
    fn short_default_green_is_lifted() {
        let config = ControlConfig::from_json(
            r#"{ "default_timing": { "greenTime": 10, "yellowTime": 5, "redTime": 50, "minimumPedestrianTime": 20 } }"#,
        )
        .unwrap();
        assert_eq!(config.default_timing.green_time, 20);
        assert_eq!(config.default_timing.red_time, 50);
    }

    #[test]
    fn night_hours_above_23_are_rejected() {
        assert!(matches!(
            ControlConfig::from_json(r#"{ "night_start_hour": 30 }"#),
            Err(SignalError::InvalidHour(30))
        ));
        assert!(matches!(
            ControlConfig::from_json(r#"{ "night_end_hour": 24 }"#),
            Err(SignalError::InvalidHour(24))
        ));
        let early = ControlConfig::from_json(r#"{ "night_start_hour": 2, "night_end_hour": 5 }"#)
            .unwrap();
        assert_eq!((early.night_start_hour, early.night_end_hour), (2, 5));
    }

    #[test]
    fn load_reads_file_and_reports_bad_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "countdown_tick_secs": 2 }}"#).unwrap();
        let config = ControlConfig::load(file.path()).unwrap();
        assert_eq!(config.countdown_tick_secs, 2);

        let mut bad = tempfile::NamedTempFile::new().unwrap();
        write!(bad, "not json").unwrap();
        assert!(matches!(
            ControlConfig::load(bad.path()),
            Err(SignalError::Config(_))
        ));
    }
}
