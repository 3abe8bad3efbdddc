// Default timing profile (seconds)
pub const DEFAULT_GREEN_TIME: u32 = 45;
pub const DEFAULT_YELLOW_TIME: u32 = 5;
pub const DEFAULT_RED_TIME: u32 = 50;
pub const DEFAULT_MIN_PEDESTRIAN_TIME: u32 = 20;

// Night window: hour >= start || hour < end
pub const NIGHT_START_HOUR: u32 = 19;
pub const NIGHT_END_HOUR: u32 = 6;

// Vehicle count -> green time step function
pub const LOW_TRAFFIC_LIMIT: u32 = 10;
pub const HIGH_TRAFFIC_LIMIT: u32 = 30;
pub const LOW_TRAFFIC_GREEN: u32 = 30;
pub const MEDIUM_TRAFFIC_GREEN: u32 = 45;
pub const HIGH_TRAFFIC_GREEN: u32 = 60;

// Timers
pub const RECOMPUTE_INTERVAL_SECS: u64 = 60;
pub const COUNTDOWN_TICK_SECS: u64 = 1;

pub const NOTIFICATION_CAPACITY: usize = 5;

// Output files
pub const DECISION_LOG_FILE: &str = "signal_decisions.csv";
pub const GREEN_TIME_CHART_FILE: &str = "green_times.png";
