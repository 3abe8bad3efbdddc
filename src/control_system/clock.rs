use chrono::{Local, Timelike};

/// Supplies the hour of day (0-23) the policy evaluates against.
pub trait HourSource: Send + Sync {
    fn current_hour(&self) -> u32;
}

/// Reads the hour from the local wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalClock;

impl HourSource for LocalClock {
    fn current_hour(&self) -> u32 {
        Local::now().hour()
    }
}

/// Always reports the same hour.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub u32);

impl HourSource for FixedClock {
    fn current_hour(&self) -> u32 {
        self.0
    }
}
