use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::models::signal::TrafficSignal;

/// One telemetry sample for a signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedReading {
    pub signal_id: String,
    pub vehicle_count: i64,
    pub emergency_override: bool,
    pub is_main_road: bool,
}

/// Simulated sensor feed: vehicle counts drift by a random amount each
/// reading, the other inputs are reported as they are.
pub struct TrafficFeed {
    rng: SmallRng,
    max_jitter: i64,
}

impl TrafficFeed {
    pub fn new(max_jitter: i64) -> Self {
        Self {
            rng: SmallRng::from_rng(&mut rand::rng()),
            max_jitter: max_jitter.abs(),
        }
    }

    /// Reproducible feed for tests and replays.
    pub fn seeded(seed: u64, max_jitter: i64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
            max_jitter: max_jitter.abs(),
        }
    }

    pub fn next_reading(&mut self, signal: &TrafficSignal) -> FeedReading {
        let delta = self.rng.random_range(-self.max_jitter..=self.max_jitter);
        FeedReading {
            signal_id: signal.id.clone(),
            vehicle_count: (signal.vehicle_count.max(0) + delta).max(0),
            emergency_override: signal.emergency_override,
            is_main_road: signal.is_main_road,
        }
    }
}

impl Default for TrafficFeed {
    fn default() -> Self {
        Self::new(5)
    }
}
