pub mod region;
pub mod signal;

pub use region::{create_regions, Region, RegionStatus};
pub use signal::{AiRecommendation, Location, SignalMode, SignalStatus, SignalTiming, TrafficSignal};
