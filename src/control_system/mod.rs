pub mod clock;
pub mod signal_controller;
pub mod timing_policy;

pub use clock::{FixedClock, HourSource, LocalClock};
pub use signal_controller::{
    spawn_update_loop, ControlLoopHandle, RegionSummary, SignalController,
    TrafficSignalController, UpdateLoop,
};
pub use timing_policy::{green_time_for_count, PolicyInputs, TimingDecision, TimingPolicy};
