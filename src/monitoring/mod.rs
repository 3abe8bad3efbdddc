pub mod decision_log;

pub use decision_log::{
    latest_green_times, log_decision, read_decisions, render_green_time_chart,
    run_decision_writer, summarize_modes, DecisionRecord,
};
