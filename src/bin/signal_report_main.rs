use signal_control::global_variables::{DECISION_LOG_FILE, GREEN_TIME_CHART_FILE};
use signal_control::monitoring::{
    latest_green_times, read_decisions, render_green_time_chart, summarize_modes,
};

fn main() {
    env_logger::init();

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DECISION_LOG_FILE.to_string());
    let records = match read_decisions(&path) {
        Ok(records) => records,
        Err(e) => {
            eprintln!("Error reading {}: {}", path, e);
            return;
        }
    };

    println!("Report Summary ({} decisions):", records.len());
    for (mode, count) in summarize_modes(&records) {
        println!("{}: {} records", mode, count);
    }

    let green_times = latest_green_times(&records);
    for (signal_id, green) in &green_times {
        println!("Signal {}: {}s green", signal_id, green);
    }

    if let Err(e) = render_green_time_chart(&green_times, GREEN_TIME_CHART_FILE) {
        eprintln!("Error rendering chart: {}", e);
    }
}
