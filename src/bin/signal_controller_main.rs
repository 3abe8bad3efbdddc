use signal_control::config::ControlConfig;
use signal_control::control_system::{
    spawn_update_loop, LocalClock, TrafficSignalController, UpdateLoop, HourSource,
};
use signal_control::models::create_regions;
use signal_control::monitoring::run_decision_writer;
use signal_control::simulation::TrafficFeed;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

#[tokio::main]
async fn main() {
    env_logger::init();

    // Optional config path as the first argument.
    let config = match std::env::args().nth(1) {
        Some(path) => match ControlConfig::load(&path) {
            Ok(config) => config,
            Err(e) => {
                log::error!("Could not load config {}: {}", path, e);
                return;
            }
        },
        None => ControlConfig::default(),
    };

    let clock = Arc::new(LocalClock);
    let controller =
        match TrafficSignalController::from_regions(create_regions(), &config, clock.current_hour())
        {
            Ok(controller) => Arc::new(Mutex::new(controller)),
            Err(e) => {
                log::error!("Controller error: {}", e);
                return;
            }
        };

    let (tx, rx) = mpsc::unbounded_channel();
    let writer = tokio::spawn(run_decision_writer(rx, config.decision_log_path.clone()));

    println!("Starting signal controller...");
    let handle = spawn_update_loop(
        UpdateLoop::new(controller.clone(), clock, &config)
            .with_feed(TrafficFeed::default())
            .with_decision_sink(tx),
    );

    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for Ctrl-C: {}", e);
    }
    handle.shutdown().await;

    match writer.await {
        Ok(written) => println!(
            "Signal controller stopped, {} decisions logged to {}",
            written, config.decision_log_path
        ),
        Err(e) => log::error!("Decision writer failed: {}", e),
    }
}
