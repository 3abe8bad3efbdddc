// benches/bench_signal_controller.rs
use criterion::{
    black_box, criterion_group, criterion_main, AxisScale, Criterion, PlotConfiguration,
};
use signal_control::config::ControlConfig;
use signal_control::control_system::TrafficSignalController;
use signal_control::models::{Region, RegionStatus, SignalMode, SignalStatus, TrafficSignal};
use std::time::Duration;

// One region holding `num_signals` signals with varied counts.
fn create_controller(num_signals: usize) -> TrafficSignalController {
    let mut region = Region::new("1", "Bench", RegionStatus::Normal, SignalMode::VehicleCount);
    for i in 0..num_signals {
        region = region.with_signal(TrafficSignal::new(
            &format!("{}", i),
            "Bench",
            (i % 4) as u32 + 1,
            51.5,
            -0.1,
            SignalStatus::Red,
            SignalMode::VehicleCount,
            (i % 45) as i64,
            i % 3 == 0,
        ));
    }
    TrafficSignalController::from_regions(vec![region], &ControlConfig::default(), 12)
        .expect("valid hour")
}

fn bench_refresh_all(c: &mut Criterion) {
    let mut group = c.benchmark_group("refresh_all");

    group.sample_size(100);
    group.measurement_time(Duration::from_secs(5));
    group.warm_up_time(Duration::from_secs(2));
    group.plot_config(PlotConfiguration::default().summary_scale(AxisScale::Linear));

    for &size in [50, 100, 200].iter() {
        group.bench_function(format!("size_{}", size), |b| {
            let mut controller = create_controller(size);
            let mut hour = 0;
            b.iter(|| {
                // Walk the clock so night transitions are included.
                hour = (hour + 1) % 24;
                black_box(controller.refresh_all(hour).expect("valid hour"));
            });
        });
    }
    group.finish();
}

fn bench_tick_all(c: &mut Criterion) {
    let mut group = c.benchmark_group("tick_all");

    group.sample_size(100);
    group.measurement_time(Duration::from_secs(5));
    group.warm_up_time(Duration::from_secs(2));

    for &size in [50, 100, 200].iter() {
        group.bench_function(format!("size_{}", size), |b| {
            let mut controller = create_controller(size);
            b.iter(|| {
                controller.tick_all();
                black_box(&controller);
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_refresh_all, bench_tick_all);
criterion_main!(benches);
