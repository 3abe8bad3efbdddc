use chrono::Local;
use plotters::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::error::Error;
use std::fs::OpenOptions;
use std::path::Path;
use tokio::sync::mpsc;

use crate::control_system::timing_policy::TimingDecision;
use crate::error::Result;
use crate::models::signal::{SignalMode, SignalStatus};

/// One row of the decision audit log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionRecord {
    pub timestamp: i64,
    pub signal_id: String,
    pub hour: u32,
    pub mode: SignalMode,
    pub status: SignalStatus,
    pub green_time: u32,
    pub yellow_time: u32,
    pub red_time: u32,
    pub minimum_pedestrian_time: u32,
}

impl DecisionRecord {
    pub fn new(signal_id: &str, hour: u32, decision: &TimingDecision) -> Self {
        Self {
            timestamp: Local::now().timestamp(),
            signal_id: signal_id.to_string(),
            hour,
            mode: decision.mode,
            status: decision.status,
            green_time: decision.timing.green_time,
            yellow_time: decision.timing.yellow_time,
            red_time: decision.timing.red_time,
            minimum_pedestrian_time: decision.timing.minimum_pedestrian_time,
        }
    }
}

// Appends a record, writing the header only when the file is new.
fn log_to_csv<T: Serialize, P: AsRef<Path>>(path: P, record: &T) -> Result<()> {
    let file_exists = path.as_ref().exists();
    let file = OpenOptions::new().append(true).create(true).open(path)?;
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(!file_exists)
        .from_writer(file);
    wtr.serialize(record)?;
    wtr.flush()?;
    Ok(())
}

pub fn log_decision<P: AsRef<Path>>(path: P, record: &DecisionRecord) -> Result<()> {
    log_to_csv(path, record)
}

pub fn read_decisions<P: AsRef<Path>>(path: P) -> Result<Vec<DecisionRecord>> {
    let mut rdr = csv::Reader::from_path(path)?;
    let mut records = Vec::new();
    for result in rdr.deserialize() {
        records.push(result?);
    }
    Ok(records)
}

/// Drains decisions from the update loop into the CSV log until every sender
/// is gone. Returns how many rows were written.
pub async fn run_decision_writer(
    mut rx: mpsc::UnboundedReceiver<DecisionRecord>,
    path: String,
) -> usize {
    let mut written = 0;
    while let Some(record) = rx.recv().await {
        match log_decision(&path, &record) {
            Ok(()) => written += 1,
            Err(e) => log::error!("Error logging decision for {}: {}", record.signal_id, e),
        }
    }
    written
}

pub fn summarize_modes(records: &[DecisionRecord]) -> BTreeMap<SignalMode, usize> {
    let mut counts = BTreeMap::new();
    for record in records {
        *counts.entry(record.mode).or_insert(0) += 1;
    }
    counts
}

/// Green time of the most recent decision per signal.
pub fn latest_green_times(records: &[DecisionRecord]) -> BTreeMap<String, u32> {
    let mut latest: BTreeMap<String, (i64, u32)> = BTreeMap::new();
    for record in records {
        let entry = latest
            .entry(record.signal_id.clone())
            .or_insert((record.timestamp, record.green_time));
        if record.timestamp >= entry.0 {
            *entry = (record.timestamp, record.green_time);
        }
    }
    latest.into_iter().map(|(id, (_, green))| (id, green)).collect()
}

/// Bar chart of the latest green time per signal.
pub fn render_green_time_chart(
    green_times: &BTreeMap<String, u32>,
    path: &str,
) -> std::result::Result<(), Box<dyn Error>> {
    if green_times.is_empty() {
        log::warn!("No decisions to chart");
        return Ok(());
    }

    let ids: Vec<&String> = green_times.keys().collect();
    let max_green = green_times.values().copied().max().unwrap_or(0) + 10;

    let root = BitMapBackend::new(path, (800, 480)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Latest Green Time per Signal", ("sans-serif", 20))
        .margin(30)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(0..ids.len() as i32, 0u32..max_green)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(ids.len())
        .x_label_formatter(&|x: &i32| {
            ids.get(*x as usize)
                .map(|id| format!("Signal {}", id))
                .unwrap_or_default()
        })
        .y_desc("Green time (s)")
        .draw()?;

    chart.draw_series(green_times.values().enumerate().map(|(i, &green)| {
        let x = i as i32;
        Rectangle::new([(x, 0), (x + 1, green)], BLUE.mix(0.7).filled())
    }))?;

    root.present()?;
    println!("Green time chart saved to {}", path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::signal::SignalTiming;

    fn record(signal_id: &str, timestamp: i64, mode: SignalMode, green_time: u32) -> DecisionRecord {
        let decision = TimingDecision {
            mode,
            status: SignalStatus::Green,
            timing: SignalTiming::default().with_green_time(green_time),
        };
        DecisionRecord {
            timestamp,
            ..DecisionRecord::new(signal_id, 10, &decision)
        }
    }

    #[test]
    fn log_appends_with_single_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("decisions.csv");
        let first = record("1", 100, SignalMode::VehicleCount, 60);
        let second = record("2", 101, SignalMode::Night, 45);
        log_decision(&path, &first).unwrap();
        log_decision(&path, &second).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.matches("signal_id").count(), 1);
        assert!(contents.contains("vehicle-count"));

        let records = read_decisions(&path).unwrap();
        assert_eq!(records, vec![first, second]);
    }

    #[test]
    fn summary_counts_modes_and_keeps_latest_green() {
        let records = vec![
            record("1", 100, SignalMode::VehicleCount, 30),
            record("1", 160, SignalMode::VehicleCount, 60),
            record("2", 100, SignalMode::Night, 45),
            record("2", 90, SignalMode::Emergency, 45),
        ];
        let modes = summarize_modes(&records);
        assert_eq!(modes[&SignalMode::VehicleCount], 2);
        assert_eq!(modes[&SignalMode::Night], 1);
        assert_eq!(modes[&SignalMode::Emergency], 1);
        assert!(!modes.contains_key(&SignalMode::Manual));

        let greens = latest_green_times(&records);
        assert_eq!(greens["1"], 60);
        assert_eq!(greens["2"], 45);
    }

    #[tokio::test]
    async fn writer_drains_channel() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("decisions.csv");
        let (tx, rx) = mpsc::unbounded_channel();
        tx.send(record("1", 1, SignalMode::VehicleCount, 45)).unwrap();
        tx.send(record("3", 2, SignalMode::Manual, 50)).unwrap();
        drop(tx);

        let written = run_decision_writer(rx, path.to_string_lossy().into_owned()).await;
        assert_eq!(written, 2);
        assert_eq!(read_decisions(&path).unwrap().len(), 2);
    }
}
