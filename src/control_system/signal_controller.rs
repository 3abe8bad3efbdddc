use chrono::Local;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration};

use crate::config::ControlConfig;
use crate::control_system::clock::HourSource;
use crate::control_system::timing_policy::{TimingDecision, TimingPolicy};
use crate::error::{Result, SignalError};
use crate::models::region::{Region, RegionStatus};
use crate::models::signal::{AiRecommendation, SignalMode, SignalStatus, TrafficSignal};
use crate::monitoring::decision_log::DecisionRecord;
use crate::simulation::traffic_feed::{FeedReading, TrafficFeed};

/// Drives one signal: holds its latest snapshot, the decision derived from it
/// and the green countdown shown to operators.
#[derive(Debug, Clone)]
pub struct SignalController {
    pub signal: TrafficSignal,
    pub decision: TimingDecision,
    pub remaining_green: u32,
    manual_status: Option<SignalStatus>,
    policy: TimingPolicy,
}

impl SignalController {
    pub fn new(signal: TrafficSignal, policy: TimingPolicy, hour: u32) -> Result<Self> {
        let decision = policy.evaluate_signal(&signal, hour)?;
        Ok(Self {
            remaining_green: decision.timing.green_time,
            signal,
            decision,
            manual_status: None,
            policy,
        })
    }

    pub fn id(&self) -> &str {
        &self.signal.id
    }

    pub fn manual_status(&self) -> Option<SignalStatus> {
        self.manual_status
    }

    // Emergency wins over an operator override; the override only replaces
    // automatic (night / vehicle-count) decisions.
    fn derive(&self, hour: u32) -> Result<TimingDecision> {
        let decision = self.policy.evaluate_signal(&self.signal, hour)?;
        match self.manual_status {
            Some(status) if decision.mode != SignalMode::Emergency => Ok(TimingDecision {
                mode: SignalMode::Manual,
                status,
                timing: self.signal.timing.normalized(),
            }),
            _ => Ok(decision),
        }
    }

    /// Recomputes the decision. Returns the previous mode when it changed.
    pub fn refresh(&mut self, hour: u32) -> Result<Option<SignalMode>> {
        let decision = self.derive(hour)?;
        let previous = self.decision.mode;
        self.decision = decision;
        if previous != decision.mode {
            log::info!(
                "Signal {}: mode {} -> {} ({}, green {}s)",
                self.signal.id,
                previous,
                decision.mode,
                decision.status,
                decision.timing.green_time
            );
            Ok(Some(previous))
        } else {
            Ok(None)
        }
    }

    /// Applies new policy inputs. Recomputes only when one of them changed.
    pub fn update_inputs(
        &mut self,
        vehicle_count: i64,
        emergency_override: bool,
        is_main_road: bool,
        hour: u32,
    ) -> Result<bool> {
        if self.signal.vehicle_count == vehicle_count
            && self.signal.emergency_override == emergency_override
            && self.signal.is_main_road == is_main_road
        {
            return Ok(false);
        }
        self.signal.vehicle_count = vehicle_count;
        self.signal.emergency_override = emergency_override;
        self.signal.is_main_road = is_main_road;
        self.signal.last_update = Local::now();
        self.refresh(hour)?;
        Ok(true)
    }

    /// One second of the green countdown. Wraps back to the full green time
    /// after reaching zero and stands still in night mode.
    pub fn tick_countdown(&mut self) {
        if self.decision.mode == SignalMode::Night {
            return;
        }
        self.remaining_green = if self.remaining_green > 0 {
            self.remaining_green - 1
        } else {
            self.decision.timing.green_time
        };
    }

    pub fn set_manual_override(&mut self, status: SignalStatus, hour: u32) -> Result<()> {
        self.manual_status = Some(status);
        self.refresh(hour)?;
        Ok(())
    }

    pub fn clear_manual_override(&mut self, hour: u32) -> Result<()> {
        if self.manual_status.take().is_some() {
            log::info!("Clearing manual override for signal {}", self.signal.id);
        }
        self.refresh(hour)?;
        Ok(())
    }

    /// Takes over the suggested status as an operator override and the
    /// suggested green time as the signal's own timing.
    pub fn apply_ai_recommendation(&mut self, hour: u32) -> Result<AiRecommendation> {
        let recommendation = self
            .signal
            .ai_recommendation
            .clone()
            .ok_or_else(|| SignalError::NoRecommendation(self.signal.id.clone()))?;
        self.signal.timing = self
            .signal
            .timing
            .with_green_time(recommendation.suggested_timing);
        self.manual_status = Some(recommendation.suggested_status);
        self.refresh(hour)?;
        Ok(recommendation)
    }
}

#[derive(Debug, Clone)]
struct RegionEntry {
    id: String,
    name: String,
    status: RegionStatus,
    current_mode: SignalMode,
    signal_ids: Vec<String>,
}

/// Display aggregate for one region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionSummary {
    pub id: String,
    pub name: String,
    pub status: RegionStatus,
    pub current_mode: SignalMode,
    pub total_vehicles: u64,
    pub signal_count: usize,
}

pub struct TrafficSignalController {
    pub controllers: BTreeMap<String, SignalController>,
    regions: Vec<RegionEntry>,
    notifications: VecDeque<String>,
    notification_capacity: usize,
}

impl TrafficSignalController {
    /// Creates a controller for every signal of every region and evaluates
    /// each one against `hour`.
    pub fn from_regions(regions: Vec<Region>, config: &ControlConfig, hour: u32) -> Result<Self> {
        let policy = TimingPolicy::from(config);
        let mut controllers = BTreeMap::new();
        let mut entries = Vec::new();

        for region in regions {
            let signal_ids: Vec<String> = region.signals.iter().map(|s| s.id.clone()).collect();
            for signal in region.signals {
                let controller = SignalController::new(signal, policy, hour)?;
                controllers.insert(controller.signal.id.clone(), controller);
            }
            entries.push(RegionEntry {
                id: region.id,
                name: region.name,
                status: region.status,
                current_mode: region.current_mode,
                signal_ids,
            });
        }

        log::info!(
            "Signal controller initialized with {} signals in {} regions",
            controllers.len(),
            entries.len()
        );

        Ok(Self {
            controllers,
            regions: entries,
            notifications: VecDeque::new(),
            notification_capacity: config.notification_capacity,
        })
    }

    fn notify(&mut self, message: String) {
        log::info!("{}", message);
        self.notifications.push_front(message);
        self.notifications.truncate(self.notification_capacity);
    }

    /// Newest first.
    pub fn notifications(&self) -> Vec<String> {
        self.notifications.iter().cloned().collect()
    }

    fn controller_mut(&mut self, signal_id: &str) -> Result<&mut SignalController> {
        self.controllers
            .get_mut(signal_id)
            .ok_or_else(|| SignalError::UnknownSignal(signal_id.to_string()))
    }

    fn notify_mode_change(&mut self, signal_id: &str, mode: SignalMode) {
        match mode {
            SignalMode::Night => self.notify(format!(
                "Night Mode activated automatically for Signal {} - Optimizing for low traffic conditions",
                signal_id
            )),
            SignalMode::Emergency => {
                self.notify(format!("Emergency Mode activated for Signal {}", signal_id))
            }
            SignalMode::VehicleCount | SignalMode::Manual => {}
        }
    }

    /// Re-evaluates every signal. Returns the current decision of each.
    pub fn refresh_all(&mut self, hour: u32) -> Result<Vec<(String, TimingDecision)>> {
        let mut changed = Vec::new();
        let mut decisions = Vec::with_capacity(self.controllers.len());
        for (id, controller) in self.controllers.iter_mut() {
            if controller.refresh(hour)?.is_some() {
                changed.push((id.clone(), controller.decision.mode));
            }
            decisions.push((id.clone(), controller.decision));
        }
        for (id, mode) in changed {
            self.notify_mode_change(&id, mode);
        }
        Ok(decisions)
    }

    pub fn tick_all(&mut self) {
        for controller in self.controllers.values_mut() {
            controller.tick_countdown();
        }
    }

    pub fn snapshots(&self) -> impl Iterator<Item = &TrafficSignal> {
        self.controllers.values().map(|c| &c.signal)
    }

    /// Feeds a telemetry reading into its signal. Returns whether the signal
    /// was re-evaluated.
    pub fn apply_feed_reading(&mut self, reading: &FeedReading, hour: u32) -> Result<bool> {
        let controller = self.controller_mut(&reading.signal_id)?;
        let previous = controller.decision.mode;
        let recomputed = controller.update_inputs(
            reading.vehicle_count,
            reading.emergency_override,
            reading.is_main_road,
            hour,
        )?;
        let mode = controller.decision.mode;
        if mode != previous {
            self.notify_mode_change(&reading.signal_id, mode);
        }
        Ok(recomputed)
    }

    pub fn set_manual_override(
        &mut self,
        signal_id: &str,
        status: SignalStatus,
        hour: u32,
    ) -> Result<()> {
        self.controller_mut(signal_id)?
            .set_manual_override(status, hour)?;
        self.notify(format!(
            "Manual override: Signal {} changed to {}",
            signal_id, status
        ));
        Ok(())
    }

    pub fn clear_manual_override(&mut self, signal_id: &str, hour: u32) -> Result<()> {
        self.controller_mut(signal_id)?.clear_manual_override(hour)
    }

    pub fn apply_ai_recommendation(&mut self, signal_id: &str, hour: u32) -> Result<()> {
        let recommendation = self.controller_mut(signal_id)?.apply_ai_recommendation(hour)?;
        self.notify(format!(
            "Manual override: Signal {} changed to {}",
            signal_id, recommendation.suggested_status
        ));
        self.notify(format!("AI recommendation applied to Signal {}", signal_id));
        Ok(())
    }

    /// Operator switch for a whole region.
    ///
    /// `Manual` pins every signal at its current status, `Emergency` raises the
    /// emergency override on every signal, and the automatic modes hand the
    /// signals back to the timing policy. The requested mode is remembered but
    /// `region_summaries` reports what the signals actually run.
    pub fn set_region_mode(&mut self, region_id: &str, mode: SignalMode, hour: u32) -> Result<()> {
        let index = self
            .regions
            .iter()
            .position(|r| r.id == region_id)
            .ok_or_else(|| SignalError::UnknownRegion(region_id.to_string()))?;
        let signal_ids = self.regions[index].signal_ids.clone();

        for signal_id in &signal_ids {
            let controller = self.controller_mut(signal_id)?;
            match mode {
                SignalMode::Manual => {
                    let status = controller.decision.status;
                    controller.set_manual_override(status, hour)?;
                }
                SignalMode::Emergency => {
                    controller.signal.emergency_override = true;
                    controller.refresh(hour)?;
                }
                SignalMode::VehicleCount | SignalMode::Night => {
                    controller.signal.emergency_override = false;
                    controller.clear_manual_override(hour)?;
                }
            }
        }

        self.regions[index].current_mode = mode;
        let name = self.regions[index].name.clone();
        self.notify(format!("{} Mode activated for {}", capitalize(&mode.to_string()), name));
        Ok(())
    }

    /// `current_mode` is the mode shared by every signal of the region, or the
    /// last operator-selected mode when the signals disagree.
    pub fn region_summaries(&self) -> Vec<RegionSummary> {
        self.regions
            .iter()
            .map(|region| {
                let signals: Vec<&SignalController> = region
                    .signal_ids
                    .iter()
                    .filter_map(|id| self.controllers.get(id))
                    .collect();
                let current_mode = match signals.split_first() {
                    Some((first, rest))
                        if rest.iter().all(|c| c.decision.mode == first.decision.mode) =>
                    {
                        first.decision.mode
                    }
                    _ => region.current_mode,
                };
                RegionSummary {
                    id: region.id.clone(),
                    name: region.name.clone(),
                    status: region.status,
                    current_mode,
                    total_vehicles: signals
                        .iter()
                        .map(|c| c.signal.vehicle_count.max(0) as u64)
                        .sum(),
                    signal_count: signals.len(),
                }
            })
            .collect()
    }

    pub fn decision_for(&self, signal_id: &str) -> Result<TimingDecision> {
        self.controllers
            .get(signal_id)
            .map(|c| c.decision)
            .ok_or_else(|| SignalError::UnknownSignal(signal_id.to_string()))
    }

    pub fn remaining_for(&self, signal_id: &str) -> Result<u32> {
        self.controllers
            .get(signal_id)
            .map(|c| c.remaining_green)
            .ok_or_else(|| SignalError::UnknownSignal(signal_id.to_string()))
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

fn lock_controller(
    controller: &Arc<Mutex<TrafficSignalController>>,
) -> MutexGuard<'_, TrafficSignalController> {
    match controller.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Periodic driver for a shared controller: a slow recompute timer (also
/// catching the day/night boundary) and a fast countdown timer.
pub struct UpdateLoop {
    pub controller: Arc<Mutex<TrafficSignalController>>,
    pub clock: Arc<dyn HourSource>,
    pub feed: Option<TrafficFeed>,
    pub recompute_every: Duration,
    pub tick_every: Duration,
    pub decision_tx: Option<mpsc::UnboundedSender<DecisionRecord>>,
}

impl UpdateLoop {
    pub fn new(
        controller: Arc<Mutex<TrafficSignalController>>,
        clock: Arc<dyn HourSource>,
        config: &ControlConfig,
    ) -> Self {
        Self {
            controller,
            clock,
            feed: None,
            recompute_every: Duration::from_secs(config.recompute_interval_secs.max(1)),
            tick_every: Duration::from_secs(config.countdown_tick_secs.max(1)),
            decision_tx: None,
        }
    }

    pub fn with_feed(mut self, feed: TrafficFeed) -> Self {
        self.feed = Some(feed);
        self
    }

    pub fn with_decision_sink(mut self, tx: mpsc::UnboundedSender<DecisionRecord>) -> Self {
        self.decision_tx = Some(tx);
        self
    }

    fn recompute_step(&mut self) {
        let hour = self.clock.current_hour();
        let mut ctrl = lock_controller(&self.controller);

        if let Some(feed) = self.feed.as_mut() {
            let readings: Vec<FeedReading> = ctrl.snapshots().map(|s| feed.next_reading(s)).collect();
            for reading in &readings {
                if let Err(e) = ctrl.apply_feed_reading(reading, hour) {
                    log::error!("Failed to apply feed reading for {}: {}", reading.signal_id, e);
                }
            }
        }

        match ctrl.refresh_all(hour) {
            Ok(decisions) => {
                if let Some(tx) = &self.decision_tx {
                    for (signal_id, decision) in &decisions {
                        if tx.send(DecisionRecord::new(signal_id, hour, decision)).is_err() {
                            log::debug!("Decision sink closed, dropping record for {}", signal_id);
                        }
                    }
                }
            }
            Err(e) => log::error!("Signal recompute failed: {}", e),
        }
    }

    fn countdown_step(&self) {
        lock_controller(&self.controller).tick_all();
    }

    /// Runs until `shutdown` turns true or its sender is dropped.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        let mut recompute = interval(self.recompute_every);
        let mut countdown = interval(self.tick_every);
        // The first tick of an interval completes immediately; the countdown
        // starts one period after mount.
        countdown.tick().await;

        loop {
            tokio::select! {
                _ = recompute.tick() => self.recompute_step(),
                _ = countdown.tick() => self.countdown_step(),
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        log::info!("Signal update loop stopped");
    }
}

/// Owns a running update loop. Dropping the handle aborts the loop.
pub struct ControlLoopHandle {
    shutdown_tx: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl ControlLoopHandle {
    /// Stops the loop and waits for it to finish.
    pub async fn shutdown(mut self) {
        let _ = self.shutdown_tx.send(true);
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                log::warn!("Signal update loop ended abnormally: {}", e);
            }
        }
    }
}

impl Drop for ControlLoopHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

pub fn spawn_update_loop(update_loop: UpdateLoop) -> ControlLoopHandle {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let task = tokio::spawn(update_loop.run(shutdown_rx));
    ControlLoopHandle {
        shutdown_tx,
        task: Some(task),
    }
}
