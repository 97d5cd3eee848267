//! Per-aircraft poll loop.
//!
//! Fetch, classify, gate, sleep. Fetch failures only count toward the
//! no-data budget; exhausting it ends the monitor with one terminal
//! notification. Stop requests are observed at the top of each cycle and cut
//! the inter-poll sleep short, but never interrupt a fetch in flight.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use jumprun_core::rules::{NO_DATA_BUDGET, POLL_INTERVAL};
use jumprun_core::{
    AircraftHex, Classifier, ClassifierState, FlightPhase, NotificationKind, NotificationPort,
    TelemetrySource, ThresholdConfig, TransitionGate,
};

static NEXT_MONITOR_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, Copy)]
pub struct MonitorSettings {
    pub poll_interval: Duration,
    pub no_data_budget: u32,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            poll_interval: POLL_INTERVAL,
            no_data_budget: NO_DATA_BUDGET,
        }
    }
}

/// Snapshot of a monitor, published by the loop after every cycle.
#[derive(Debug, Clone, Serialize)]
pub struct MonitorStatus {
    pub active: bool,
    pub phase: Option<FlightPhase>,
    pub no_data_count: u32,
    pub polls: u64,
    pub last_update: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorExit {
    /// Stop was requested
    Stopped,
    /// No-data budget exhausted
    Exhausted,
}

/// Caller side of the cooperative stop flag.
#[derive(Debug)]
pub struct StopHandle(watch::Sender<bool>);

impl StopHandle {
    pub fn stop(&self) {
        self.0.send_replace(true);
    }
}

/// Loop side of the cooperative stop flag. A dropped handle counts as stop.
#[derive(Debug, Clone)]
pub struct StopSignal(watch::Receiver<bool>);

impl StopSignal {
    pub fn is_stopped(&self) -> bool {
        *self.0.borrow() || self.0.has_changed().is_err()
    }

    pub async fn stopped(&mut self) {
        let _ = self.0.wait_for(|stopped| *stopped).await;
    }
}

pub fn stop_channel() -> (StopHandle, StopSignal) {
    let (tx, rx) = watch::channel(false);
    (StopHandle(tx), StopSignal(rx))
}

/// One aircraft's fetch/classify/notify loop. Sole owner of its classifier state.
pub struct PollLoop {
    hex: AircraftHex,
    classifier: Classifier,
    state: ClassifierState,
    gate: TransitionGate,
    source: Arc<dyn TelemetrySource>,
    settings: MonitorSettings,
    polls: u64,
    status: watch::Sender<MonitorStatus>,
}

impl PollLoop {
    pub fn new(
        hex: AircraftHex,
        aircraft: impl Into<String>,
        thresholds: ThresholdConfig,
        source: Arc<dyn TelemetrySource>,
        port: Arc<dyn NotificationPort>,
        settings: MonitorSettings,
    ) -> (Self, watch::Receiver<MonitorStatus>) {
        let (status, status_rx) = watch::channel(MonitorStatus {
            active: true,
            phase: None,
            no_data_count: 0,
            polls: 0,
            last_update: None,
        });
        let poll_loop = Self {
            hex,
            classifier: Classifier::new(thresholds),
            state: ClassifierState::new(),
            gate: TransitionGate::new(aircraft, port),
            source,
            settings,
            polls: 0,
            status,
        };
        (poll_loop, status_rx)
    }

    pub async fn run(mut self, mut stop: StopSignal) -> MonitorExit {
        tracing::info!("Tracking {} ({})", self.gate.aircraft(), self.hex);

        let exit = loop {
            if stop.is_stopped() {
                break MonitorExit::Stopped;
            }

            let snapshot = self.source.fetch(&self.hex).await;
            self.polls += 1;
            match &snapshot {
                Some(data) => tracing::debug!("{} status: {:?}", self.hex, data),
                None => tracing::debug!("{} is on the ground or unavailable", self.hex),
            }

            let transitions = self.classifier.classify(snapshot.as_ref(), &mut self.state);
            self.gate.dispatch(transitions);
            self.publish(true);

            if snapshot.is_none() && self.state.no_data_counter >= self.settings.no_data_budget {
                self.gate.announce(
                    NotificationKind::Terminal,
                    format!(
                        "Stopping tracking after {} no data responses",
                        self.settings.no_data_budget
                    ),
                );
                break MonitorExit::Exhausted;
            }

            tokio::select! {
                _ = tokio::time::sleep(self.settings.poll_interval) => {}
                _ = stop.stopped() => {}
            }
        };

        self.publish(false);
        tracing::info!("Stopped tracking {} ({:?})", self.hex, exit);
        exit
    }

    fn publish(&self, active: bool) {
        self.status.send_replace(MonitorStatus {
            active,
            phase: self.state.current_phase,
            no_data_count: self.state.no_data_counter,
            polls: self.polls,
            last_update: Some(Utc::now()),
        });
    }
}

/// Registry-side handle to a running monitor task.
#[derive(Debug)]
pub struct MonitorHandle {
    id: u64,
    hex: AircraftHex,
    aircraft: String,
    dropzone: String,
    started_at: DateTime<Utc>,
    stop: StopHandle,
    status: watch::Receiver<MonitorStatus>,
    task: JoinHandle<MonitorExit>,
}

impl MonitorHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn hex(&self) -> &AircraftHex {
        &self.hex
    }

    pub fn aircraft(&self) -> &str {
        &self.aircraft
    }

    pub fn dropzone(&self) -> &str {
        &self.dropzone
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn status(&self) -> MonitorStatus {
        self.status.borrow().clone()
    }

    pub fn is_active(&self) -> bool {
        self.status.borrow().active && !self.task.is_finished()
    }

    pub fn request_stop(&self) {
        self.stop.stop();
    }

    pub fn status_receiver(&self) -> watch::Receiver<MonitorStatus> {
        self.status.clone()
    }
}

/// Everything needed to start one monitor.
pub struct MonitorSpec {
    pub hex: AircraftHex,
    pub aircraft: String,
    pub dropzone: String,
    pub thresholds: ThresholdConfig,
    pub source: Arc<dyn TelemetrySource>,
    pub port: Arc<dyn NotificationPort>,
    pub settings: MonitorSettings,
}

/// Spawn the poll loop on the current runtime.
pub fn spawn_monitor(spec: MonitorSpec) -> MonitorHandle {
    let (poll_loop, status) = PollLoop::new(
        spec.hex.clone(),
        spec.aircraft.clone(),
        spec.thresholds,
        spec.source,
        spec.port,
        spec.settings,
    );
    let (stop, signal) = stop_channel();
    let task = tokio::spawn(poll_loop.run(signal));

    MonitorHandle {
        id: NEXT_MONITOR_ID.fetch_add(1, Ordering::SeqCst),
        hex: spec.hex,
        aircraft: spec.aircraft,
        dropzone: spec.dropzone,
        started_at: Utc::now(),
        stop,
        status,
        task,
    }
}

/// Wait until the monitor publishes `active == false`, up to `timeout`.
///
/// Returns `false` if the timeout elapsed first.
pub async fn wait_until_inactive(
    mut status: watch::Receiver<MonitorStatus>,
    timeout: Duration,
) -> bool {
    tokio::time::timeout(timeout, status.wait_for(|status| !status.active))
        .await
        .is_ok()
}
