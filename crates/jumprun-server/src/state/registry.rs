//! Registry of running monitors, keyed by aircraft hex.
//!
//! Only add/remove/lookup go through the map; a monitor's classifier state is
//! owned by its own task.

use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::Serialize;

use jumprun_core::{AircraftHex, FlightPhase};

use crate::loops::poll_loop::{wait_until_inactive, MonitorHandle};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StartOutcome {
    Started,
    AlreadyActive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopOutcome {
    Stopped,
    /// Timed out waiting; the loop is still finishing its current cycle
    WindingDown,
    NotTracking,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackerState {
    Active,
    Inactive,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrackerStatus {
    pub hex: AircraftHex,
    pub aircraft: Option<String>,
    pub dropzone: Option<String>,
    pub state: TrackerState,
    pub phase: Option<FlightPhase>,
    pub no_data_count: u32,
    pub polls: u64,
    pub started_at: Option<DateTime<Utc>>,
    pub last_update: Option<DateTime<Utc>>,
}

impl TrackerStatus {
    fn untracked(hex: &AircraftHex) -> Self {
        Self {
            hex: hex.clone(),
            aircraft: None,
            dropzone: None,
            state: TrackerState::Inactive,
            phase: None,
            no_data_count: 0,
            polls: 0,
            started_at: None,
            last_update: None,
        }
    }

    fn from_handle(handle: &MonitorHandle) -> Self {
        let status = handle.status();
        Self {
            hex: handle.hex().clone(),
            aircraft: Some(handle.aircraft().to_string()),
            dropzone: Some(handle.dropzone().to_string()),
            state: if handle.is_active() {
                TrackerState::Active
            } else {
                TrackerState::Inactive
            },
            phase: status.phase,
            no_data_count: status.no_data_count,
            polls: status.polls,
            started_at: Some(handle.started_at()),
            last_update: status.last_update,
        }
    }
}

#[derive(Debug, Default)]
pub struct MonitorRegistry {
    monitors: DashMap<AircraftHex, MonitorHandle>,
}

impl MonitorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a monitor unless one is already active for `hex`.
    ///
    /// `spawn` only runs when a new monitor is needed. A finished monitor
    /// left in the map is replaced.
    pub fn start_with<F>(&self, hex: AircraftHex, spawn: F) -> StartOutcome
    where
        F: FnOnce() -> MonitorHandle,
    {
        match self.monitors.entry(hex) {
            Entry::Occupied(mut entry) => {
                if entry.get().is_active() {
                    return StartOutcome::AlreadyActive;
                }
                entry.insert(spawn());
                StartOutcome::Started
            }
            Entry::Vacant(entry) => {
                entry.insert(spawn());
                StartOutcome::Started
            }
        }
    }

    /// Request a stop and wait up to `timeout` for the loop to finish.
    ///
    /// The entry is removed either way.
    pub async fn stop(&self, hex: &AircraftHex, timeout: Duration) -> StopOutcome {
        let (id, status) = {
            let Some(handle) = self.monitors.get(hex) else {
                return StopOutcome::NotTracking;
            };
            if !handle.is_active() {
                let id = handle.id();
                drop(handle);
                self.monitors.remove_if(hex, |_, existing| existing.id() == id);
                return StopOutcome::NotTracking;
            }
            handle.request_stop();
            (handle.id(), handle.status_receiver())
        };

        let finished = wait_until_inactive(status, timeout).await;
        if !finished {
            tracing::warn!("Monitor for {} did not stop within {:?}", hex, timeout);
        }
        // A restart may have replaced the entry while we waited.
        self.monitors.remove_if(hex, |_, existing| existing.id() == id);

        if finished {
            StopOutcome::Stopped
        } else {
            StopOutcome::WindingDown
        }
    }

    /// Status for one aircraft. Unknown hexes report inactive.
    pub fn status(&self, hex: &AircraftHex) -> TrackerStatus {
        self.monitors
            .get(hex)
            .map(|handle| TrackerStatus::from_handle(handle.value()))
            .unwrap_or_else(|| TrackerStatus::untracked(hex))
    }

    pub fn list(&self) -> Vec<TrackerStatus> {
        let mut statuses: Vec<TrackerStatus> = self
            .monitors
            .iter()
            .map(|entry| TrackerStatus::from_handle(entry.value()))
            .collect();
        statuses.sort_by(|a, b| a.hex.cmp(&b.hex));
        statuses
    }

    pub fn active_count(&self) -> usize {
        self.monitors.iter().filter(|entry| entry.value().is_active()).count()
    }

    /// Stop every monitor; returns how many were active.
    pub async fn clear(&self, timeout: Duration) -> usize {
        let hexes: Vec<AircraftHex> = self.monitors.iter().map(|entry| entry.key().clone()).collect();
        let stops = hexes.iter().map(|hex| self.stop(hex, timeout));
        futures::future::join_all(stops)
            .await
            .into_iter()
            .filter(|outcome| *outcome != StopOutcome::NotTracking)
            .count()
    }
}
