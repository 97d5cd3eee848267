//! Application state: configuration, collaborators and the monitor registry.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use jumprun_core::presets::{self, DropzonePreset};
use jumprun_core::{AircraftHex, Notification, NotificationKind, NotificationPort, TelemetrySource};

use crate::config::Config;
use crate::error::TrackerError;
use crate::loops::poll_loop::{spawn_monitor, MonitorSettings, MonitorSpec};
use crate::state::registry::{MonitorRegistry, StartOutcome, StopOutcome, TrackerStatus};

/// Label used for messages that are not about one aircraft.
pub const CONTROL_LABEL: &str = "jumprun";

/// Start request as accepted by the REST and Slack front ends.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct StartRequest {
    /// Aircraft preset key, e.g. `king_air`
    #[serde(default)]
    pub plane: Option<String>,
    /// Raw ICAO hex, used when no preset is given
    #[serde(default)]
    pub hex: Option<String>,
    /// Dropzone preset key; defaults to the configured dropzone
    #[serde(default)]
    pub dz: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StartResponse {
    pub hex: AircraftHex,
    pub aircraft: String,
    pub dropzone: String,
    pub outcome: StartOutcome,
    pub message: String,
}

/// Thread-safe server state.
pub struct AppState {
    config: Config,
    registry: MonitorRegistry,
    source: Option<Arc<dyn TelemetrySource>>,
    notifier: Option<Arc<dyn NotificationPort>>,
    settings: MonitorSettings,
}

impl AppState {
    /// `source` and `notifier` are `None` when their credentials are missing;
    /// starting a monitor then fails with a user-facing error.
    pub fn new(
        config: Config,
        source: Option<Arc<dyn TelemetrySource>>,
        notifier: Option<Arc<dyn NotificationPort>>,
    ) -> Self {
        Self {
            config,
            registry: MonitorRegistry::new(),
            source,
            notifier,
            settings: MonitorSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: MonitorSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn registry(&self) -> &MonitorRegistry {
        &self.registry
    }

    /// Start tracking an aircraft. No-op if it is already tracked.
    ///
    /// A newly started monitor is announced on the notification channel
    /// before its first poll.
    pub fn start(&self, request: &StartRequest) -> Result<StartResponse, TrackerError> {
        let (hex, aircraft) = resolve_aircraft(request)?;
        let dz_key = request
            .dz
            .as_deref()
            .unwrap_or(self.config.default_dropzone.as_str());
        let dropzone: &DropzonePreset = presets::dropzone(dz_key)
            .ok_or_else(|| TrackerError::UnknownDropzone(dz_key.to_string()))?;
        let thresholds = dropzone.thresholds();
        thresholds.validate()?;

        let source = self
            .source
            .clone()
            .ok_or(TrackerError::MissingCredential("RAPIDAPI_KEY"))?;
        let port = self
            .notifier
            .clone()
            .ok_or(TrackerError::MissingCredential("SLACK_WEBHOOK_URL"))?;

        let settings = self.settings;
        let started = format!("✅ Started tracking {} at {}", aircraft, dropzone.name);
        let outcome = self.registry.start_with(hex.clone(), || {
            port.notify(Notification::new(
                &aircraft,
                NotificationKind::Info,
                started.clone(),
            ));
            spawn_monitor(MonitorSpec {
                hex: hex.clone(),
                aircraft: aircraft.clone(),
                dropzone: dropzone.key.to_string(),
                thresholds,
                source,
                port,
                settings,
            })
        });

        let message = match outcome {
            StartOutcome::Started => {
                tracing::info!("Started tracking {} at {}", aircraft, dropzone.key);
                started
            }
            StartOutcome::AlreadyActive => format!("🔄 Already tracking {}", aircraft),
        };

        Ok(StartResponse {
            hex,
            aircraft,
            dropzone: dropzone.key.to_string(),
            outcome,
            message,
        })
    }

    /// Stop one monitor. An actual stop is announced on the notification
    /// channel; stopping an untracked hex is silent.
    pub async fn stop(&self, hex: &AircraftHex) -> StopOutcome {
        let outcome = self.registry.stop(hex, self.config.stop_timeout()).await;
        tracing::info!("Stop {}: {:?}", hex, outcome);
        if outcome != StopOutcome::NotTracking {
            self.post(&aircraft_label(hex), stop_message(hex, outcome));
        }
        outcome
    }

    pub fn status(&self, hex: &AircraftHex) -> TrackerStatus {
        self.registry.status(hex)
    }

    pub fn list(&self) -> Vec<TrackerStatus> {
        self.registry.list()
    }

    /// Stop all monitors; returns how many were active.
    pub async fn clear(&self) -> usize {
        let stopped = self.registry.clear(self.config.stop_timeout()).await;
        tracing::info!("Cleared {} tracker(s)", stopped);
        stopped
    }

    /// Post an operator-facing reply through the notification channel.
    pub fn reply(&self, text: impl Into<String>) {
        self.post(CONTROL_LABEL, text);
    }

    fn post(&self, label: &str, text: impl Into<String>) {
        let text = text.into();
        match &self.notifier {
            Some(port) => port.notify(Notification::new(label, NotificationKind::Info, text)),
            None => tracing::info!("{}: {}", label, text),
        }
    }
}

pub fn stop_message(hex: &AircraftHex, outcome: StopOutcome) -> String {
    match outcome {
        StopOutcome::Stopped => format!("🛑 Stopped tracking {}", hex),
        StopOutcome::WindingDown => format!("🛑 Stop requested for {}; still finishing its last poll", hex),
        StopOutcome::NotTracking => format!("No tracking in progress for {}", hex),
    }
}

/// Label an aircraft as "name (HEX)", or just the hex when unnamed.
pub fn aircraft_label(hex: &AircraftHex) -> String {
    match presets::aircraft_name(hex) {
        Some(name) => format!("{} ({})", name, hex),
        None => hex.to_string(),
    }
}

pub(crate) fn resolve_aircraft(request: &StartRequest) -> Result<(AircraftHex, String), TrackerError> {
    if let Some(key) = request.plane.as_deref() {
        let preset =
            presets::aircraft(key).ok_or_else(|| TrackerError::UnknownAircraft(key.to_string()))?;
        let hex = preset.hex()?;
        let label = aircraft_label(&hex);
        return Ok((hex, label));
    }
    if let Some(raw) = request.hex.as_deref() {
        let hex = AircraftHex::parse(raw)?;
        let label = aircraft_label(&hex);
        return Ok((hex, label));
    }
    Err(TrackerError::MissingAircraft)
}
