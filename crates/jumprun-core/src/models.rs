//! Core data models for aircraft phase tracking.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// One normalized position reading.
///
/// Every field is optional: `None` means the source did not report it this
/// cycle, never zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySnapshot {
    /// Geometric altitude in feet (MSL)
    #[serde(default)]
    pub altitude: Option<f64>,
    /// Barometric altitude in feet
    #[serde(default)]
    pub altitude_barometric: Option<f64>,
    /// Vertical rate in ft/min
    #[serde(default)]
    pub vertical_speed: Option<f64>,
    /// Ground speed in knots
    #[serde(default)]
    pub ground_speed: Option<f64>,
    /// True track over ground, 0-360 degrees
    #[serde(default)]
    pub ground_track: Option<f64>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub aircraft_type: Option<String>,
    /// Pilot-selected altitude in feet
    #[serde(default)]
    pub target_altitude: Option<f64>,
}

impl TelemetrySnapshot {
    pub fn with_altitude(mut self, altitude: f64) -> Self {
        self.altitude = Some(altitude);
        self
    }

    pub fn with_vertical_speed(mut self, vertical_speed: f64) -> Self {
        self.vertical_speed = Some(vertical_speed);
        self
    }

    pub fn with_ground_speed(mut self, ground_speed: f64) -> Self {
        self.ground_speed = Some(ground_speed);
        self
    }

    /// Set track and position together; the jump run gates need both.
    pub fn with_track(mut self, ground_track: f64, latitude: f64, longitude: f64) -> Self {
        self.ground_track = Some(ground_track);
        self.latitude = Some(latitude);
        self.longitude = Some(longitude);
        self
    }
}

/// Flight phase as announced to jumpers and manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlightPhase {
    /// Not enough data to decide
    Unknown,
    /// On the ground, or transponder silent
    Landed,
    Climbing,
    /// At exit altitude, not yet on jump run heading
    AtAltitude,
    JumpRun,
    AtHopNPopAltitude,
    HopNPopRun,
    Descending,
    /// Airborne with no more specific match
    Flying,
}

impl FlightPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlightPhase::Unknown => "unknown",
            FlightPhase::Landed => "landed",
            FlightPhase::Climbing => "climbing",
            FlightPhase::AtAltitude => "at_altitude",
            FlightPhase::JumpRun => "jump_run",
            FlightPhase::AtHopNPopAltitude => "at_hop_n_pop_altitude",
            FlightPhase::HopNPopRun => "hop_n_pop_run",
            FlightPhase::Descending => "descending",
            FlightPhase::Flying => "flying",
        }
    }
}

impl fmt::Display for FlightPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A phase change produced by one classifier evaluation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhaseTransition {
    pub from: Option<FlightPhase>,
    pub to: FlightPhase,
    /// Human-readable reason with the triggering values embedded
    pub reason: String,
}

/// Mutable debounce state, owned by exactly one monitor.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ClassifierState {
    pub current_phase: Option<FlightPhase>,
    pub ascent_counter: u32,
    pub descent_counter: u32,
    pub no_data_counter: u32,
}

impl ClassifierState {
    pub fn new() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HexError {
    #[error("aircraft hex must be 6 hex digits, got {0:?}")]
    InvalidLength(String),
    #[error("aircraft hex {0:?} contains non-hex characters")]
    InvalidDigit(String),
}

/// 24-bit ICAO aircraft address, always uppercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AircraftHex(String);

impl AircraftHex {
    pub fn parse(raw: &str) -> Result<Self, HexError> {
        let trimmed = raw.trim();
        if trimmed.len() != 6 {
            return Err(HexError::InvalidLength(trimmed.to_string()));
        }
        if !trimmed.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(HexError::InvalidDigit(trimmed.to_string()));
        }
        Ok(Self(trimmed.to_ascii_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for AircraftHex {
    type Err = HexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for AircraftHex {
    type Error = HexError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<AircraftHex> for String {
    fn from(hex: AircraftHex) -> Self {
        hex.0
    }
}

impl fmt::Display for AircraftHex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_is_normalized_to_uppercase() {
        let hex = AircraftHex::parse(" acbc30 ").unwrap();
        assert_eq!(hex.as_str(), "ACBC30");
    }

    #[test]
    fn hex_rejects_bad_input() {
        assert!(matches!(AircraftHex::parse("ACBC3"), Err(HexError::InvalidLength(_))));
        assert!(matches!(AircraftHex::parse("ACBC3G"), Err(HexError::InvalidDigit(_))));
    }

    #[test]
    fn snapshot_fields_default_to_absent() {
        let snapshot: TelemetrySnapshot = serde_json::from_str(r#"{"altitude": 9000}"#).unwrap();
        assert_eq!(snapshot.altitude, Some(9000.0));
        assert!(snapshot.ground_speed.is_none());
        assert!(snapshot.vertical_speed.is_none());
    }

    #[test]
    fn phase_serializes_snake_case() {
        let json = serde_json::to_string(&FlightPhase::AtHopNPopAltitude).unwrap();
        assert_eq!(json, "\"at_hop_n_pop_altitude\"");
        assert_eq!(FlightPhase::JumpRun.to_string(), "jump_run");
    }
}
