//! Known aircraft and dropzones, selectable by short key.

use crate::models::{AircraftHex, HexError};
use crate::rules::ThresholdConfig;

#[derive(Debug, Clone, Copy)]
pub struct AircraftPreset {
    pub key: &'static str,
    pub hex: &'static str,
    pub name: &'static str,
}

impl AircraftPreset {
    pub fn hex(&self) -> Result<AircraftHex, HexError> {
        AircraftHex::parse(self.hex)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DropzonePreset {
    pub key: &'static str,
    pub name: &'static str,
    pub dz_latitude: f64,
    pub dz_longitude: f64,
    pub runway_altitude: f64,
    pub climb_threshold: f64,
    pub descent_threshold: f64,
    pub jump_run_altitude: f64,
    pub hop_n_pop_altitude: f64,
    pub radius_nm: f64,
}

impl DropzonePreset {
    pub fn thresholds(&self) -> ThresholdConfig {
        ThresholdConfig {
            climb_threshold: self.climb_threshold,
            descent_threshold: self.descent_threshold,
            jump_run_altitude: self.jump_run_altitude,
            hop_n_pop_altitude: self.hop_n_pop_altitude,
            runway_altitude: self.runway_altitude,
            dz_latitude: self.dz_latitude,
            dz_longitude: self.dz_longitude,
            radius_nm: self.radius_nm,
        }
    }
}

pub const KING_AIR: AircraftPreset = AircraftPreset {
    key: "king_air",
    hex: "ACBC30",
    name: "Mile-Hi Skydiving King Air",
};

pub const TWIN_OTTER: AircraftPreset = AircraftPreset {
    key: "twin_otter",
    hex: "A06796",
    name: "Mile-Hi Skydiving Twin Otter",
};

pub const MILE_HI: DropzonePreset = DropzonePreset {
    key: "mile_hi",
    name: "Mile-Hi Skydiving, Longmont",
    dz_latitude: 40.16638,
    dz_longitude: -105.16178,
    runway_altitude: 5000.0,
    climb_threshold: 300.0,
    descent_threshold: -500.0,
    jump_run_altitude: 12_500.0,
    hop_n_pop_altitude: 5000.0,
    radius_nm: 5.0,
};

pub const AIRCRAFT: &[AircraftPreset] = &[KING_AIR, TWIN_OTTER];
pub const DROPZONES: &[DropzonePreset] = &[MILE_HI];

pub fn aircraft(key: &str) -> Option<&'static AircraftPreset> {
    AIRCRAFT.iter().find(|preset| preset.key.eq_ignore_ascii_case(key))
}

pub fn dropzone(key: &str) -> Option<&'static DropzonePreset> {
    DROPZONES.iter().find(|preset| preset.key.eq_ignore_ascii_case(key))
}

/// Aircraft name for a hex, if it is one of the presets.
pub fn aircraft_name(hex: &AircraftHex) -> Option<&'static str> {
    AIRCRAFT
        .iter()
        .find(|preset| preset.hex == hex.as_str())
        .map(|preset| preset.name)
}
