//! Thresholds and fixed gates for phase classification.

use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::time::Duration;
use thiserror::Error;

/// Ground speed below which the aircraft is considered on the ground (knots).
pub const LANDED_GROUND_SPEED_KTS: f64 = 30.0;
/// Minimum climb rate counted toward a climb confirmation (ft/min).
pub const CLIMB_RATE_FPM: f64 = 300.0;
/// Jump run heading window (degrees true, inclusive).
pub const JUMP_RUN_HEADING: RangeInclusive<f64> = 270.0..=330.0;
/// Jump and hop-n-pop runs are only flown west of this meridian.
pub const JUMP_RUN_LONGITUDE_GATE: f64 = -105.16;
/// Half-width of the exit altitude band around `jump_run_altitude` (ft).
pub const JUMP_RUN_BAND_FT: f64 = 1000.0;
/// Half-width of the band around `hop_n_pop_altitude` (ft).
pub const HOP_N_POP_BAND_FT: f64 = 500.0;
/// Consecutive qualifying readings before climbing/descending is announced.
pub const CONFIRMATION_DEPTH: u32 = 3;
/// Consecutive no-data polls before a monitor gives up.
pub const NO_DATA_BUDGET: u32 = 5;
/// Time between polls.
pub const POLL_INTERVAL: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{field} must be a finite number")]
    NotFinite { field: &'static str },
    #[error("radius_nm must be positive, got {0}")]
    NonPositiveRadius(f64),
    #[error("climb_threshold ({climb}) must be below jump_run_altitude ({jump_run})")]
    ClimbAboveJumpRun { climb: f64, jump_run: f64 },
    #[error("descent_threshold must be negative, got {0}")]
    NonNegativeDescent(f64),
}

/// Per-monitor thresholds. Immutable for the lifetime of a monitor.
///
/// `climb_threshold`, `jump_run_altitude` and `hop_n_pop_altitude` are
/// heights above the runway; `runway_altitude` is MSL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdConfig {
    pub climb_threshold: f64,
    /// Vertical rate (ft/min, negative) below which a reading counts as descending
    pub descent_threshold: f64,
    pub jump_run_altitude: f64,
    pub hop_n_pop_altitude: f64,
    pub runway_altitude: f64,
    pub dz_latitude: f64,
    pub dz_longitude: f64,
    pub radius_nm: f64,
}

impl ThresholdConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fields = [
            ("climb_threshold", self.climb_threshold),
            ("descent_threshold", self.descent_threshold),
            ("jump_run_altitude", self.jump_run_altitude),
            ("hop_n_pop_altitude", self.hop_n_pop_altitude),
            ("runway_altitude", self.runway_altitude),
            ("dz_latitude", self.dz_latitude),
            ("dz_longitude", self.dz_longitude),
            ("radius_nm", self.radius_nm),
        ];
        for (field, value) in fields {
            if !value.is_finite() {
                return Err(ConfigError::NotFinite { field });
            }
        }
        if self.radius_nm <= 0.0 {
            return Err(ConfigError::NonPositiveRadius(self.radius_nm));
        }
        if self.climb_threshold >= self.jump_run_altitude {
            return Err(ConfigError::ClimbAboveJumpRun {
                climb: self.climb_threshold,
                jump_run: self.jump_run_altitude,
            });
        }
        if self.descent_threshold >= 0.0 {
            return Err(ConfigError::NonNegativeDescent(self.descent_threshold));
        }
        Ok(())
    }
}

/// Heading and longitude gates shared by jump run and hop-n-pop run.
pub fn on_jump_run_line(ground_track: Option<f64>, longitude: Option<f64>) -> bool {
    let on_heading = ground_track.is_some_and(|track| JUMP_RUN_HEADING.contains(&track));
    let west_of_gate = longitude.is_some_and(|lon| lon < JUMP_RUN_LONGITUDE_GATE);
    on_heading && west_of_gate
}
