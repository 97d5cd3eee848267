//! Flight phase classifier.
//!
//! Turns one telemetry snapshot plus the monitor's debounce counters into
//! zero or more phase transitions. Pure logic, no I/O.
//!
//! Rules run in a fixed order and later rules overwrite earlier ones within
//! the same evaluation. Only the "insufficient data" and "on the ground"
//! rules short-circuit.

use crate::models::{ClassifierState, FlightPhase, PhaseTransition, TelemetrySnapshot};
use crate::rules::{
    on_jump_run_line, ThresholdConfig, CLIMB_RATE_FPM, CONFIRMATION_DEPTH, HOP_N_POP_BAND_FT,
    JUMP_RUN_BAND_FT, LANDED_GROUND_SPEED_KTS,
};

/// Stateless rule set; all mutable state lives in [`ClassifierState`].
#[derive(Debug, Clone)]
pub struct Classifier {
    config: ThresholdConfig,
}

impl Classifier {
    pub fn new(config: ThresholdConfig) -> Self {
        Self { config }
    }

    /// Evaluate one poll result.
    ///
    /// `None` is the no-data path: the no-data counter grows and the phase is
    /// forced to `landed`. Any snapshot resets the no-data counter first.
    pub fn classify(
        &self,
        snapshot: Option<&TelemetrySnapshot>,
        state: &mut ClassifierState,
    ) -> Vec<PhaseTransition> {
        let mut transitions = Vec::new();
        match snapshot {
            Some(snapshot) => {
                state.no_data_counter = 0;
                self.evaluate(snapshot, state, &mut transitions);
            }
            None => {
                state.no_data_counter = state.no_data_counter.saturating_add(1);
                set_phase(
                    state,
                    &mut transitions,
                    FlightPhase::Landed,
                    "🛬 Plane landed or transponder off".to_string(),
                );
            }
        }
        transitions
    }

    fn evaluate(
        &self,
        snapshot: &TelemetrySnapshot,
        state: &mut ClassifierState,
        transitions: &mut Vec<PhaseTransition>,
    ) {
        let agl = snapshot.altitude.map(|altitude| altitude - self.config.runway_altitude);
        let vertical_speed = snapshot.vertical_speed;
        let ground_speed = snapshot.ground_speed;

        tracing::debug!(
            phase = ?state.current_phase,
            altitude = ?snapshot.altitude,
            agl = ?agl,
            vertical_speed = ?vertical_speed,
            ground_speed = ?ground_speed,
            ground_track = ?snapshot.ground_track,
            "Evaluating snapshot"
        );

        if agl.is_none() && vertical_speed.is_none() && ground_speed.is_none() {
            set_phase(
                state,
                transitions,
                FlightPhase::Unknown,
                "❓ Unable to determine aircraft state - insufficient data".to_string(),
            );
            return;
        }

        if let Some(speed) = ground_speed {
            if speed < LANDED_GROUND_SPEED_KTS {
                set_phase(
                    state,
                    transitions,
                    FlightPhase::Landed,
                    format!("🛬 Plane appears to be on ground (speed: {speed:.0} kts)"),
                );
                return;
            }
        }

        if let Some(agl) = agl {
            let in_climb_band =
                self.config.climb_threshold <= agl && agl <= self.config.jump_run_altitude;
            if let Some(rate) = vertical_speed.filter(|rate| in_climb_band && *rate > CLIMB_RATE_FPM) {
                // Never reset on a miss; only the descent counter is.
                state.ascent_counter = state.ascent_counter.saturating_add(1);
                if state.ascent_counter >= CONFIRMATION_DEPTH {
                    set_phase(
                        state,
                        transitions,
                        FlightPhase::Climbing,
                        format!("⬆️ Load is climbing! Altitude: {agl:.0} ft AGL, Rate: {rate:.0} ft/min"),
                    );
                }
            }

            let on_line = on_jump_run_line(snapshot.ground_track, snapshot.longitude);
            let heading = snapshot.ground_track.unwrap_or_default();

            if (agl - self.config.jump_run_altitude).abs() < JUMP_RUN_BAND_FT {
                if on_line {
                    set_phase(
                        state,
                        transitions,
                        FlightPhase::JumpRun,
                        format!("🪂 Jump run! Altitude: {agl:.0} ft AGL, Heading: {heading:.0}°"),
                    );
                } else {
                    set_phase(
                        state,
                        transitions,
                        FlightPhase::AtAltitude,
                        format!("✈️ At jump altitude: {agl:.0} ft AGL"),
                    );
                }
            }

            if (agl - self.config.hop_n_pop_altitude).abs() < HOP_N_POP_BAND_FT {
                if on_line {
                    set_phase(
                        state,
                        transitions,
                        FlightPhase::HopNPopRun,
                        format!("🪂 Hop-n-pop run! Altitude: {agl:.0} ft AGL, Heading: {heading:.0}°"),
                    );
                } else {
                    set_phase(
                        state,
                        transitions,
                        FlightPhase::AtHopNPopAltitude,
                        format!("✈️ At hop-n-pop altitude: {agl:.0} ft AGL"),
                    );
                }
            }
        }

        match vertical_speed {
            Some(rate) if rate < self.config.descent_threshold => {
                state.descent_counter = state.descent_counter.saturating_add(1);
                if state.descent_counter >= CONFIRMATION_DEPTH {
                    set_phase(
                        state,
                        transitions,
                        FlightPhase::Descending,
                        format!("⬇️ Plane descending at {rate:.0} ft/min"),
                    );
                }
            }
            _ => state.descent_counter = 0,
        }

        // Only reachable before any phase has ever been assigned.
        if state.current_phase.is_none() {
            if let Some(agl) = agl {
                set_phase(
                    state,
                    transitions,
                    FlightPhase::Flying,
                    format!("✈️ Flying at {agl:.0} ft AGL"),
                );
            }
        }
    }
}

fn set_phase(
    state: &mut ClassifierState,
    transitions: &mut Vec<PhaseTransition>,
    phase: FlightPhase,
    reason: String,
) {
    if state.current_phase == Some(phase) {
        return;
    }
    tracing::debug!(from = ?state.current_phase, to = %phase, %reason, "Phase transition");
    transitions.push(PhaseTransition {
        from: state.current_phase,
        to: phase,
        reason,
    });
    state.current_phase = Some(phase);
}
