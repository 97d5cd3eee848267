//! Flight phase tracking for skydiving aircraft.
//!
//! Classifies ADS-B position snapshots into jump-operation phases and gates
//! phase changes into notifications.

pub mod classifier;
pub mod gate;
pub mod models;
pub mod presets;
pub mod rules;
pub mod source;

pub use classifier::Classifier;
pub use gate::{Notification, NotificationKind, NotificationPort, TransitionGate};
pub use models::{
    AircraftHex, ClassifierState, FlightPhase, HexError, PhaseTransition, TelemetrySnapshot,
};
pub use rules::{ConfigError, ThresholdConfig};
pub use source::{ReplaySource, TelemetrySource};
