//! Shared server state.

pub mod registry;
pub mod store;

pub use registry::{MonitorRegistry, StartOutcome, StopOutcome, TrackerState, TrackerStatus};
pub use store::{AppState, StartRequest, StartResponse};
