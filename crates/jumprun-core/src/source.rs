//! Telemetry source port.

use futures::future::BoxFuture;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use crate::models::{AircraftHex, TelemetrySnapshot};

/// Produces the latest reading for an aircraft.
///
/// Every failure (transport, HTTP status, malformed payload, aircraft not in
/// the result) is reported as `None`.
pub trait TelemetrySource: Send + Sync {
    fn fetch<'a>(&'a self, hex: &'a AircraftHex) -> BoxFuture<'a, Option<TelemetrySnapshot>>;
}

/// Plays back a fixed sequence of poll results, then reports no data.
///
/// Used for offline replays of recorded flights.
#[derive(Debug, Default)]
pub struct ReplaySource {
    readings: Mutex<VecDeque<Option<TelemetrySnapshot>>>,
    calls: AtomicU32,
}

impl ReplaySource {
    pub fn new(readings: impl IntoIterator<Item = Option<TelemetrySnapshot>>) -> Self {
        Self {
            readings: Mutex::new(readings.into_iter().collect()),
            calls: AtomicU32::new(0),
        }
    }

    /// Number of fetches served so far.
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn remaining(&self) -> usize {
        self.readings.lock().map(|readings| readings.len()).unwrap_or(0)
    }
}

impl TelemetrySource for ReplaySource {
    fn fetch<'a>(&'a self, _hex: &'a AircraftHex) -> BoxFuture<'a, Option<TelemetrySnapshot>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self
            .readings
            .lock()
            .ok()
            .and_then(|mut readings| readings.pop_front())
            .flatten();
        Box::pin(async move { next })
    }
}
