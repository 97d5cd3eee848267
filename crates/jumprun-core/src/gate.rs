//! Transition gate and the outbound notification port.
//!
//! The gate is the only path from classifier output to the outside world:
//! one notification per phase change, in classifier order.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

use crate::models::{FlightPhase, PhaseTransition};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NotificationKind {
    Transition {
        from: Option<FlightPhase>,
        to: FlightPhase,
    },
    /// Lifecycle and operator messages
    Info,
    /// Last message of a monitor that gave up
    Terminal,
}

/// A message on its way to the notification channel.
#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    /// Display label of the aircraft ("name (HEX)")
    pub aircraft: String,
    pub kind: NotificationKind,
    pub text: String,
    /// Stamped where the notification is created, not where it is delivered
    pub timestamp: DateTime<Utc>,
}

impl Notification {
    pub fn new(aircraft: impl Into<String>, kind: NotificationKind, text: impl Into<String>) -> Self {
        Self {
            aircraft: aircraft.into(),
            kind,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }

    /// Plain-text rendering used by every sink.
    pub fn render(&self) -> String {
        format!(
            "[{}] {}: {}",
            self.timestamp.format("%H:%M:%S %B %d, %Y"),
            self.aircraft,
            self.text
        )
    }
}

/// Accepts notifications without blocking the caller.
///
/// Implementations either deliver inline (logging, test recorders) or hand
/// off to a queue drained elsewhere.
pub trait NotificationPort: Send + Sync {
    fn notify(&self, notification: Notification);
}

impl<F> NotificationPort for F
where
    F: Fn(Notification) + Send + Sync,
{
    fn notify(&self, notification: Notification) {
        self(notification)
    }
}

/// Emits one notification per phase change.
pub struct TransitionGate {
    aircraft: String,
    port: Arc<dyn NotificationPort>,
    last_announced: Option<FlightPhase>,
}

impl TransitionGate {
    pub fn new(aircraft: impl Into<String>, port: Arc<dyn NotificationPort>) -> Self {
        Self {
            aircraft: aircraft.into(),
            port,
            last_announced: None,
        }
    }

    pub fn aircraft(&self) -> &str {
        &self.aircraft
    }

    pub fn last_announced(&self) -> Option<FlightPhase> {
        self.last_announced
    }

    /// Forward transitions in order; returns how many were announced.
    pub fn dispatch(&mut self, transitions: Vec<PhaseTransition>) -> usize {
        let mut sent = 0;
        for transition in transitions {
            if self.last_announced == Some(transition.to) {
                continue;
            }
            self.last_announced = Some(transition.to);
            tracing::info!(
                aircraft = %self.aircraft,
                from = ?transition.from,
                to = %transition.to,
                "{}",
                transition.reason
            );
            self.port.notify(Notification::new(
                self.aircraft.clone(),
                NotificationKind::Transition {
                    from: transition.from,
                    to: transition.to,
                },
                transition.reason,
            ));
            sent += 1;
        }
        sent
    }

    /// Send a message that is not a phase change.
    pub fn announce(&self, kind: NotificationKind, text: impl Into<String>) {
        let text = text.into();
        tracing::info!(aircraft = %self.aircraft, "{}", text);
        self.port.notify(Notification::new(self.aircraft.clone(), kind, text));
    }
}
