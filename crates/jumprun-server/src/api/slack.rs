//! Slack Events API endpoint.
//!
//! Answers the URL verification handshake and turns channel messages into
//! tracker commands. Commands run in the background so the event is
//! acknowledged right away; replies go out through the notification channel.

use axum::{
    extract::State,
    http::HeaderMap,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::state::store::{resolve_aircraft, stop_message};
use crate::state::{AppState, StartOutcome, StartRequest, StopOutcome, TrackerState};

/// Set by Slack on redelivery of an event it considers unacknowledged.
pub const RETRY_HEADER: &str = "x-slack-retry-num";

pub const HELP_TEXT: &str = "Available commands: 'start plane=<key> dz=<key>' to begin tracking, \
'status' to check current state, 'stop [plane=<key>]' to stop tracking, 'clear' to stop everything";

#[derive(Debug, Deserialize)]
pub struct SlackPayload {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub challenge: Option<String>,
    pub event: Option<SlackEvent>,
}

#[derive(Debug, Deserialize)]
pub struct SlackEvent {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub text: String,
    /// Present on messages posted by bots, including our own replies
    pub bot_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SlackCommand {
    Start(StartRequest),
    /// No plane/hex means every tracker
    Stop(StartRequest),
    Status,
    Clear,
    Help,
}

/// Parse `start plane=king_air dz=mile_hi`, `stop`, `status`, `clear`.
pub fn parse_command(text: &str) -> SlackCommand {
    let lowered = text.to_lowercase();
    let words: Vec<&str> = lowered.split_whitespace().collect();
    let request = StartRequest {
        plane: arg(&words, "plane="),
        hex: arg(&words, "hex="),
        dz: arg(&words, "dz="),
    };

    let verb = words.iter().find(|word| {
        matches!(**word, "start" | "stop" | "status" | "clear" | "help")
    });
    match verb.copied() {
        Some("start") => SlackCommand::Start(request),
        Some("stop") => SlackCommand::Stop(request),
        Some("status") => SlackCommand::Status,
        Some("clear") => SlackCommand::Clear,
        _ => SlackCommand::Help,
    }
}

fn arg(words: &[&str], prefix: &str) -> Option<String> {
    words
        .iter()
        .find_map(|word| word.strip_prefix(prefix))
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// POST /slack/events
pub async fn slack_events(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<SlackPayload>,
) -> Response {
    tracing::debug!("Incoming Slack payload: {:?}", payload);

    if payload.kind.as_deref() == Some("url_verification") {
        return payload.challenge.unwrap_or_default().into_response();
    }

    let ok = Json(serde_json::json!({}));
    let Some(event) = payload.event else {
        return ok.into_response();
    };
    if event.kind.as_deref() != Some("message") || event.bot_id.is_some() {
        return ok.into_response();
    }

    if let Some(retry) = headers.get(RETRY_HEADER) {
        tracing::debug!("Ignoring Slack redelivery {:?}", retry);
        return ok.into_response();
    }

    let command = parse_command(&event.text);
    tokio::spawn(async move {
        if let Some(reply) = run_command(&state, command).await {
            state.reply(reply);
        }
    });
    ok.into_response()
}

/// Execute a command. Returns the reply to post, or `None` when the state
/// already announced the outcome itself.
pub async fn run_command(state: &AppState, command: SlackCommand) -> Option<String> {
    let reply = match command {
        SlackCommand::Start(request) => match state.start(&request) {
            Ok(response) if response.outcome == StartOutcome::Started => return None,
            Ok(response) => response.message,
            Err(err) => format!("❌ {}", err),
        },
        SlackCommand::Stop(request) if request.plane.is_none() && request.hex.is_none() => {
            let stopped = state.clear().await;
            format!("🛑 Stopped all trackers ({})", stopped)
        }
        SlackCommand::Stop(request) => match resolve_aircraft(&request) {
            Ok((hex, _)) => match state.stop(&hex).await {
                StopOutcome::NotTracking => stop_message(&hex, StopOutcome::NotTracking),
                _ => return None,
            },
            Err(err) => format!("❌ {}", err),
        },
        SlackCommand::Clear => {
            let stopped = state.clear().await;
            format!("🛑 Stopped all trackers ({})", stopped)
        }
        SlackCommand::Status => {
            let active: Vec<String> = state
                .list()
                .into_iter()
                .filter(|status| status.state == TrackerState::Active)
                .map(|status| {
                    let phase = status
                        .phase
                        .map(|phase| phase.to_string())
                        .unwrap_or_else(|| "unknown".to_string());
                    let name = status.aircraft.unwrap_or_else(|| status.hex.to_string());
                    format!("{} ({})", name, phase)
                })
                .collect();
            if active.is_empty() {
                "❌ No active trackers".to_string()
            } else {
                format!("✅ Currently tracking: {}", active.join(", "))
            }
        }
        SlackCommand::Help => HELP_TEXT.to_string(),
    };
    Some(reply)
}
