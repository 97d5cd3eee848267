//! REST routes.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;

use crate::api::slack;
use crate::error::TrackerError;
use crate::state::store::stop_message;
use crate::state::{AppState, StartOutcome, StartRequest, StartResponse, StopOutcome, TrackerStatus};
use jumprun_core::AircraftHex;

/// Create the API router.
pub fn create_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route(
            "/v1/trackers",
            get(list_trackers).post(start_tracker).delete(clear_trackers),
        )
        .route(
            "/v1/trackers/:hex",
            get(tracker_status).delete(stop_tracker),
        )
        .route("/slack/events", post(slack::slack_events))
}

#[derive(Debug, Serialize)]
pub struct StopResponse {
    pub hex: AircraftHex,
    pub outcome: StopOutcome,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ClearResponse {
    pub stopped: usize,
}

/// List all known trackers.
/// GET /v1/trackers
async fn list_trackers(State(state): State<Arc<AppState>>) -> Json<Vec<TrackerStatus>> {
    Json(state.list())
}

/// Start tracking an aircraft.
/// POST /v1/trackers
async fn start_tracker(
    State(state): State<Arc<AppState>>,
    Json(request): Json<StartRequest>,
) -> Result<(StatusCode, Json<StartResponse>), TrackerError> {
    let response = state.start(&request)?;
    let status = match response.outcome {
        StartOutcome::Started => StatusCode::CREATED,
        StartOutcome::AlreadyActive => StatusCode::OK,
    };
    Ok((status, Json(response)))
}

/// Status of one tracker; unknown hexes report inactive.
/// GET /v1/trackers/:hex
async fn tracker_status(
    State(state): State<Arc<AppState>>,
    Path(hex): Path<String>,
) -> Result<Json<TrackerStatus>, TrackerError> {
    let hex = AircraftHex::parse(&hex)?;
    Ok(Json(state.status(&hex)))
}

/// Stop one tracker, waiting a bounded time for it to finish.
/// DELETE /v1/trackers/:hex
async fn stop_tracker(
    State(state): State<Arc<AppState>>,
    Path(hex): Path<String>,
) -> Result<Json<StopResponse>, TrackerError> {
    let hex = AircraftHex::parse(&hex)?;
    let outcome = state.stop(&hex).await;
    Ok(Json(StopResponse {
        message: stop_message(&hex, outcome),
        hex,
        outcome,
    }))
}

/// Stop every tracker.
/// DELETE /v1/trackers
async fn clear_trackers(State(state): State<Arc<AppState>>) -> Json<ClearResponse> {
    Json(ClearResponse {
        stopped: state.clear().await,
    })
}
