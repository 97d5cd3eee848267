//! Errors surfaced to control-surface callers.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use jumprun_core::{ConfigError, HexError};

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("{0} is not configured")]
    MissingCredential(&'static str),
    #[error("Invalid plane {0:?}")]
    UnknownAircraft(String),
    #[error("Invalid DZ {0:?}")]
    UnknownDropzone(String),
    #[error("Specify plane=<key> or hex=<HEX>")]
    MissingAircraft,
    #[error(transparent)]
    InvalidHex(#[from] HexError),
    #[error("Invalid thresholds: {0}")]
    InvalidThresholds(#[from] ConfigError),
}

impl TrackerError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            TrackerError::MissingCredential(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for TrackerError {
    fn into_response(self) -> Response {
        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (self.status_code(), body).into_response()
    }
}
