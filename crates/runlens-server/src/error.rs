use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use runlens_tabs::{AthleteId, StoreError, TabError};

/// Errors surfaced by the HTTP API outside the tab envelope.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("unauthorized")]
    Unauthorized,

    #[error("not found: {0}")]
    NotFound(String),

    #[error("processing already running for athlete {0}")]
    Conflict(AthleteId),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<TabError> for ApiError {
    fn from(err: TabError) -> Self {
        match err {
            TabError::Unauthorized => ApiError::Unauthorized,
            TabError::NotYetAvailable { key } => ApiError::NotFound(key),
            TabError::Store(StoreError::NotFound { key, name, .. }) => {
                ApiError::NotFound(format!("{key}/{name}"))
            }
            TabError::Store(StoreError::InvalidName(name)) => ApiError::NotFound(name),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        (status, Json(serde_json::json!({ "ok": false, "error": self.to_string() }))).into_response()
    }
}
