//! Error types for the vitals service

use std::time::Duration;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Errors that can occur in the vitals service
#[derive(Debug, thiserror::Error)]
pub enum VitalsError {
    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("No recent samples in last {window:?}")]
    InsufficientData { window: Duration },

    #[error("A collection session is already running")]
    SessionBusy,

    #[error("Collection session cancelled")]
    Cancelled,

    #[error("Recommendation service error: {0}")]
    Recommendation(String),

    #[error("Recommendation service timed out after {0:?}")]
    RecommendationTimeout(Duration),

    #[error("Report store error: {0}")]
    Store(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

impl VitalsError {
    /// HTTP status returned to callers for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            VitalsError::Validation(_) | VitalsError::InsufficientData { .. } => {
                StatusCode::BAD_REQUEST
            }
            VitalsError::SessionBusy => StatusCode::CONFLICT,
            VitalsError::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
            VitalsError::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message shown to the caller. Collaborator details stay in the logs.
    pub fn public_message(&self) -> String {
        match self {
            VitalsError::InsufficientData { window } => {
                format!("Not enough live data from ESP (need ~{:?} of readings)", window)
            }
            VitalsError::Recommendation(_) | VitalsError::RecommendationTimeout(_) => {
                "Failed to get recommendations".to_string()
            }
            VitalsError::Store(_) | VitalsError::Http(_) => "Report store unavailable".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for VitalsError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = axum::Json(serde_json::json!({ "error": self.public_message() }));
        (status, body).into_response()
    }
}

/// Result type alias for vitals operations
pub type Result<T> = std::result::Result<T, VitalsError>;
