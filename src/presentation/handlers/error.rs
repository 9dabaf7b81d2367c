use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::application::ports::EngineError;
use crate::application::services::OrchestratorError;

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Map pipeline failures onto the HTTP surface: 429 for the busy gate, 400
/// for caller mistakes (including download failures, as the original service
/// did), 408 for the hard timeout, 500 for engine and internal faults.
pub fn orchestrator_error_response(error: OrchestratorError) -> Response {
    let status = match &error {
        OrchestratorError::Busy => StatusCode::TOO_MANY_REQUESTS,
        OrchestratorError::Validation(_) => StatusCode::BAD_REQUEST,
        OrchestratorError::Download(_) => StatusCode::BAD_REQUEST,
        OrchestratorError::Engine(EngineError::Timeout { .. }) => StatusCode::REQUEST_TIMEOUT,
        OrchestratorError::Engine(_) => StatusCode::INTERNAL_SERVER_ERROR,
        OrchestratorError::OutputNotFound => StatusCode::INTERNAL_SERVER_ERROR,
        OrchestratorError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
        }),
    )
        .into_response()
}
