use axum::Json;
use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;

use crate::application::ports::{ArtifactFetcher, EngineRunner, TranscriptStoreError};
use crate::presentation::handlers::error::ErrorResponse;
use crate::presentation::state::AppState;

/// Download a persisted transcript file as an attachment.
#[tracing::instrument(skip(state))]
pub async fn transcription_file_handler<F, R>(
    State(state): State<AppState<F, R>>,
    Path(file_name): Path<String>,
) -> impl IntoResponse
where
    F: ArtifactFetcher + 'static,
    R: EngineRunner + 'static,
{
    match state.transcripts.open(&file_name).await {
        Ok(contents) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", file_name),
                ),
            ],
            contents,
        )
            .into_response(),
        Err(TranscriptStoreError::InvalidName(name)) => (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: format!("Invalid transcript name: {}", name),
            }),
        )
            .into_response(),
        Err(TranscriptStoreError::NotFound(name)) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("Transcript not found: {}", name),
            }),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to read transcript");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: format!("Failed to read transcript: {}", e),
                }),
            )
                .into_response()
        }
    }
}
