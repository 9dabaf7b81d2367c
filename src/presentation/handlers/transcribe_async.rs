use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Serialize;

use crate::application::ports::{ArtifactFetcher, EngineRunner};
use crate::application::services::JobSource;
use crate::presentation::handlers::error::{ErrorResponse, orchestrator_error_response};
use crate::presentation::handlers::transcribe::{TranscribeRequest, build_params};
use crate::presentation::state::AppState;

#[derive(Serialize)]
pub struct TranscribeAsyncResponse {
    pub task_id: String,
    pub status_url: String,
}

/// Admit a job and return immediately; the caller polls the status endpoint.
#[tracing::instrument(skip(state, request))]
pub async fn transcribe_async_handler<F, R>(
    State(state): State<AppState<F, R>>,
    Json(request): Json<TranscribeRequest>,
) -> impl IntoResponse
where
    F: ArtifactFetcher + 'static,
    R: EngineRunner + 'static,
{
    let audio_url = match request.audio_url {
        Some(url) if !url.trim().is_empty() => url,
        _ => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: "audio_url is required".to_string(),
                }),
            )
                .into_response();
        }
    };

    let params = match build_params(
        &state.settings,
        request.language,
        request.model,
        request.output_format,
        request.word_thold,
        request.no_speech_thold,
        request.prompt,
    ) {
        Ok(p) => p,
        Err(e) => {
            return (StatusCode::BAD_REQUEST, Json(ErrorResponse { error: e })).into_response();
        }
    };

    match state
        .orchestrator
        .submit(JobSource::RemoteUrl(audio_url), params)
        .await
    {
        Ok(job_id) => {
            tracing::info!(job_id = %job_id, "Async transcription admitted");
            (
                StatusCode::OK,
                Json(TranscribeAsyncResponse {
                    task_id: job_id.to_string(),
                    status_url: format!("/transcription-status/{}", job_id),
                }),
            )
                .into_response()
        }
        Err(e) => {
            tracing::warn!(error = %e, "Async transcription rejected");
            orchestrator_error_response(e)
        }
    }
}
