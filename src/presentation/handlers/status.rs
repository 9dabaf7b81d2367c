use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Serialize;
use uuid::Uuid;

use crate::application::ports::{ArtifactFetcher, EngineRunner};
use crate::domain::{JobId, JobOutcome, TranscriptRef};
use crate::presentation::handlers::error::ErrorResponse;
use crate::presentation::state::AppState;

#[derive(Serialize)]
pub struct JobStatusResponse {
    pub status: String,
    pub progress: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
}

fn outcome_json(outcome: &JobOutcome) -> serde_json::Value {
    match outcome {
        JobOutcome::Success {
            transcript,
            model_label,
            elapsed_secs,
            input_bytes,
        } => {
            let mut body = serde_json::json!({
                "model": model_label,
                "processing_time": elapsed_secs,
                "file_size": input_bytes,
            });
            match transcript {
                TranscriptRef::Inline(text) => {
                    body["transcription"] = serde_json::Value::String(text.clone());
                }
                TranscriptRef::Stored { file_name } => {
                    body["transcription_url"] =
                        serde_json::Value::String(format!("/transcriptions/{}", file_name));
                }
            }
            body
        }
        JobOutcome::Failure { message } => serde_json::Value::String(message.clone()),
    }
}

#[tracing::instrument(skip(state))]
pub async fn transcription_status_handler<F, R>(
    State(state): State<AppState<F, R>>,
    Path(task_id): Path<String>,
) -> impl IntoResponse
where
    F: ArtifactFetcher + 'static,
    R: EngineRunner + 'static,
{
    let uuid = match Uuid::parse_str(&task_id) {
        Ok(u) => u,
        Err(_) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: format!("Invalid task ID: {}", task_id),
                }),
            )
                .into_response();
        }
    };

    match state.job_store.get(JobId::from_uuid(uuid)).await {
        Ok(Some(job)) => (
            StatusCode::OK,
            Json(JobStatusResponse {
                status: job.status.as_str().to_string(),
                progress: job.progress,
                result: job.result.as_ref().map(outcome_json),
            }),
        )
            .into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("Unknown task: {}", task_id),
            }),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to fetch job status");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: format!("Failed to fetch task: {}", e),
                }),
            )
                .into_response()
        }
    }
}
