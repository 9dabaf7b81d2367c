use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::{Deserialize, Serialize};

use crate::application::ports::{ArtifactFetcher, EngineRunner};
use crate::application::services::{FinishedTranscription, JobSource};
use crate::domain::{TranscriptRef, TranscriptionParams};
use crate::presentation::config::Settings;
use crate::presentation::handlers::error::{ErrorResponse, orchestrator_error_response};
use crate::presentation::state::AppState;

#[derive(Debug, Deserialize)]
pub struct TranscribeRequest {
    pub audio_url: Option<String>,
    pub language: Option<String>,
    pub model: Option<String>,
    pub output_format: Option<String>,
    pub word_thold: Option<f32>,
    pub no_speech_thold: Option<f32>,
    pub prompt: Option<String>,
}

#[derive(Serialize)]
pub struct TranscriptionResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcription: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcription_url: Option<String>,
    pub model: String,
    pub processing_time: f64,
    pub file_size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
}

impl TranscriptionResponse {
    pub(super) fn from_finished(finished: FinishedTranscription, filename: Option<String>) -> Self {
        let (transcription, transcription_url) = match finished.transcript {
            TranscriptRef::Inline(text) => (Some(text), None),
            TranscriptRef::Stored { file_name } => {
                (None, Some(format!("/transcriptions/{}", file_name)))
            }
        };
        Self {
            success: true,
            transcription,
            transcription_url,
            model: finished.model_label,
            processing_time: finished.elapsed_secs,
            file_size: finished.input_bytes,
            filename,
        }
    }
}

pub(super) fn build_params(
    settings: &Settings,
    language: Option<String>,
    model: Option<String>,
    output_format: Option<String>,
    word_thold: Option<f32>,
    no_speech_thold: Option<f32>,
    prompt: Option<String>,
) -> Result<TranscriptionParams, String> {
    let mut params = TranscriptionParams::new(
        language.unwrap_or_else(|| settings.engine.default_language.clone()),
        model.unwrap_or_else(|| settings.engine.default_model.clone()),
    );
    if let Some(format) = output_format {
        params.output_format = format.parse()?;
    }
    params.word_thold = word_thold;
    params.no_speech_thold = no_speech_thold;
    params.prompt = prompt;
    Ok(params)
}

/// Synchronous transcription of a remote audio URL: the connection blocks
/// for the whole job duration.
#[tracing::instrument(skip(state, request))]
pub async fn transcribe_handler<F, R>(
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

    tracing::info!(audio_url = %audio_url, model = %params.model, "Starting synchronous transcription");

    match state
        .orchestrator
        .run_blocking(JobSource::RemoteUrl(audio_url), params)
        .await
    {
        Ok(finished) => (
            StatusCode::OK,
            Json(TranscriptionResponse::from_finished(finished, None)),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Synchronous transcription failed");
            orchestrator_error_response(e)
        }
    }
}
