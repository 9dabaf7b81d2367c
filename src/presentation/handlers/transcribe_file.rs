use axum::Json;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::application::ports::{ArtifactFetcher, EngineRunner};
use crate::application::services::JobSource;
use crate::presentation::handlers::error::{ErrorResponse, orchestrator_error_response};
use crate::presentation::handlers::transcribe::{TranscriptionResponse, build_params};
use crate::presentation::state::AppState;

#[derive(Default)]
struct UploadForm {
    audio: Option<(String, Vec<u8>)>,
    language: Option<String>,
    model: Option<String>,
    output_format: Option<String>,
    word_thold: Option<f32>,
    no_speech_thold: Option<f32>,
    prompt: Option<String>,
}

fn bad_request(message: String) -> axum::response::Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse { error: message }),
    )
        .into_response()
}

/// Synchronous transcription of an uploaded audio file (multipart field
/// `audio_file`, remaining fields as form text).
#[tracing::instrument(skip(state, multipart))]
pub async fn transcribe_file_handler<F, R>(
    State(state): State<AppState<F, R>>,
    mut multipart: Multipart,
) -> impl IntoResponse
where
    F: ArtifactFetcher + 'static,
    R: EngineRunner + 'static,
{
    let mut form = UploadForm::default();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(f)) => f,
            Ok(None) => break,
            Err(e) => {
                tracing::error!(error = %e, "Failed to read multipart");
                return bad_request(format!("Failed to read multipart: {}", e));
            }
        };

        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "audio_file" => {
                let filename = field.file_name().unwrap_or_default().to_string();
                match field.bytes().await {
                    Ok(bytes) => form.audio = Some((filename, bytes.to_vec())),
                    Err(e) => return bad_request(format!("Failed to read file: {}", e)),
                }
            }
            "language" => form.language = field.text().await.ok(),
            "model" => form.model = field.text().await.ok(),
            "output_format" => form.output_format = field.text().await.ok(),
            "word_thold" => {
                form.word_thold = field.text().await.ok().and_then(|v| v.parse().ok());
            }
            "no_speech_thold" => {
                form.no_speech_thold = field.text().await.ok().and_then(|v| v.parse().ok());
            }
            "prompt" => form.prompt = field.text().await.ok(),
            other => {
                tracing::debug!(field = other, "Ignoring unknown multipart field");
            }
        }
    }

    let (filename, data) = match form.audio {
        Some((name, data)) if !data.is_empty() => (name, data),
        Some(_) | None => return bad_request("no audio file provided".to_string()),
    };
    if filename.trim().is_empty() {
        return bad_request("no audio file selected".to_string());
    }
    if data.len() as u64 > state.settings.download.max_bytes {
        return bad_request(format!(
            "file exceeds the {} byte limit",
            state.settings.download.max_bytes
        ));
    }

    let params = match build_params(
        &state.settings,
        form.language,
        form.model,
        form.output_format,
        form.word_thold,
        form.no_speech_thold,
        form.prompt,
    ) {
        Ok(p) => p,
        Err(e) => return bad_request(e),
    };

    // Stage the upload in scratch storage; the worker owns deletion.
    let scratch_dir = &state.settings.download.scratch_dir;
    if let Err(e) = tokio::fs::create_dir_all(scratch_dir).await {
        tracing::error!(error = %e, "Failed to create scratch directory");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: format!("internal error: {}", e),
            }),
        )
            .into_response();
    }
    let bytes = data.len() as u64;
    let scratch_path = scratch_dir.join(format!("{}.mp3", uuid::Uuid::new_v4()));
    if let Err(e) = tokio::fs::write(&scratch_path, &data).await {
        tracing::error!(error = %e, "Failed to stage uploaded file");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: format!("internal error: {}", e),
            }),
        )
            .into_response();
    }

    tracing::info!(filename = %filename, bytes, "Starting file transcription");

    let source = JobSource::LocalFile {
        path: scratch_path.clone(),
        original_name: filename.clone(),
        bytes,
    };

    match state.orchestrator.run_blocking(source, params).await {
        Ok(finished) => (
            StatusCode::OK,
            Json(TranscriptionResponse::from_finished(
                finished,
                Some(filename),
            )),
        )
            .into_response(),
        Err(e) => {
            // Rejected before the worker took ownership of the scratch file.
            if let Err(rm) = tokio::fs::remove_file(&scratch_path).await {
                if rm.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!(error = %rm, "Failed to remove staged upload");
                }
            }
            tracing::error!(error = %e, "File transcription failed");
            orchestrator_error_response(e)
        }
    }
}
