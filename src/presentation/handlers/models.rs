use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Serialize;

use crate::application::ports::{ArtifactFetcher, EngineRunner};
use crate::presentation::state::AppState;

#[derive(Serialize)]
pub struct ModelsResponse {
    pub models: Vec<String>,
    pub current_model: String,
}

/// List the `.bin` model files available to the engine.
#[tracing::instrument(skip(state))]
pub async fn models_handler<F, R>(State(state): State<AppState<F, R>>) -> impl IntoResponse
where
    F: ArtifactFetcher + 'static,
    R: EngineRunner + 'static,
{
    let models_dir = state.settings.engine.install_dir.join("models");
    let mut models = Vec::new();

    match tokio::fs::read_dir(&models_dir).await {
        Ok(mut entries) => {
            while let Ok(Some(entry)) = entries.next_entry().await {
                let name = entry.file_name().to_string_lossy().to_string();
                if name.ends_with(".bin") {
                    models.push(name);
                }
            }
            models.sort();
        }
        Err(e) => {
            tracing::warn!(dir = %models_dir.display(), error = %e, "Failed to list models");
        }
    }

    (
        StatusCode::OK,
        Json(ModelsResponse {
            models,
            current_model: format!("ggml-{}.bin", state.settings.engine.default_model),
        }),
    )
}
