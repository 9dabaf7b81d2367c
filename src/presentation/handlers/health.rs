use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Serialize;

use crate::application::ports::{ArtifactFetcher, EngineRunner};
use crate::presentation::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub model: String,
    pub version: String,
}

pub async fn health_handler<F, R>(State(state): State<AppState<F, R>>) -> impl IntoResponse
where
    F: ArtifactFetcher + 'static,
    R: EngineRunner + 'static,
{
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            model: format!(
                "whisper-{}-{}",
                state.settings.engine.default_model, state.settings.engine.default_language
            ),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }),
    )
}
