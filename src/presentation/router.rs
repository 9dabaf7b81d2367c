use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::application::ports::{ArtifactFetcher, EngineRunner};
use crate::infrastructure::observability::request_id_middleware;
use crate::presentation::handlers::{
    health_handler, models_handler, transcribe_async_handler, transcribe_file_handler,
    transcribe_handler, transcription_file_handler, transcription_status_handler,
};
use crate::presentation::state::AppState;

pub fn create_router<F, R>(state: AppState<F, R>) -> Router
where
    F: ArtifactFetcher + 'static,
    R: EngineRunner + 'static,
{
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    // Uploads may run up to the download cap; leave room for multipart
    // framing on top of the audio payload.
    let body_limit = state.settings.download.max_bytes as usize + 64 * 1024;

    Router::new()
        .route("/health", get(health_handler::<F, R>))
        .route("/models", get(models_handler::<F, R>))
        .route("/transcribe", post(transcribe_handler::<F, R>))
        .route("/transcribe/file", post(transcribe_file_handler::<F, R>))
        .route("/transcribe-async", post(transcribe_async_handler::<F, R>))
        .route(
            "/transcription-status/{task_id}",
            get(transcription_status_handler::<F, R>),
        )
        .route(
            "/transcriptions/{file_name}",
            get(transcription_file_handler::<F, R>),
        )
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(trace_layer)
        .layer(cors)
        .with_state(state)
}
