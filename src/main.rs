use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;

use murmure::application::services::{
    ConcurrencyGate, EngineCommand, OrchestratorConfig, TranscriptionOrchestrator,
};
use murmure::infrastructure::download::HttpArtifactFetcher;
use murmure::infrastructure::engine::{ProcessSupervisor, SupervisorConfig};
use murmure::infrastructure::observability::{TracingConfig, init_tracing};
use murmure::infrastructure::persistence::InMemoryJobStore;
use murmure::infrastructure::storage::FsTranscriptStore;
use murmure::presentation::config::Settings;
use murmure::presentation::{AppState, create_router};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::from_env();

    init_tracing(
        TracingConfig {
            default_level: settings.logging.level.clone(),
            json_format: settings.logging.json,
            ..TracingConfig::default()
        },
        settings.server.port,
    );

    let model_path = settings.engine.default_model_path();
    if !model_path.exists() {
        tracing::warn!(
            model = %model_path.display(),
            "Default model file not found; jobs will fail until it is installed"
        );
    }

    let fetcher = Arc::new(HttpArtifactFetcher::new(
        settings.download.scratch_dir.clone(),
        Duration::from_secs(settings.download.request_timeout_secs),
    )?);

    let runner = Arc::new(ProcessSupervisor::new(SupervisorConfig {
        hard_timeout: settings.engine.hard_timeout(),
        activity_timeout: Duration::from_secs(settings.engine.activity_timeout_secs),
        heartbeat_interval: Duration::from_secs(settings.engine.heartbeat_secs),
        resource_sample_interval: Duration::from_secs(settings.engine.resource_sample_secs),
        kill_grace: Duration::from_secs(settings.engine.kill_grace_secs),
    }));

    let job_store = Arc::new(InMemoryJobStore::new(settings.jobs.retention()));
    let transcripts = Arc::new(FsTranscriptStore::new(
        settings.transcripts.output_dir.clone(),
        settings.transcripts.retention(),
    )?);

    let engine = EngineCommand::new(
        settings.engine.install_dir.clone(),
        settings.engine.default_model.clone(),
    );

    let orchestrator = Arc::new(TranscriptionOrchestrator::new(
        fetcher,
        runner,
        job_store.clone(),
        transcripts.clone(),
        ConcurrencyGate::new(1),
        engine,
        OrchestratorConfig {
            max_download_bytes: settings.download.max_bytes,
            inline_limit: settings.transcripts.inline_limit,
        },
    ));

    let state = AppState {
        orchestrator,
        job_store,
        transcripts,
        settings: settings.clone(),
    };

    let router = create_router(state);

    let addr: SocketAddr = format!("{}:{}", settings.server.host, settings.server.port).parse()?;
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
