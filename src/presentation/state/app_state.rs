use std::sync::Arc;

use crate::application::ports::{ArtifactFetcher, EngineRunner, JobStore, TranscriptStore};
use crate::application::services::TranscriptionOrchestrator;
use crate::presentation::config::Settings;

pub struct AppState<F, R>
where
    F: ArtifactFetcher,
    R: EngineRunner,
{
    pub orchestrator: Arc<TranscriptionOrchestrator<F, R>>,
    pub job_store: Arc<dyn JobStore>,
    pub transcripts: Arc<dyn TranscriptStore>,
    pub settings: Settings,
}

impl<F, R> Clone for AppState<F, R>
where
    F: ArtifactFetcher,
    R: EngineRunner,
{
    fn clone(&self) -> Self {
        Self {
            orchestrator: Arc::clone(&self.orchestrator),
            job_store: Arc::clone(&self.job_store),
            transcripts: Arc::clone(&self.transcripts),
            settings: self.settings.clone(),
        }
    }
}
