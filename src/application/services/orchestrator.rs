use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc;
use tracing::Instrument;
use url::Url;

use crate::application::ports::{
    ArtifactFetcher, DownloadError, EngineError, EngineRunner, JobStore, ProgressFn,
    TranscriptStore,
};
use crate::application::services::resolver::{OutputResolutionError, resolve_transcript};
use crate::application::services::{ConcurrencyGate, EngineCommand};
use crate::domain::{Job, JobId, JobOutcome, JobStatus, TranscriptRef, TranscriptionParams};

// Progress milestones between the sub-ranges owned by each phase.
const PROGRESS_ADMITTED: u8 = 5;
const PROGRESS_DOWNLOADED: u8 = 20;
const PROGRESS_PREPARED: u8 = 22;
const PROGRESS_TRANSCRIBE_START: u8 = 25;
const PROGRESS_FINALIZING: u8 = 95;

/// Where the audio comes from: a remote URL to download, or an already
/// staged upload.
#[derive(Debug)]
pub enum JobSource {
    RemoteUrl(String),
    LocalFile {
        path: PathBuf,
        original_name: String,
        bytes: u64,
    },
}

/// Outcome handed back to the synchronous caller.
#[derive(Debug)]
pub struct FinishedTranscription {
    pub job_id: JobId,
    pub transcript: TranscriptRef,
    pub model_label: String,
    pub elapsed_secs: f64,
    pub input_bytes: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    #[error("transcription already in progress, retry in a few minutes")]
    Busy,
    #[error("{0}")]
    Validation(String),
    #[error("download failed: {0}")]
    Download(#[from] DownloadError),
    #[error("engine failed: {0}")]
    Engine(#[from] EngineError),
    #[error("output file not found and stdout empty")]
    OutputNotFound,
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<OutputResolutionError> for OrchestratorError {
    fn from(_: OutputResolutionError) -> Self {
        OrchestratorError::OutputNotFound
    }
}

#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub max_download_bytes: u64,
    /// Transcripts longer than this are persisted and referenced by URL
    /// instead of returned inline.
    pub inline_limit: usize,
}

/// Composes fetcher, engine runner, job store and transcript store into the
/// full job lifecycle: admission, download, supervision, resolution.
pub struct TranscriptionOrchestrator<F, R> {
    fetcher: Arc<F>,
    runner: Arc<R>,
    store: Arc<dyn JobStore>,
    transcripts: Arc<dyn TranscriptStore>,
    gate: ConcurrencyGate,
    engine: EngineCommand,
    config: OrchestratorConfig,
}

impl<F, R> TranscriptionOrchestrator<F, R>
where
    F: ArtifactFetcher + 'static,
    R: EngineRunner + 'static,
{
    pub fn new(
        fetcher: Arc<F>,
        runner: Arc<R>,
        store: Arc<dyn JobStore>,
        transcripts: Arc<dyn TranscriptStore>,
        gate: ConcurrencyGate,
        engine: EngineCommand,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            fetcher,
            runner,
            store,
            transcripts,
            gate,
            engine,
            config,
        }
    }

    pub fn job_store(&self) -> Arc<dyn JobStore> {
        Arc::clone(&self.store)
    }

    pub fn engine(&self) -> &EngineCommand {
        &self.engine
    }

    /// Admit a job and hand it to a background worker. Returns immediately
    /// with the job id; the caller polls for status.
    pub async fn submit(
        self: &Arc<Self>,
        source: JobSource,
        params: TranscriptionParams,
    ) -> Result<JobId, OrchestratorError> {
        validate_source(&source)?;
        let permit = self.gate.try_admit().ok_or(OrchestratorError::Busy)?;

        let job = Job::new();
        let job_id = job.id;
        self.store
            .create(job)
            .await
            .map_err(|e| OrchestratorError::Internal(e.to_string()))?;

        let orchestrator = Arc::clone(self);
        let span = tracing::info_span!("transcription_job", job_id = %job_id);
        tokio::spawn(
            async move {
                // The permit lives for the whole worker; dropping it on any
                // exit path frees the gate exactly once.
                let _permit = permit;

                match orchestrator.execute(job_id, source, params).await {
                    Ok(finished) => {
                        tracing::info!(
                            elapsed_secs = finished.elapsed_secs,
                            input_bytes = finished.input_bytes,
                            "Transcription completed"
                        );
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Transcription job failed");
                    }
                }
            }
            .instrument(span),
        );

        Ok(job_id)
    }

    /// Synchronous variant: the caller blocks for the whole job duration.
    pub async fn run_blocking(
        &self,
        source: JobSource,
        params: TranscriptionParams,
    ) -> Result<FinishedTranscription, OrchestratorError> {
        validate_source(&source)?;
        let _permit = self.gate.try_admit().ok_or(OrchestratorError::Busy)?;

        let job = Job::new();
        let job_id = job.id;
        self.store
            .create(job)
            .await
            .map_err(|e| OrchestratorError::Internal(e.to_string()))?;

        self.execute(job_id, source, params).await
    }

    /// The worker pipeline. Records every state transition and the terminal
    /// outcome in the job store, which pollers read concurrently.
    async fn execute(
        &self,
        job_id: JobId,
        source: JobSource,
        params: TranscriptionParams,
    ) -> Result<FinishedTranscription, OrchestratorError> {
        let started = Instant::now();
        let result = self.run_pipeline(job_id, source, params, started).await;

        match &result {
            Ok(finished) => {
                let outcome = JobOutcome::Success {
                    transcript: finished.transcript.clone(),
                    model_label: finished.model_label.clone(),
                    elapsed_secs: finished.elapsed_secs,
                    input_bytes: finished.input_bytes,
                };
                if let Err(e) = self.store.complete(job_id, outcome).await {
                    tracing::error!(error = %e, "Failed to record job completion");
                }
            }
            Err(e) => {
                if let Err(store_err) = self.store.fail(job_id, e.to_string()).await {
                    tracing::error!(error = %store_err, "Failed to record job failure");
                }
            }
        }

        // Retention sweep piggybacks on job completion, as the original
        // service swept after every transcription.
        match self.transcripts.sweep_expired().await {
            Ok(0) => {}
            Ok(removed) => tracing::info!(removed, "Swept expired transcripts"),
            Err(e) => tracing::warn!(error = %e, "Transcript retention sweep failed"),
        }

        result
    }

    async fn run_pipeline(
        &self,
        job_id: JobId,
        source: JobSource,
        params: TranscriptionParams,
        started: Instant,
    ) -> Result<FinishedTranscription, OrchestratorError> {
        self.transition(job_id, JobStatus::Processing).await;
        self.progress(job_id, PROGRESS_ADMITTED).await;

        // Forward sync progress callbacks from the fetcher and supervisor
        // into the async store without blocking either.
        let (progress_tx, mut progress_rx) = mpsc::unbounded_channel::<u8>();
        let forwarder = {
            let store = Arc::clone(&self.store);
            tokio::spawn(async move {
                while let Some(value) = progress_rx.recv().await {
                    if let Err(e) = store.set_progress(job_id, value).await {
                        tracing::debug!(error = %e, "Dropped progress update");
                    }
                }
            })
        };
        let progress: ProgressFn = Arc::new(move |value| {
            let _ = progress_tx.send(value);
        });

        let pipeline = self
            .run_phases(job_id, source, params, started, progress)
            .await;

        // All ProgressFn clones are gone once the phases return, so the
        // forwarder drains and exits on its own.
        let _ = forwarder.await;
        pipeline
    }

    async fn run_phases(
        &self,
        job_id: JobId,
        source: JobSource,
        params: TranscriptionParams,
        started: Instant,
        progress: ProgressFn,
    ) -> Result<FinishedTranscription, OrchestratorError> {
        self.transition(job_id, JobStatus::Downloading).await;

        let base_name = source_base_name(&source);
        let (artifact_path, input_bytes, scratch) = match source {
            JobSource::RemoteUrl(url) => {
                let artifact = self
                    .fetcher
                    .fetch(&url, self.config.max_download_bytes, Arc::clone(&progress))
                    .await?;
                tracing::info!(
                    bytes = artifact.bytes,
                    path = %artifact.path.display(),
                    "Audio downloaded"
                );
                let guard = ScratchGuard::new(artifact.path.clone());
                (artifact.path, artifact.bytes, Some(guard))
            }
            JobSource::LocalFile { path, bytes, .. } => {
                let guard = ScratchGuard::new(path.clone());
                (path, bytes, Some(guard))
            }
        };
        self.progress(job_id, PROGRESS_DOWNLOADED).await;

        self.transition(job_id, JobStatus::Preparing).await;
        let invocation = self.engine.invocation(&artifact_path, &params);
        // The engine may leave its output file behind on a failed run.
        let output_guard = ScratchGuard::new(invocation.expected_output.clone());
        tracing::info!(command = %invocation.rendered(), "Engine invocation prepared");
        self.progress(job_id, PROGRESS_PREPARED).await;

        self.transition(job_id, JobStatus::Transcribing).await;
        self.progress(job_id, PROGRESS_TRANSCRIBE_START).await;
        let output = self
            .runner
            .run(invocation.clone(), Arc::clone(&progress))
            .await?;

        self.transition(job_id, JobStatus::Finalizing).await;
        self.progress(job_id, PROGRESS_FINALIZING).await;

        let text = resolve_transcript(&invocation.expected_output, &output.stdout).await?;
        // resolve_transcript consumed the file (or it never existed); the
        // guard has nothing left to do.
        output_guard.disarm();

        let transcript = if text.len() > self.config.inline_limit {
            let file_name = self
                .transcripts
                .persist(&base_name, job_id, params.output_format, &text)
                .await
                .map_err(|e| OrchestratorError::Internal(e.to_string()))?;
            TranscriptRef::Stored { file_name }
        } else {
            TranscriptRef::Inline(text)
        };

        drop(scratch);

        Ok(FinishedTranscription {
            job_id,
            transcript,
            model_label: params.model_label(),
            elapsed_secs: started.elapsed().as_secs_f64(),
            input_bytes,
        })
    }

    async fn transition(&self, job_id: JobId, status: JobStatus) {
        tracing::debug!(status = %status, "Job status transition");
        if let Err(e) = self.store.set_status(job_id, status).await {
            tracing::error!(error = %e, status = %status, "Failed to record status transition");
        }
    }

    async fn progress(&self, job_id: JobId, value: u8) {
        if let Err(e) = self.store.set_progress(job_id, value).await {
            tracing::debug!(error = %e, "Failed to record progress");
        }
    }
}

fn validate_source(source: &JobSource) -> Result<(), OrchestratorError> {
    match source {
        JobSource::RemoteUrl(raw) => {
            let url = Url::parse(raw)
                .map_err(|e| OrchestratorError::Validation(format!("invalid audio_url: {}", e)))?;
            if url.scheme() != "http" && url.scheme() != "https" {
                return Err(OrchestratorError::Validation(format!(
                    "unsupported url scheme: {}",
                    url.scheme()
                )));
            }
            Ok(())
        }
        JobSource::LocalFile { original_name, .. } => {
            if original_name.trim().is_empty() {
                return Err(OrchestratorError::Validation(
                    "no audio file selected".to_string(),
                ));
            }
            Ok(())
        }
    }
}

/// Base name the stored transcript file is derived from.
fn source_base_name(source: &JobSource) -> String {
    let raw = match source {
        JobSource::RemoteUrl(url) => Url::parse(url)
            .ok()
            .and_then(|u| {
                u.path_segments()
                    .and_then(|mut segments| segments.next_back().map(String::from))
            })
            .unwrap_or_default(),
        JobSource::LocalFile { original_name, .. } => original_name.clone(),
    };

    let stem = raw.rsplit_once('.').map(|(s, _)| s.to_string()).unwrap_or(raw);
    let sanitized: String = stem
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if sanitized.is_empty() {
        "audio".to_string()
    } else {
        sanitized
    }
}

/// Removes a scratch file when dropped, so every exit path of the worker
/// cleans up after itself.
struct ScratchGuard {
    path: Option<PathBuf>,
}

impl ScratchGuard {
    fn new(path: PathBuf) -> Self {
        Self { path: Some(path) }
    }

    fn disarm(mut self) {
        self.path = None;
    }
}

impl Drop for ScratchGuard {
    fn drop(&mut self) {
        if let Some(path) = self.path.take() {
            match std::fs::remove_file(&path) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Failed to remove scratch file");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_name_from_url_strips_extension_and_query() {
        let source = JobSource::RemoteUrl(
            "https://cdn.example.com/episodes/ep-042.mp3?token=abc".to_string(),
        );
        assert_eq!(source_base_name(&source), "ep-042");
    }

    #[test]
    fn base_name_sanitizes_upload_names() {
        let source = JobSource::LocalFile {
            path: PathBuf::from("/tmp/x"),
            original_name: "mon épisode (final).mp3".to_string(),
            bytes: 10,
        };
        assert_eq!(source_base_name(&source), "mon__pisode__final_");
    }

    #[test]
    fn base_name_defaults_when_empty() {
        let source = JobSource::RemoteUrl("https://example.com/".to_string());
        assert_eq!(source_base_name(&source), "audio");
    }

    #[test]
    fn rejects_non_http_schemes() {
        let err = validate_source(&JobSource::RemoteUrl("ftp://host/a.mp3".to_string()))
            .expect_err("ftp must be rejected");
        assert!(matches!(err, OrchestratorError::Validation(_)));
    }

    #[test]
    fn rejects_unparseable_urls() {
        let err = validate_source(&JobSource::RemoteUrl("not a url".to_string()))
            .expect_err("garbage must be rejected");
        assert!(matches!(err, OrchestratorError::Validation(_)));
    }

    #[test]
    fn scratch_guard_removes_file_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scratch.mp3");
        std::fs::write(&path, b"data").unwrap();
        drop(ScratchGuard::new(path.clone()));
        assert!(!path.exists());
    }

    #[test]
    fn disarmed_guard_leaves_file_alone() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keep.txt");
        std::fs::write(&path, b"data").unwrap();
        ScratchGuard::new(path.clone()).disarm();
        assert!(path.exists());
    }
}
