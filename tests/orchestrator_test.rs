use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use murmure::application::ports::{
    ArtifactFetcher, DownloadError, EngineError, EngineInvocation, EngineOutput, EngineRunner,
    FetchedArtifact, JobStore, ProgressFn,
};
use murmure::application::services::{
    ConcurrencyGate, EngineCommand, JobSource, OrchestratorConfig, OrchestratorError,
    TranscriptionOrchestrator,
};
use murmure::domain::{JobStatus, TranscriptRef, TranscriptionParams};
use murmure::infrastructure::persistence::InMemoryJobStore;
use murmure::infrastructure::storage::FsTranscriptStore;

enum FetchBehavior {
    Succeed,
    TooLarge,
}

struct ScriptedFetcher {
    scratch_dir: PathBuf,
    behavior: FetchBehavior,
}

#[async_trait::async_trait]
impl ArtifactFetcher for ScriptedFetcher {
    async fn fetch(
        &self,
        _url: &str,
        max_bytes: u64,
        _progress: ProgressFn,
    ) -> Result<FetchedArtifact, DownloadError> {
        match self.behavior {
            FetchBehavior::Succeed => {
                let path = self.scratch_dir.join(format!("{}.mp3", uuid::Uuid::new_v4()));
                tokio::fs::write(&path, b"fake audio").await?;
                Ok(FetchedArtifact { path, bytes: 10 })
            }
            FetchBehavior::TooLarge => Err(DownloadError::TooLarge { limit: max_bytes }),
        }
    }
}

enum RunBehavior {
    StdoutOnly(String),
    WriteOutputFile(String),
    Fail { code: i32, stderr: String },
    Timeout,
}

struct ScriptedRunner {
    behavior: RunBehavior,
}

#[async_trait::async_trait]
impl EngineRunner for ScriptedRunner {
    async fn run(
        &self,
        invocation: EngineInvocation,
        _progress: ProgressFn,
    ) -> Result<EngineOutput, EngineError> {
        match &self.behavior {
            RunBehavior::StdoutOnly(text) => Ok(EngineOutput {
                stdout: text.clone(),
                stderr: String::new(),
                elapsed: Duration::from_millis(5),
            }),
            RunBehavior::WriteOutputFile(text) => {
                tokio::fs::write(&invocation.expected_output, text)
                    .await
                    .map_err(EngineError::Spawn)?;
                Ok(EngineOutput {
                    stdout: "noise the resolver must ignore".to_string(),
                    stderr: String::new(),
                    elapsed: Duration::from_millis(5),
                })
            }
            RunBehavior::Fail { code, stderr } => Err(EngineError::NonZeroExit {
                code: *code,
                stderr: stderr.clone(),
            }),
            RunBehavior::Timeout => Err(EngineError::Timeout { elapsed_secs: 86400 }),
        }
    }
}

struct Harness {
    orchestrator: Arc<TranscriptionOrchestrator<ScriptedFetcher, ScriptedRunner>>,
    job_store: Arc<InMemoryJobStore>,
    scratch: tempfile::TempDir,
    _transcripts: tempfile::TempDir,
}

fn build_harness(fetch: FetchBehavior, run: RunBehavior) -> Harness {
    let scratch = tempfile::tempdir().unwrap();
    let transcripts = tempfile::tempdir().unwrap();

    let job_store = Arc::new(InMemoryJobStore::new(Duration::from_secs(3600)));
    let transcript_store = Arc::new(
        FsTranscriptStore::new(transcripts.path().to_path_buf(), Duration::from_secs(3600))
            .unwrap(),
    );

    let orchestrator = Arc::new(TranscriptionOrchestrator::new(
        Arc::new(ScriptedFetcher {
            scratch_dir: scratch.path().to_path_buf(),
            behavior: fetch,
        }),
        Arc::new(ScriptedRunner { behavior: run }),
        job_store.clone(),
        transcript_store,
        ConcurrencyGate::new(1),
        EngineCommand::new(scratch.path().to_path_buf(), "base".to_string()),
        OrchestratorConfig {
            max_download_bytes: 100,
            inline_limit: 2000,
        },
    ));

    Harness {
        orchestrator,
        job_store,
        scratch,
        _transcripts: transcripts,
    }
}

fn default_params() -> TranscriptionParams {
    TranscriptionParams::new("fr".to_string(), "base".to_string())
}

fn remote_source() -> JobSource {
    JobSource::RemoteUrl("https://example.com/episode.mp3".to_string())
}

#[tokio::test]
async fn successful_run_records_completed_job_and_cleans_scratch() {
    let harness = build_harness(
        FetchBehavior::Succeed,
        RunBehavior::StdoutOnly("Bonjour.".to_string()),
    );

    let finished = harness
        .orchestrator
        .run_blocking(remote_source(), default_params())
        .await
        .unwrap();

    assert!(matches!(finished.transcript, TranscriptRef::Inline(ref t) if t == "Bonjour."));
    assert_eq!(finished.input_bytes, 10);

    let job = harness
        .job_store
        .get(finished.job_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.progress, 100);

    // The downloaded audio must not outlive the job.
    let leftovers: Vec<_> = std::fs::read_dir(harness.scratch.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().ends_with(".mp3"))
        .collect();
    assert!(leftovers.is_empty());
}

#[tokio::test]
async fn output_file_takes_precedence_over_stdout() {
    let harness = build_harness(
        FetchBehavior::Succeed,
        RunBehavior::WriteOutputFile("Texte du fichier.".to_string()),
    );

    let finished = harness
        .orchestrator
        .run_blocking(remote_source(), default_params())
        .await
        .unwrap();

    assert!(matches!(finished.transcript, TranscriptRef::Inline(ref t) if t == "Texte du fichier."));
}

#[tokio::test]
async fn oversized_download_fails_the_job_with_its_reason() {
    let harness = build_harness(
        FetchBehavior::TooLarge,
        RunBehavior::StdoutOnly(String::new()),
    );

    let err = harness
        .orchestrator
        .run_blocking(remote_source(), default_params())
        .await
        .expect_err("oversized download must fail");
    assert!(matches!(err, OrchestratorError::Download(_)));
}

#[tokio::test]
async fn engine_failure_is_recorded_on_the_job() {
    let harness = build_harness(
        FetchBehavior::Succeed,
        RunBehavior::Fail {
            code: 3,
            stderr: "model load failed".to_string(),
        },
    );

    let job_id = harness
        .orchestrator
        .submit(remote_source(), default_params())
        .await
        .unwrap();

    let mut job = None;
    for _ in 0..50 {
        let current = harness.job_store.get(job_id).await.unwrap().unwrap();
        if current.status.is_terminal() {
            job = Some(current);
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    let job = job.expect("job must reach a terminal state");
    assert_eq!(job.status, JobStatus::Error);
    let message = match job.result {
        Some(murmure::domain::JobOutcome::Failure { message }) => message,
        other => panic!("expected a failure outcome, got {:?}", other),
    };
    assert!(message.contains("model load failed"));
}

#[tokio::test]
async fn gate_is_released_after_a_failed_job() {
    let harness = build_harness(
        FetchBehavior::Succeed,
        RunBehavior::Fail {
            code: 1,
            stderr: "boom".to_string(),
        },
    );

    let first = harness
        .orchestrator
        .run_blocking(remote_source(), default_params())
        .await;
    assert!(first.is_err());

    // A busy gate would return Busy here instead of re-running the engine.
    let second = harness
        .orchestrator
        .run_blocking(remote_source(), default_params())
        .await
        .expect_err("engine still fails, but the gate must admit the job");
    assert!(matches!(second, OrchestratorError::Engine(_)));
}

#[tokio::test]
async fn hard_timeout_surfaces_as_engine_timeout() {
    let harness = build_harness(FetchBehavior::Succeed, RunBehavior::Timeout);

    let err = harness
        .orchestrator
        .run_blocking(remote_source(), default_params())
        .await
        .expect_err("timeout must fail the job");
    assert!(matches!(
        err,
        OrchestratorError::Engine(EngineError::Timeout { .. })
    ));
}
