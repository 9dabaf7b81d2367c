mod artifact_fetcher;
mod engine_runner;
mod job_store;
mod transcript_store;

use std::sync::Arc;

pub use artifact_fetcher::{ArtifactFetcher, DownloadError, FetchedArtifact};
pub use engine_runner::{EngineError, EngineInvocation, EngineOutput, EngineRunner};
pub use job_store::{JobStore, JobStoreError};
pub use transcript_store::{TranscriptStore, TranscriptStoreError};

/// Callback carrying progress estimates (0-100) out of a long-running phase.
pub type ProgressFn = Arc<dyn Fn(u8) + Send + Sync>;
