use async_trait::async_trait;

use crate::domain::{JobId, OutputFormat};

/// Durable store for finished transcripts: the only state the service keeps
/// across restarts. Files are named `{audioBase}__{jobId}.{format}`.
#[async_trait]
pub trait TranscriptStore: Send + Sync {
    /// Write the transcript and return the file name it is retrievable under.
    async fn persist(
        &self,
        base_name: &str,
        job_id: JobId,
        format: OutputFormat,
        text: &str,
    ) -> Result<String, TranscriptStoreError>;

    /// Read a stored transcript by file name. Names that escape the store
    /// directory are rejected.
    async fn open(&self, file_name: &str) -> Result<String, TranscriptStoreError>;

    /// Delete transcripts older than the retention window; returns how many
    /// were removed.
    async fn sweep_expired(&self) -> Result<usize, TranscriptStoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum TranscriptStoreError {
    #[error("invalid transcript name: {0}")]
    InvalidName(String),
    #[error("transcript not found: {0}")]
    NotFound(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
