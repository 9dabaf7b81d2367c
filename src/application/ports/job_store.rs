use async_trait::async_trait;

use crate::domain::{Job, JobId, JobOutcome, JobStatus};

/// Single source of truth for status polling. One worker writes a given job;
/// any number of pollers read it concurrently.
#[async_trait]
pub trait JobStore: Send + Sync {
    async fn create(&self, job: Job) -> Result<(), JobStoreError>;

    async fn get(&self, id: JobId) -> Result<Option<Job>, JobStoreError>;

    /// Advance the job's status. Backward or post-terminal transitions are
    /// rejected.
    async fn set_status(&self, id: JobId, status: JobStatus) -> Result<(), JobStoreError>;

    /// Update the advisory progress value. Values below the current one are
    /// ignored so pollers always observe a non-decreasing sequence.
    async fn set_progress(&self, id: JobId, progress: u8) -> Result<(), JobStoreError>;

    /// Terminal success: sets `completed`, progress 100 and the outcome.
    async fn complete(&self, id: JobId, outcome: JobOutcome) -> Result<(), JobStoreError>;

    /// Terminal failure: sets `error` and the human-readable cause.
    async fn fail(&self, id: JobId, message: String) -> Result<(), JobStoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum JobStoreError {
    #[error("job not found: {0}")]
    NotFound(JobId),
    #[error("illegal status transition: {from} -> {to}")]
    IllegalTransition {
        from: crate::domain::JobStatus,
        to: crate::domain::JobStatus,
    },
}
