use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::application::ports::{JobStore, JobStoreError};
use crate::domain::{Job, JobId, JobOutcome, JobStatus};

/// In-memory job map. A single worker writes each record while pollers read
/// concurrently. Terminal records older than the retention window are
/// evicted when new jobs are created, so long uptimes do not leak memory.
pub struct InMemoryJobStore {
    jobs: RwLock<HashMap<JobId, Job>>,
    retention: Duration,
}

impl InMemoryJobStore {
    pub fn new(retention: Duration) -> Self {
        Self {
            jobs: RwLock::new(HashMap::new()),
            retention,
        }
    }

    fn evict_expired(&self, jobs: &mut HashMap<JobId, Job>) {
        let cutoff = Utc::now()
            - chrono::Duration::from_std(self.retention).unwrap_or(chrono::Duration::hours(24));
        let before = jobs.len();
        jobs.retain(|_, job| !(job.status.is_terminal() && job.updated_at < cutoff));
        let evicted = before - jobs.len();
        if evicted > 0 {
            tracing::debug!(evicted, "Evicted expired job records");
        }
    }
}

#[async_trait]
impl JobStore for InMemoryJobStore {
    async fn create(&self, job: Job) -> Result<(), JobStoreError> {
        let mut jobs = self.jobs.write().await;
        self.evict_expired(&mut jobs);
        jobs.insert(job.id, job);
        Ok(())
    }

    async fn get(&self, id: JobId) -> Result<Option<Job>, JobStoreError> {
        Ok(self.jobs.read().await.get(&id).cloned())
    }

    async fn set_status(&self, id: JobId, status: JobStatus) -> Result<(), JobStoreError> {
        let mut jobs = self.jobs.write().await;
        let job = jobs.get_mut(&id).ok_or(JobStoreError::NotFound(id))?;
        if !job.status.can_transition_to(status) {
            return Err(JobStoreError::IllegalTransition {
                from: job.status,
                to: status,
            });
        }
        job.status = status;
        job.updated_at = Utc::now();
        Ok(())
    }

    async fn set_progress(&self, id: JobId, progress: u8) -> Result<(), JobStoreError> {
        let mut jobs = self.jobs.write().await;
        let job = jobs.get_mut(&id).ok_or(JobStoreError::NotFound(id))?;
        if job.status.is_terminal() {
            return Ok(());
        }
        // Clamp so pollers always observe a non-decreasing sequence.
        let clamped = progress.min(100);
        if clamped > job.progress {
            job.progress = clamped;
            job.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn complete(&self, id: JobId, outcome: JobOutcome) -> Result<(), JobStoreError> {
        let mut jobs = self.jobs.write().await;
        let job = jobs.get_mut(&id).ok_or(JobStoreError::NotFound(id))?;
        if !job.status.can_transition_to(JobStatus::Completed) {
            return Err(JobStoreError::IllegalTransition {
                from: job.status,
                to: JobStatus::Completed,
            });
        }
        job.status = JobStatus::Completed;
        job.progress = 100;
        job.result = Some(outcome);
        job.updated_at = Utc::now();
        Ok(())
    }

    async fn fail(&self, id: JobId, message: String) -> Result<(), JobStoreError> {
        let mut jobs = self.jobs.write().await;
        let job = jobs.get_mut(&id).ok_or(JobStoreError::NotFound(id))?;
        if job.status.is_terminal() {
            return Err(JobStoreError::IllegalTransition {
                from: job.status,
                to: JobStatus::Error,
            });
        }
        job.status = JobStatus::Error;
        job.result = Some(JobOutcome::Failure { message });
        job.updated_at = Utc::now();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> InMemoryJobStore {
        InMemoryJobStore::new(Duration::from_secs(24 * 3600))
    }

    #[tokio::test]
    async fn progress_is_clamped_non_decreasing() {
        let store = store();
        let job = Job::new();
        let id = job.id;
        store.create(job).await.unwrap();

        store.set_progress(id, 40).await.unwrap();
        store.set_progress(id, 20).await.unwrap();
        assert_eq!(store.get(id).await.unwrap().unwrap().progress, 40);

        store.set_progress(id, 55).await.unwrap();
        assert_eq!(store.get(id).await.unwrap().unwrap().progress, 55);
    }

    #[tokio::test]
    async fn terminal_states_reject_further_transitions() {
        let store = store();
        let job = Job::new();
        let id = job.id;
        store.create(job).await.unwrap();

        store.fail(id, "network down".to_string()).await.unwrap();
        assert!(store.set_status(id, JobStatus::Transcribing).await.is_err());
        assert!(store.fail(id, "again".to_string()).await.is_err());

        let record = store.get(id).await.unwrap().unwrap();
        assert_eq!(record.status, JobStatus::Error);
        assert_eq!(
            record.result,
            Some(JobOutcome::Failure {
                message: "network down".to_string()
            })
        );
    }

    #[tokio::test]
    async fn backward_status_transitions_are_rejected() {
        let store = store();
        let job = Job::new();
        let id = job.id;
        store.create(job).await.unwrap();

        store.set_status(id, JobStatus::Transcribing).await.unwrap();
        let err = store.set_status(id, JobStatus::Downloading).await.unwrap_err();
        assert!(matches!(err, JobStoreError::IllegalTransition { .. }));
    }

    #[tokio::test]
    async fn complete_sets_full_progress_and_outcome() {
        let store = store();
        let job = Job::new();
        let id = job.id;
        store.create(job).await.unwrap();
        store.set_status(id, JobStatus::Finalizing).await.unwrap();

        store
            .complete(
                id,
                JobOutcome::Success {
                    transcript: crate::domain::TranscriptRef::Inline("salut".to_string()),
                    model_label: "whisper-base-fr".to_string(),
                    elapsed_secs: 1.5,
                    input_bytes: 42,
                },
            )
            .await
            .unwrap();

        let record = store.get(id).await.unwrap().unwrap();
        assert_eq!(record.status, JobStatus::Completed);
        assert_eq!(record.progress, 100);
    }

    #[tokio::test]
    async fn expired_terminal_records_are_evicted_on_create() {
        let store = InMemoryJobStore::new(Duration::from_secs(0));
        let old = Job::new();
        let old_id = old.id;
        store.create(old).await.unwrap();
        store.fail(old_id, "done for".to_string()).await.unwrap();

        tokio::time::sleep(Duration::from_millis(10)).await;
        store.create(Job::new()).await.unwrap();

        assert!(store.get(old_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn active_records_are_never_evicted() {
        let store = InMemoryJobStore::new(Duration::from_secs(0));
        let active = Job::new();
        let active_id = active.id;
        store.create(active).await.unwrap();

        tokio::time::sleep(Duration::from_millis(10)).await;
        store.create(Job::new()).await.unwrap();

        assert!(store.get(active_id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn unknown_job_yields_not_found() {
        let store = store();
        let err = store.set_progress(JobId::new(), 10).await.unwrap_err();
        assert!(matches!(err, JobStoreError::NotFound(_)));
    }
}
