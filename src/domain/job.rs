use chrono::{DateTime, Utc};

use super::{JobId, JobStatus};

/// Where the finished transcript lives: short transcripts are returned
/// inline, long ones are persisted and referenced by file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscriptRef {
    Inline(String),
    Stored { file_name: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome {
    Success {
        transcript: TranscriptRef,
        model_label: String,
        elapsed_secs: f64,
        input_bytes: u64,
    },
    Failure {
        message: String,
    },
}

/// One transcription request's tracked lifecycle record. Mutated only by the
/// single worker that owns the job; read concurrently by status pollers.
#[derive(Debug, Clone)]
pub struct Job {
    pub id: JobId,
    pub status: JobStatus,
    pub progress: u8,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub result: Option<JobOutcome>,
}

impl Job {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: JobId::new(),
            status: JobStatus::Pending,
            progress: 0,
            created_at: now,
            updated_at: now,
            result: None,
        }
    }
}

impl Default for Job {
    fn default() -> Self {
        Self::new()
    }
}
