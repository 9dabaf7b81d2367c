mod job;
mod job_id;
mod job_status;
mod params;

pub use job::{Job, JobOutcome, TranscriptRef};
pub use job_id::JobId;
pub use job_status::JobStatus;
pub use params::{OutputFormat, TranscriptionParams};
