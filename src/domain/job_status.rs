use std::fmt;
use std::str::FromStr;

/// Lifecycle states of a transcription job. Transitions only move forward
/// through the sequence; `Error` is reachable from any non-terminal state and
/// both `Completed` and `Error` are absorbing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobStatus {
    Pending,
    Processing,
    Downloading,
    Preparing,
    Transcribing,
    Finalizing,
    Completed,
    Error,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Processing => "processing",
            JobStatus::Downloading => "downloading",
            JobStatus::Preparing => "preparing",
            JobStatus::Transcribing => "transcribing",
            JobStatus::Finalizing => "finalizing",
            JobStatus::Completed => "completed",
            JobStatus::Error => "error",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Error)
    }

    fn rank(&self) -> u8 {
        match self {
            JobStatus::Pending => 0,
            JobStatus::Processing => 1,
            JobStatus::Downloading => 2,
            JobStatus::Preparing => 3,
            JobStatus::Transcribing => 4,
            JobStatus::Finalizing => 5,
            JobStatus::Completed => 6,
            JobStatus::Error => 6,
        }
    }

    /// Whether `next` is a legal successor of `self`.
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        if next == JobStatus::Error {
            return true;
        }
        next.rank() > self.rank()
    }
}

impl FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(JobStatus::Pending),
            "processing" => Ok(JobStatus::Processing),
            "downloading" => Ok(JobStatus::Downloading),
            "preparing" => Ok(JobStatus::Preparing),
            "transcribing" => Ok(JobStatus::Transcribing),
            "finalizing" => Ok(JobStatus::Finalizing),
            "completed" => Ok(JobStatus::Completed),
            "error" => Ok(JobStatus::Error),
            _ => Err(format!("Invalid job status: {}", s)),
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_str() {
        for status in [
            JobStatus::Pending,
            JobStatus::Processing,
            JobStatus::Downloading,
            JobStatus::Preparing,
            JobStatus::Transcribing,
            JobStatus::Finalizing,
            JobStatus::Completed,
            JobStatus::Error,
        ] {
            assert_eq!(status.as_str().parse::<JobStatus>().unwrap(), status);
        }
    }

    #[test]
    fn terminal_states_absorb() {
        assert!(!JobStatus::Completed.can_transition_to(JobStatus::Error));
        assert!(!JobStatus::Error.can_transition_to(JobStatus::Pending));
        assert!(!JobStatus::Completed.can_transition_to(JobStatus::Completed));
    }

    #[test]
    fn error_reachable_from_any_non_terminal() {
        for status in [
            JobStatus::Pending,
            JobStatus::Processing,
            JobStatus::Downloading,
            JobStatus::Preparing,
            JobStatus::Transcribing,
            JobStatus::Finalizing,
        ] {
            assert!(status.can_transition_to(JobStatus::Error));
        }
    }

    #[test]
    fn no_backward_transitions() {
        assert!(!JobStatus::Transcribing.can_transition_to(JobStatus::Downloading));
        assert!(!JobStatus::Finalizing.can_transition_to(JobStatus::Pending));
        assert!(JobStatus::Downloading.can_transition_to(JobStatus::Transcribing));
        assert!(JobStatus::Finalizing.can_transition_to(JobStatus::Completed));
    }
}
