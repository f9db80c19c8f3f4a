//! Job record and lifecycle states

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Job lifecycle state
///
/// `queued → (downloading) → processing → completed | failed`.
/// `downloading` is entered only for remote-source jobs; uploads go
/// straight from `queued` to `processing`. Stage-by-stage progress is
/// observational (`progress`/`message` on the record), not a state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Job accepted, pipeline not yet started
    Queued,
    /// Remote source is being fetched
    Downloading,
    /// Pipeline stages are running
    Processing,
    /// Finished successfully; `result_location` is set
    Completed,
    /// Finished with a fatal stage error; `error` is set
    Failed,
}

impl JobStatus {
    /// Terminal states permit no further mutation of the record
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

/// The state of one conversion job
///
/// Owned exclusively by the pipeline task driving the job; everything
/// else sees read-only snapshots through the registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRecord {
    /// Job identifier
    pub job_id: String,
    /// Current lifecycle state
    pub status: JobStatus,
    /// Progress 0-100, monotonically non-decreasing while active
    pub progress: u8,
    /// Human-readable current-stage description
    pub message: String,
    /// Failure description, set only in the `failed` state
    #[serde(default)]
    pub error: Option<String>,
    /// Location of the finished artifact, set only on success
    #[serde(default)]
    pub result_location: Option<PathBuf>,
}

impl JobRecord {
    /// Create a freshly queued record
    #[must_use]
    pub fn new(job_id: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            status: JobStatus::Queued,
            progress: 0,
            message: "Queued".to_string(),
            error: None,
            result_location: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_status_serialization() {
        assert_eq!(
            serde_json::to_string(&JobStatus::Queued).unwrap(),
            "\"queued\""
        );
        assert_eq!(
            serde_json::to_string(&JobStatus::Downloading).unwrap(),
            "\"downloading\""
        );
        assert_eq!(
            serde_json::to_string(&JobStatus::Completed).unwrap(),
            "\"completed\""
        );
    }

    #[test]
    fn test_terminal_states() {
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
        assert!(!JobStatus::Queued.is_terminal());
        assert!(!JobStatus::Downloading.is_terminal());
        assert!(!JobStatus::Processing.is_terminal());
    }

    #[test]
    fn test_new_record_is_queued() {
        let record = JobRecord::new("abc");
        assert_eq!(record.status, JobStatus::Queued);
        assert_eq!(record.progress, 0);
        assert!(record.error.is_none());
        assert!(record.result_location.is_none());
    }
}
