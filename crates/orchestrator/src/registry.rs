//! Concurrency-safe job registry
//!
//! Maps job ids to job records. One pipeline task owns and mutates one
//! record; status queries read cloned snapshots, so a reader can never
//! observe a partially updated record and never blocks behind a job's
//! long-running stage work (mutations only hold the lock for the map
//! update itself).

use crate::job::{JobRecord, JobStatus};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::warn;

/// Registry of all known jobs
#[derive(Clone, Default)]
pub struct JobRegistry {
    jobs: Arc<RwLock<HashMap<String, JobRecord>>>,
}

impl JobRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            jobs: Arc::new(RwLock::new(HashMap::with_capacity(100))),
        }
    }

    /// Register a new job record
    pub async fn insert(&self, record: JobRecord) {
        self.jobs.write().await.insert(record.job_id.clone(), record);
    }

    /// Read a consistent snapshot of a job record
    pub async fn snapshot(&self, job_id: &str) -> Option<JobRecord> {
        self.jobs.read().await.get(job_id).cloned()
    }

    /// Remove a job record, returning it if present
    pub async fn remove(&self, job_id: &str) -> Option<JobRecord> {
        self.jobs.write().await.remove(job_id)
    }

    pub async fn len(&self) -> usize {
        self.jobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.jobs.read().await.is_empty()
    }

    /// Record entry into a pipeline stage
    ///
    /// Progress is clamped to be monotonically non-decreasing.
    pub async fn set_stage(&self, job_id: &str, status: JobStatus, progress: u8, message: &str) {
        self.mutate(job_id, |record| {
            record.status = status;
            record.progress = record.progress.max(progress);
            record.message = message.to_string();
        })
        .await;
    }

    /// Transition a job to `completed` with its result location
    pub async fn complete(&self, job_id: &str, result_location: PathBuf) {
        self.mutate(job_id, |record| {
            record.status = JobStatus::Completed;
            record.progress = 100;
            record.message = "Complete".to_string();
            record.result_location = Some(result_location);
        })
        .await;
    }

    /// Transition a job to `failed`, capturing the error verbatim
    pub async fn fail(&self, job_id: &str, error: String) {
        self.mutate(job_id, |record| {
            record.status = JobStatus::Failed;
            record.message = "Failed".to_string();
            record.error = Some(error);
        })
        .await;
    }

    /// Apply a mutation to a live record
    ///
    /// Mutating a terminal record is a programming-invariant violation
    /// (only the owning task mutates, and it stops after reaching a
    /// terminal state), so a detected attempt is logged and ignored
    /// rather than applied.
    async fn mutate(&self, job_id: &str, f: impl FnOnce(&mut JobRecord)) {
        let mut jobs = self.jobs.write().await;
        match jobs.get_mut(job_id) {
            Some(record) if record.status.is_terminal() => {
                warn!(
                    "Ignoring mutation of terminal job {} ({:?})",
                    job_id, record.status
                );
            }
            Some(record) => f(record),
            None => warn!("Ignoring mutation of unknown job {}", job_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_insert_and_snapshot() {
        let registry = JobRegistry::new();
        registry.insert(JobRecord::new("job-1")).await;

        let snapshot = registry.snapshot("job-1").await.unwrap();
        assert_eq!(snapshot.status, JobStatus::Queued);
        assert!(registry.snapshot("job-2").await.is_none());
    }

    #[tokio::test]
    async fn test_progress_is_monotonic() {
        let registry = JobRegistry::new();
        registry.insert(JobRecord::new("job-1")).await;

        registry
            .set_stage("job-1", JobStatus::Processing, 50, "Selecting key frames")
            .await;
        // A stale lower progress value never rolls the record back
        registry
            .set_stage("job-1", JobStatus::Processing, 10, "Extracting audio")
            .await;

        let snapshot = registry.snapshot("job-1").await.unwrap();
        assert_eq!(snapshot.progress, 50);
        assert_eq!(snapshot.message, "Extracting audio");
    }

    #[tokio::test]
    async fn test_completed_record_is_immutable() {
        let registry = JobRegistry::new();
        registry.insert(JobRecord::new("job-1")).await;
        registry.complete("job-1", PathBuf::from("output/job-1")).await;

        registry
            .set_stage("job-1", JobStatus::Processing, 10, "Extracting audio")
            .await;
        registry.fail("job-1", "late failure".to_string()).await;

        let snapshot = registry.snapshot("job-1").await.unwrap();
        assert_eq!(snapshot.status, JobStatus::Completed);
        assert_eq!(snapshot.progress, 100);
        assert!(snapshot.error.is_none());
        assert_eq!(snapshot.result_location, Some(PathBuf::from("output/job-1")));
    }

    #[tokio::test]
    async fn test_failed_record_is_immutable() {
        let registry = JobRegistry::new();
        registry.insert(JobRecord::new("job-1")).await;
        registry.fail("job-1", "ffmpeg exploded".to_string()).await;

        registry.complete("job-1", PathBuf::from("output/job-1")).await;

        let snapshot = registry.snapshot("job-1").await.unwrap();
        assert_eq!(snapshot.status, JobStatus::Failed);
        assert_eq!(snapshot.error.as_deref(), Some("ffmpeg exploded"));
        assert!(snapshot.result_location.is_none());
    }

    #[tokio::test]
    async fn test_remove() {
        let registry = JobRegistry::new();
        registry.insert(JobRecord::new("job-1")).await;
        assert_eq!(registry.len().await, 1);

        let removed = registry.remove("job-1").await.unwrap();
        assert_eq!(removed.job_id, "job-1");
        assert!(registry.is_empty().await);
        assert!(registry.remove("job-1").await.is_none());
    }

    #[tokio::test]
    async fn test_mutation_of_unknown_job_is_ignored() {
        let registry = JobRegistry::new();
        // Must not panic or create a record
        registry
            .set_stage("ghost", JobStatus::Processing, 10, "Extracting audio")
            .await;
        assert!(registry.is_empty().await);
    }
}
