//! In-memory job records behind a single-writer mutex. Only the job
//! manager holds a handle capable of mutating jobs; everything else reads
//! through `get`.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;

use crate::error::{Result, TtsError};
use crate::models::job::Job;

#[derive(Clone, Default)]
pub struct JobStore {
    jobs: Arc<Mutex<HashMap<String, Job>>>,
}

impl JobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, job: Job) {
        self.jobs.lock().await.insert(job.id.clone(), job);
    }

    pub async fn get(&self, job_id: &str) -> Result<Job> {
        self.jobs
            .lock()
            .await
            .get(job_id)
            .cloned()
            .ok_or_else(|| TtsError::JobNotFound(format!("no job with id {job_id}")))
    }

    /// Applies `update` to the stored job in place, if it still exists.
    /// Used by the manager to publish lifecycle transitions and progress.
    pub async fn update<F>(&self, job_id: &str, update: F)
    where
        F: FnOnce(&mut Job),
    {
        if let Some(job) = self.jobs.lock().await.get_mut(job_id) {
            update(job);
        }
    }

    /// Removes job records (not their audio files — that is the audio
    /// store's concern) older than `max_age_hours`, regardless of status. A
    /// job abandoned mid-`in_progress` (e.g. after a SIGTERM) is reclaimed
    /// by age alone, same as a completed or failed one.
    pub async fn cleanup_old_jobs(&self, max_age_hours: i64) -> usize {
        let cutoff = Utc::now() - chrono::Duration::hours(max_age_hours);
        let mut jobs = self.jobs.lock().await;
        let before = jobs.len();
        jobs.retain(|_, job| job.created_at >= cutoff);
        before - jobs.len()
    }
}
