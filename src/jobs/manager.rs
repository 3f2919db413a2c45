//! Orchestrates the lifecycle of a generation job: chunking, per-chunk
//! synthesis with retry, timing normalization, and audio stitching.

use std::sync::Arc;
use uuid::Uuid;

use crate::audio::{AudioStitcher, AudioStore};
use crate::config::constants::DEFAULT_SILENCE_BETWEEN_MS;
use crate::error::{Result, TtsError};
use crate::jobs::retry::synthesize_with_retry;
use crate::jobs::store::JobStore;
use crate::models::job::{GenerationStatus, Job};
use crate::models::provider::ProviderName;
use crate::models::responses::AudioMetadataResponse;
use crate::models::synthesis::SynthesisResult;
use crate::processing::{TextChunk, TextChunker, TimingNormalizer};
use crate::providers::ProviderRegistry;

/// Owns the job store, the provider registry, and the audio store, and
/// drives jobs from `pending` through to a terminal state.
#[derive(Clone)]
pub struct JobManager {
    jobs: JobStore,
    registry: Arc<ProviderRegistry>,
    audio_store: Arc<AudioStore>,
    chunker: TextChunker,
    normalizer: TimingNormalizer,
}

impl JobManager {
    pub fn new(registry: Arc<ProviderRegistry>, audio_store: Arc<AudioStore>) -> Self {
        Self {
            jobs: JobStore::new(),
            registry,
            audio_store,
            chunker: TextChunker::new(),
            normalizer: TimingNormalizer::new(),
        }
    }

    /// Validates the provider is configured, chunks `text` to its
    /// `max_chunk_chars`, and inserts a fresh `pending` job. Does not start
    /// processing — call `process_job` (typically via `tokio::spawn`) next.
    pub async fn create_job(&self, provider: ProviderName, voice_id: String, text: String, speed: f32) -> Result<Job> {
        let adapter = self.registry.get_configured(provider)?;
        let chunks = self.chunker.chunk(&text, adapter.capabilities().max_chunk_chars)?;
        let job_id = Uuid::new_v4().to_string();
        let job = Job::new(job_id, provider, voice_id, text, speed, chunks.len());
        self.jobs.insert(job.clone()).await;
        Ok(job)
    }

    pub async fn get_job_status(&self, job_id: &str) -> Result<Job> {
        self.jobs.get(job_id).await
    }

    /// Removes job records older than `max_age_hours` that reached a
    /// terminal state. Run periodically from a background task; does not
    /// touch the audio store (see `AudioStore::cleanup_older_than`).
    pub async fn cleanup_old_jobs(&self, max_age_hours: i64) -> usize {
        self.jobs.cleanup_old_jobs(max_age_hours).await
    }

    pub async fn get_audio_file_path(&self, job_id: &str) -> Result<std::path::PathBuf> {
        let job = self.jobs.get(job_id).await?;
        if job.status != GenerationStatus::Completed {
            return Err(TtsError::JobNotCompleted(format!("job {job_id} has not completed")));
        }
        self.audio_store.get_path(job_id)
    }

    pub async fn get_audio_metadata(&self, job_id: &str) -> Result<AudioMetadataResponse> {
        let job = self.jobs.get(job_id).await?;
        if job.status != GenerationStatus::Completed {
            return Err(TtsError::JobNotCompleted(format!("job {job_id} has not completed")));
        }
        let path = self.audio_store.get_path(job_id)?;
        let size_bytes = tokio::fs::metadata(&path).await?.len();
        let duration_ms = crate::audio::get_duration_ms(&tokio::fs::read(&path).await?)?;
        let timing_data = job
            .timing_data
            .ok_or_else(|| TtsError::Internal(format!("job {job_id} completed without timing data")))?;
        Ok(AudioMetadataResponse {
            job_id: job_id.to_string(),
            duration_ms,
            size_bytes,
            timing_data,
        })
    }

    /// Drives a `pending` job to completion or failure. Intended to be run
    /// detached via `tokio::spawn`; never panics out of the task.
    pub async fn process_job(&self, job_id: String) {
        if let Err(err) = self.run(&job_id).await {
            self.jobs
                .update(&job_id, |job| {
                    job.status = GenerationStatus::Failed;
                    job.error_message = Some(err.sanitized_message());
                    job.completed_at = Some(chrono::Utc::now());
                })
                .await;
            tracing::warn!(job_id, error = %err, "job failed");
        }
    }

    async fn run(&self, job_id: &str) -> Result<()> {
        let job = self.jobs.get(job_id).await?;
        self.jobs
            .update(job_id, |job| job.status = GenerationStatus::InProgress)
            .await;

        let adapter = self.registry.get_configured(job.provider)?;
        let chunks: Vec<TextChunk> = self.chunker.chunk(&job.text, adapter.capabilities().max_chunk_chars)?;
        let mut results: Vec<SynthesisResult> = Vec::with_capacity(chunks.len());

        for (i, chunk) in chunks.iter().enumerate() {
            let result = synthesize_with_retry(&adapter, &chunk.text, &job.voice_id, job.speed).await?;
            results.push(result);
            let completed = i + 1;
            let total = chunks.len().max(1);
            self.jobs
                .update(job_id, |job| {
                    job.completed_chunks = completed;
                    job.progress = completed as f32 / total as f32;
                })
                .await;
        }

        let fragments: Vec<Vec<u8>> = results.iter().map(|r| r.audio_bytes.clone()).collect();
        let stitcher = AudioStitcher::new(DEFAULT_SILENCE_BETWEEN_MS, 0);
        let stitched = stitcher.stitch(&fragments)?;
        self.audio_store.save(job_id, &stitched.audio_bytes).await?;

        let timing_data = self.normalizer.normalize(
            &chunks,
            &results,
            DEFAULT_SILENCE_BETWEEN_MS,
            &job.text,
            stitched.duration_ms,
        );

        self.jobs
            .update(job_id, |job| {
                job.status = GenerationStatus::Completed;
                job.progress = 1.0;
                job.audio_file_path = Some(format!("{job_id}.mp3"));
                job.timing_data = Some(timing_data);
                job.completed_at = Some(chrono::Utc::now());
            })
            .await;
        Ok(())
    }
}
