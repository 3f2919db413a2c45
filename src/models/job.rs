//! The job lifecycle record owned exclusively by the job store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::provider::ProviderName;
use crate::models::timing::TimingData;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
}

impl GenerationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GenerationStatus::Pending => "pending",
            GenerationStatus::InProgress => "in_progress",
            GenerationStatus::Completed => "completed",
            GenerationStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for GenerationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The central lifecycle object for one generation request.
///
/// Transitions `pending -> in_progress -> {completed | failed}`; terminal
/// states never change again. Owned exclusively by the job store — nothing
/// outside it holds a mutable reference to a live job.
#[derive(Debug, Clone)]
pub struct Job {
    pub id: String,
    pub provider: ProviderName,
    pub voice_id: String,
    pub text: String,
    pub speed: f32,
    pub status: GenerationStatus,
    pub progress: f32,
    pub total_chunks: usize,
    pub completed_chunks: usize,
    pub audio_file_path: Option<String>,
    pub timing_data: Option<TimingData>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Job {
    pub fn new(id: String, provider: ProviderName, voice_id: String, text: String, speed: f32, total_chunks: usize) -> Self {
        Self {
            id,
            provider,
            voice_id,
            text,
            speed,
            status: GenerationStatus::Pending,
            progress: 0.0,
            total_chunks,
            completed_chunks: 0,
            audio_file_path: None,
            timing_data: None,
            error_message: None,
            created_at: Utc::now(),
            completed_at: None,
        }
    }
}
