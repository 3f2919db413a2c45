//! `POST /generate` and `GET /generate/{id}/status` — starts a generation
//! job and reports on its progress.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::AppState;
use crate::error::{Result, TtsError};
use crate::models::requests::GenerateRequest;
use crate::models::responses::{GenerateResponse, JobStatusResponse};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/generate", post(create_generation))
        .route("/generate/:id/status", get(job_status))
}

async fn create_generation(
    State(state): State<AppState>,
    Json(request): Json<GenerateRequest>,
) -> Result<impl IntoResponse> {
    request.validate().map_err(TtsError::Validation)?;

    let job = state
        .job_manager
        .create_job(request.provider, request.voice_id, request.text, request.speed)
        .await?;

    let job_id = job.id.clone();
    let manager = state.job_manager.clone();
    tokio::spawn(async move {
        manager.process_job(job_id).await;
    });

    Ok((
        StatusCode::ACCEPTED,
        Json(GenerateResponse {
            job_id: job.id,
            status: job.status.as_str().to_string(),
        }),
    ))
}

async fn job_status(State(state): State<AppState>, Path(job_id): Path<String>) -> Result<Json<JobStatusResponse>> {
    let job = state.job_manager.get_job_status(&job_id).await?;
    Ok(Json(JobStatusResponse {
        job_id: job.id,
        status: job.status.as_str().to_string(),
        progress: job.progress,
        total_chunks: job.total_chunks,
        completed_chunks: job.completed_chunks,
        error_message: job.error_message,
    }))
}
