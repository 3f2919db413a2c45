//! `GET /audio/{id}` (metadata) and `GET /audio/{id}/file` (the MP3 bytes).

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::AppState;
use crate::error::Result;
use crate::models::responses::AudioMetadataResponse;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/audio/:id", get(audio_metadata))
        .route("/audio/:id/file", get(audio_file))
}

async fn audio_metadata(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<Json<AudioMetadataResponse>> {
    let metadata = state.job_manager.get_audio_metadata(&job_id).await?;
    Ok(Json(metadata))
}

async fn audio_file(State(state): State<AppState>, Path(job_id): Path<String>) -> Result<impl IntoResponse> {
    let path = state.job_manager.get_audio_file_path(&job_id).await?;
    let bytes = tokio::fs::read(&path).await?;

    Ok((
        [
            (header::CONTENT_TYPE, "audio/mpeg".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"tts-{job_id}.mp3\""),
            ),
        ],
        Body::from(bytes),
    ))
}
