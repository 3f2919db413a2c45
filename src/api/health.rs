//! `GET /health` — a liveness probe. The audio pipeline decodes/encodes MP3
//! in-process via `symphonia`/`mp3lame-encoder`, so there is no external
//! `ffmpeg` dependency to actually probe; the field is reported `true` with
//! `codec: "in-process"` to say so explicitly rather than silently omit it.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::AppState;
use crate::models::responses::{HealthDependencies, HealthResponse};

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

async fn health(State(_state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        dependencies: HealthDependencies {
            ffmpeg: true,
            codec: "in-process".to_string(),
        },
    })
}
