//! `POST /voices` — lists a single provider's voice catalog, cached by the
//! registry after the first successful call.

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};

use crate::api::AppState;
use crate::error::Result;
use crate::models::requests::VoicesRequest;
use crate::models::responses::VoicesResponse;

pub fn router() -> Router<AppState> {
    Router::new().route("/voices", post(list_voices))
}

async fn list_voices(
    State(state): State<AppState>,
    Json(request): Json<VoicesRequest>,
) -> Result<Json<VoicesResponse>> {
    let voices = state.registry.list_voices(request.provider).await?;
    Ok(Json(VoicesResponse {
        provider: request.provider.to_string(),
        voices,
    }))
}
