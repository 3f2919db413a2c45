//! `GET /settings` and `PUT /settings` — the provider credential overlay.
//! Never echoes a key value, in either direction.

use axum::extract::State;
use axum::routing::{get, put};
use axum::{Json, Router};

use crate::api::AppState;
use crate::config::is_provider_configured;
use crate::error::{Result, TtsError};
use crate::models::provider::ProviderName;
use crate::models::requests::UpdateSettingsRequest;
use crate::models::responses::{ProviderKeyStatus, SettingsResponse, UpdateSettingsResponse};

pub fn router() -> Router<AppState> {
    Router::new().route("/settings", get(get_settings).put(put_settings))
}

async fn get_settings(State(state): State<AppState>) -> Json<SettingsResponse> {
    let runtime = state.runtime_config.read().expect("runtime config lock poisoned");
    let providers = ProviderName::all()
        .into_iter()
        .map(|provider| ProviderKeyStatus {
            provider: provider.to_string(),
            is_configured: is_provider_configured(provider, &state.settings, &runtime),
        })
        .collect();
    Json(SettingsResponse { providers })
}

async fn put_settings(
    State(state): State<AppState>,
    Json(request): Json<UpdateSettingsRequest>,
) -> Result<Json<UpdateSettingsResponse>> {
    request.validate().map_err(TtsError::Validation)?;

    let provider = state.registry.get_or_not_found(request.provider)?.provider_name();
    state
        .runtime_config
        .write()
        .expect("runtime config lock poisoned")
        .set_api_key(provider, request.api_key);

    let is_configured = state.registry.get_or_not_found(provider)?.is_configured();
    Ok(Json(UpdateSettingsResponse {
        provider: provider.to_string(),
        is_configured,
    }))
}
