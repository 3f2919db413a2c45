//! `GET /providers` — the static capability contract for all four adapters,
//! annotated with whether each currently has usable credentials.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::AppState;
use crate::models::responses::ProvidersResponse;

pub fn router() -> Router<AppState> {
    Router::new().route("/providers", get(list_providers))
}

async fn list_providers(State(state): State<AppState>) -> Json<ProvidersResponse> {
    Json(ProvidersResponse {
        providers: state.registry.list_providers(),
    })
}
