//! Assembles the HTTP surface: one router per resource module under
//! `src/api`, wrapped in the shared request-id/access-log/auth/rate-limit
//! middleware stack and served over `axum`.

use std::time::Duration;

use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;

use crate::api::{audio, generate, health, providers, settings, voices, AppState};
use crate::auth::{auth_middleware, ApiKeys};
use crate::logging::access_log_middleware;
use crate::rate_limit::{rate_limit_middleware, RateLimiterMode};

/// Builds the full axum `Router`, ready to serve.
///
/// `api_keys` gates every route behind `X-API-Key`/`Authorization: Bearer`
/// unless empty (auth disabled). `rate_limiter` is layered only when
/// present — rate limiting is an ambient hardening concern, not part of the
/// spec's request contract, so it is off by default.
pub fn create_router(
    state: AppState,
    api_keys: ApiKeys,
    rate_limiter: Option<RateLimiterMode>,
    request_timeout: Duration,
) -> Router {
    let mut router = Router::new()
        .merge(providers::router())
        .merge(voices::router())
        .merge(generate::router())
        .merge(audio::router())
        .merge(settings::router())
        .merge(health::router())
        .with_state(state);

    if let Some(limiter) = rate_limiter {
        router = router.layer(axum::middleware::from_fn_with_state(limiter, rate_limit_middleware));
    }

    router
        .layer(axum::middleware::from_fn_with_state(api_keys, auth_middleware))
        .layer(axum::middleware::from_fn(access_log_middleware))
        .layer(axum::middleware::from_fn(crate::logging::middleware::request_id_middleware))
        .layer(
            ServiceBuilder::new()
                .layer(CorsLayer::permissive())
                .layer(TimeoutLayer::new(request_timeout)),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::AudioStore;
    use crate::config::{RuntimeConfig, Settings};
    use crate::jobs::JobManager;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use std::sync::{Arc, RwLock};
    use tower::ServiceExt;

    fn empty_settings() -> Settings {
        Settings {
            host: "0.0.0.0".into(),
            port: 8080,
            audio_storage_dir: "./audio".into(),
            google_credentials_path: None,
            google_api_key: None,
            aws_access_key_id: None,
            aws_secret_access_key: None,
            aws_region: "us-east-1".into(),
            elevenlabs_api_key: None,
            openai_api_key: None,
        }
    }

    fn test_state(dir: &std::path::Path) -> AppState {
        let settings = Arc::new(empty_settings());
        let runtime = Arc::new(RwLock::new(RuntimeConfig::new()));
        let registry = Arc::new(crate::providers::build_registry(settings.clone(), runtime.clone()));
        let audio_store = Arc::new(AudioStore::new(dir));
        AppState {
            job_manager: JobManager::new(registry.clone(), audio_store),
            registry,
            settings,
            runtime_config: runtime,
            started_at: chrono::Utc::now(),
        }
    }

    #[tokio::test]
    async fn health_endpoint_is_reachable_without_auth() {
        let dir = tempfile::tempdir().unwrap();
        let router = create_router(test_state(dir.path()), ApiKeys::empty(), None, Duration::from_secs(30));
        let response = router
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn unknown_provider_returns_bad_request() {
        let dir = tempfile::tempdir().unwrap();
        let router = create_router(test_state(dir.path()), ApiKeys::empty(), None, Duration::from_secs(30));
        let response = router
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/voices")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"provider":"google"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn missing_api_key_rejected_when_auth_enabled() {
        let dir = tempfile::tempdir().unwrap();
        let mut keys = std::collections::HashSet::new();
        keys.insert("secret".to_string());
        let router = create_router(
            test_state(dir.path()),
            ApiKeys::from_keys(keys),
            None,
            Duration::from_secs(30),
        );
        let response = router
            .oneshot(Request::builder().uri("/providers").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
