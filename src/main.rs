mod api;
mod audio;
mod auth;
mod cli;
mod config;
mod error;
mod jobs;
mod logging;
mod models;
mod processing;
mod providers;
mod rate_limit;
mod server;
mod utils;

use std::env;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use api::AppState;
use auth::load_api_keys;
use config::{RuntimeConfig, Settings};
use rate_limit::{PerIpRateLimiter, PerKeyRateLimiter, RateLimitConfig, RateLimiterMode};
use server::create_router;

const JOB_MAX_AGE_HOURS: i64 = 24;
const CLEANUP_INTERVAL_SECONDS: u64 = 3600;

#[tokio::main]
async fn main() -> error::Result<()> {
    let _ = dotenvy::dotenv();

    let args: Vec<String> = env::args().collect();

    if args.contains(&"--version".to_string()) || args.contains(&"-v".to_string()) {
        cli::print_version();
        return Ok(());
    }

    if args.contains(&"--help".to_string()) || args.contains(&"-h".to_string()) {
        cli::print_help();
        return Ok(());
    }

    let log_config = logging::LogConfig::from_env();
    if let Err(err) = logging::init_logging(&log_config) {
        eprintln!("Warning: failed to initialize logging system: {err}");
    }
    logging::log_platform_info();

    let settings = Arc::new(Settings::from_env());
    let runtime_config = Arc::new(RwLock::new(RuntimeConfig::new()));
    let registry = Arc::new(providers::build_registry(settings.clone(), runtime_config.clone()));
    let audio_store = Arc::new(audio::AudioStore::new(&settings.audio_storage_dir));
    let job_manager = jobs::JobManager::new(registry.clone(), audio_store.clone());

    let api_keys = load_api_keys();
    let rate_limiter = load_rate_limit_config(api_keys.is_enabled());
    let request_timeout = load_request_timeout();

    tracing::info!(
        host = %settings.host,
        port = settings.port,
        auth_enabled = api_keys.is_enabled(),
        rate_limiting_enabled = rate_limiter.is_some(),
        request_timeout_secs = request_timeout.as_secs(),
        "Starting TTS generation server"
    );

    spawn_cleanup_task(job_manager.clone(), audio_store.clone());

    let state = AppState {
        job_manager,
        registry,
        settings: settings.clone(),
        runtime_config,
        started_at: chrono::Utc::now(),
    };

    let app = create_router(state, api_keys, rate_limiter, request_timeout);

    let addr = format!("{}:{}", settings.host, settings.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on http://{addr}");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .await?;

    Ok(())
}

/// Periodically sweeps terminal jobs and their audio files older than
/// `JOB_MAX_AGE_HOURS` so the job store and audio directory don't grow
/// unbounded over a long-running process.
fn spawn_cleanup_task(job_manager: jobs::JobManager, audio_store: Arc<audio::AudioStore>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(CLEANUP_INTERVAL_SECONDS));
        loop {
            interval.tick().await;
            let jobs_removed = job_manager.cleanup_old_jobs(JOB_MAX_AGE_HOURS).await;
            match audio_store.cleanup_older_than(JOB_MAX_AGE_HOURS).await {
                Ok(files_removed) => {
                    tracing::info!(jobs_removed, files_removed, "Ran periodic job/audio cleanup sweep");
                }
                Err(err) => {
                    tracing::warn!(jobs_removed, error = %err, "Audio cleanup sweep failed");
                }
            }
        }
    });
}

/// Load rate limit configuration based on environment variables and API key status
fn load_rate_limit_config(api_keys_enabled: bool) -> Option<RateLimiterMode> {
    let mode = env::var("RATE_LIMIT_MODE")
        .unwrap_or_else(|_| "auto".to_string())
        .to_lowercase();

    match mode.as_str() {
        "disabled" => None,
        "per-key" => {
            let config = load_authenticated_config();
            Some(RateLimiterMode::PerKey(PerKeyRateLimiter::new(config)))
        }
        "per-ip" => {
            let config = load_unauthenticated_config();
            Some(RateLimiterMode::PerIp(PerIpRateLimiter::new(config)))
        }
        _ => {
            if api_keys_enabled {
                let config = load_authenticated_config();
                Some(RateLimiterMode::PerKey(PerKeyRateLimiter::new(config)))
            } else {
                let config = load_unauthenticated_config();
                Some(RateLimiterMode::PerIp(PerIpRateLimiter::new(config)))
            }
        }
    }
}

/// Load configuration for authenticated (per-key) rate limiting
fn load_authenticated_config() -> RateLimitConfig {
    let per_second = env::var("RATE_LIMIT_AUTHENTICATED_PER_SECOND")
        .or_else(|_| env::var("RATE_LIMIT_PER_SECOND"))
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(10);

    let burst_size = env::var("RATE_LIMIT_AUTHENTICATED_BURST_SIZE")
        .or_else(|_| env::var("RATE_LIMIT_BURST_SIZE"))
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(20);

    RateLimitConfig {
        per_second,
        burst_size,
    }
}

/// Load configuration for unauthenticated (per-IP) rate limiting
fn load_unauthenticated_config() -> RateLimitConfig {
    let per_second = env::var("RATE_LIMIT_UNAUTHENTICATED_PER_SECOND")
        .or_else(|_| env::var("RATE_LIMIT_PER_SECOND"))
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(5);

    let burst_size = env::var("RATE_LIMIT_UNAUTHENTICATED_BURST_SIZE")
        .or_else(|_| env::var("RATE_LIMIT_BURST_SIZE"))
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(10);

    RateLimitConfig {
        per_second,
        burst_size,
    }
}

/// Load request timeout configuration from environment variable
fn load_request_timeout() -> Duration {
    let timeout_seconds = env::var("REQUEST_TIMEOUT_SECONDS")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(60);

    Duration::from_secs(timeout_seconds)
}
