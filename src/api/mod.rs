//! HTTP resource handlers, one module per endpoint group, assembled into a
//! single router by `src/server.rs`.

pub mod audio;
pub mod generate;
pub mod health;
pub mod providers;
pub mod settings;
pub mod voices;

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::config::{Settings, SharedRuntimeConfig};
use crate::jobs::JobManager;
use crate::providers::ProviderRegistry;

/// Shared application state, cloned into every handler by axum's `State`
/// extractor. Cloning is cheap: every field is an `Arc` (or, for
/// `JobManager`, a struct built entirely out of `Arc`-backed fields).
#[derive(Clone)]
pub struct AppState {
    pub job_manager: JobManager,
    pub registry: Arc<ProviderRegistry>,
    pub settings: Arc<Settings>,
    pub runtime_config: SharedRuntimeConfig,
    pub started_at: DateTime<Utc>,
}
