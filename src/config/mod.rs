//! Process configuration: an immutable, environment-loaded base layer plus a
//! mutable, process-lifetime overlay for credentials supplied at runtime
//! through `PUT /settings`.

pub mod constants;

use std::collections::HashMap;
use std::env;
use std::sync::{Arc, RwLock};

use crate::models::provider::ProviderName;

/// The read-only base configuration, loaded once at startup from the
/// process environment (and `.env`, via `dotenvy`).
#[derive(Debug, Clone)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub audio_storage_dir: String,
    pub google_credentials_path: Option<String>,
    pub google_api_key: Option<String>,
    pub aws_access_key_id: Option<String>,
    pub aws_secret_access_key: Option<String>,
    pub aws_region: String,
    pub elevenlabs_api_key: Option<String>,
    pub openai_api_key: Option<String>,
}

impl Settings {
    pub fn from_env() -> Self {
        Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8080),
            audio_storage_dir: env::var("AUDIO_STORAGE_DIR").unwrap_or_else(|_| "./audio".to_string()),
            google_credentials_path: env::var("GOOGLE_CREDENTIALS_PATH")
                .or_else(|_| env::var("GOOGLE_APPLICATION_CREDENTIALS"))
                .ok(),
            google_api_key: env::var("GOOGLE_API_KEY").ok(),
            aws_access_key_id: env::var("AWS_ACCESS_KEY_ID").ok(),
            aws_secret_access_key: env::var("AWS_SECRET_ACCESS_KEY").ok(),
            aws_region: env::var("AWS_REGION").unwrap_or_else(|_| "us-east-1".to_string()),
            elevenlabs_api_key: env::var("ELEVENLABS_API_KEY").ok(),
            openai_api_key: env::var("OPENAI_API_KEY").ok(),
        }
    }
}

/// A mutable, in-memory overlay on top of `Settings`, written by
/// `PUT /settings`. Never persisted to disk; lost on process restart.
#[derive(Debug, Default)]
pub struct RuntimeConfig {
    overrides: HashMap<ProviderName, String>,
}

impl RuntimeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_api_key(&mut self, provider: ProviderName, api_key: String) {
        self.overrides.insert(provider, api_key);
    }

    pub fn api_key_override(&self, provider: ProviderName) -> Option<&str> {
        self.overrides.get(&provider).map(String::as_str)
    }
}

/// A process-wide, mutable handle on the overlay. Provider adapters hold a
/// clone of this so a `PUT /settings` write is visible to every subsequent
/// `is_configured`/`synthesize` call without rebuilding the registry.
pub type SharedRuntimeConfig = Arc<RwLock<RuntimeConfig>>;

/// Resolves whether a provider has usable credentials, consulting the
/// runtime overlay before the environment-loaded base, per provider's own
/// credential shape.
pub fn is_provider_configured(provider: ProviderName, settings: &Settings, runtime: &RuntimeConfig) -> bool {
    match provider {
        ProviderName::Google => {
            runtime.api_key_override(provider).is_some()
                || settings.google_credentials_path.is_some()
                || settings.google_api_key.is_some()
        }
        ProviderName::Amazon => {
            settings.aws_access_key_id.is_some()
                && (runtime.api_key_override(provider).is_some() || settings.aws_secret_access_key.is_some())
        }
        ProviderName::Elevenlabs => {
            runtime.api_key_override(provider).is_some() || settings.elevenlabs_api_key.is_some()
        }
        ProviderName::Openai => {
            runtime.api_key_override(provider).is_some() || settings.openai_api_key.is_some()
        }
    }
}
