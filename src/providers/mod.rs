pub mod amazon;
pub mod base;
pub mod elevenlabs;
pub mod google;
pub mod openai;
pub mod registry;

pub use amazon::AmazonProvider;
pub use base::TtsProvider;
pub use elevenlabs::ElevenLabsProvider;
pub use google::GoogleProvider;
pub use openai::OpenAiProvider;
pub use registry::ProviderRegistry;

use std::sync::Arc;

use crate::config::{Settings, SharedRuntimeConfig};

/// Builds a registry with all four adapters registered, regardless of
/// whether their credentials are present — `is_configured` is checked at
/// lookup time, not at registration time. Adapters hold `settings` and
/// `runtime` by shared reference, so a later `PUT /settings` write through
/// the same `runtime` handle is visible to every adapter immediately; the
/// registry never needs to be rebuilt.
pub fn build_registry(settings: Arc<Settings>, runtime: SharedRuntimeConfig) -> ProviderRegistry {
    let mut registry = ProviderRegistry::new();
    registry.register(Arc::new(GoogleProvider::new(settings.clone(), runtime.clone())));
    registry.register(Arc::new(AmazonProvider::new(settings.clone(), runtime.clone())));
    registry.register(Arc::new(ElevenLabsProvider::new(settings.clone(), runtime.clone())));
    registry.register(Arc::new(OpenAiProvider::new(settings, runtime)));
    registry
}
