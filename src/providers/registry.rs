//! Holds one adapter per provider identity and answers lookups for the job
//! manager and the HTTP surface.

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;

use crate::error::{Result, TtsError};
use crate::models::provider::{ProviderInfo, ProviderName, Voice};
use crate::providers::base::TtsProvider;

#[derive(Default)]
pub struct ProviderRegistry {
    providers: HashMap<ProviderName, Arc<dyn TtsProvider>>,
    voice_cache: DashMap<ProviderName, Vec<Voice>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, provider: Arc<dyn TtsProvider>) {
        self.providers.insert(provider.provider_name(), provider);
    }

    pub fn get(&self, name: ProviderName) -> Option<Arc<dyn TtsProvider>> {
        self.providers.get(&name).cloned()
    }

    pub fn get_or_not_found(&self, name: ProviderName) -> Result<Arc<dyn TtsProvider>> {
        self.get(name)
            .ok_or_else(|| TtsError::InvalidProvider(format!("unknown provider: {name}")))
    }

    pub fn get_configured(&self, name: ProviderName) -> Result<Arc<dyn TtsProvider>> {
        let provider = self.get_or_not_found(name)?;
        if !provider.is_configured() {
            return Err(TtsError::ProviderNotConfigured(format!(
                "provider {name} is not configured"
            )));
        }
        Ok(provider)
    }

    pub fn list_providers(&self) -> Vec<ProviderInfo> {
        ProviderName::all()
            .into_iter()
            .filter_map(|name| self.providers.get(&name))
            .map(|p| ProviderInfo {
                name: p.provider_name(),
                display_name: p.display_name().to_string(),
                capabilities: p.capabilities(),
                is_configured: p.is_configured(),
            })
            .collect()
    }

    pub fn get_configured_providers(&self) -> Vec<Arc<dyn TtsProvider>> {
        self.providers.values().filter(|p| p.is_configured()).cloned().collect()
    }

    /// Lists a provider's voices, caching the result after the first
    /// success so repeated calls don't re-hit the network.
    pub async fn list_voices(&self, name: ProviderName) -> Result<Vec<Voice>> {
        if let Some(cached) = self.voice_cache.get(&name) {
            return Ok(cached.clone());
        }
        let provider = self.get_configured(name)?;
        let voices = provider.list_voices().await?;
        self.voice_cache.insert(name, voices.clone());
        Ok(voices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::provider::ProviderCapabilities;
    use crate::models::synthesis::SynthesisResult;
    use async_trait::async_trait;

    struct StubProvider {
        name: ProviderName,
        configured: bool,
        list_voices_calls: std::sync::atomic::AtomicUsize,
    }

    #[async_trait]
    impl TtsProvider for StubProvider {
        fn provider_name(&self) -> ProviderName {
            self.name
        }

        fn is_configured(&self) -> bool {
            self.configured
        }

        fn capabilities(&self) -> ProviderCapabilities {
            ProviderCapabilities {
                supports_speed_control: true,
                supports_word_timing: false,
                min_speed: 0.25,
                max_speed: 4.0,
                default_speed: 1.0,
                max_chunk_chars: 4000,
            }
        }

        async fn list_voices(&self) -> Result<Vec<crate::models::provider::Voice>> {
            self.list_voices_calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            Ok(vec![crate::models::provider::Voice {
                voice_id: "v1".into(),
                name: "Voice One".into(),
                language_code: None,
                gender: None,
            }])
        }

        async fn synthesize(&self, _text: &str, _voice_id: &str, _speed: f32) -> Result<SynthesisResult> {
            unimplemented!()
        }
    }

    impl StubProvider {
        fn new(name: ProviderName, configured: bool) -> Self {
            Self {
                name,
                configured,
                list_voices_calls: std::sync::atomic::AtomicUsize::new(0),
            }
        }
    }

    #[test]
    fn unregistered_provider_is_invalid() {
        let registry = ProviderRegistry::new();
        let err = registry.get_or_not_found(ProviderName::Google).unwrap_err();
        assert!(matches!(err, TtsError::InvalidProvider(_)));
    }

    #[test]
    fn unconfigured_provider_rejected_on_admission() {
        let mut registry = ProviderRegistry::new();
        registry.register(Arc::new(StubProvider::new(ProviderName::Openai, false)));
        let err = registry.get_configured(ProviderName::Openai).unwrap_err();
        assert!(matches!(err, TtsError::ProviderNotConfigured(_)));
    }

    #[test]
    fn configured_provider_lookup_succeeds() {
        let mut registry = ProviderRegistry::new();
        registry.register(Arc::new(StubProvider::new(ProviderName::Openai, true)));
        assert!(registry.get_configured(ProviderName::Openai).is_ok());
    }

    #[test]
    fn list_providers_only_includes_registered() {
        let mut registry = ProviderRegistry::new();
        registry.register(Arc::new(StubProvider::new(ProviderName::Openai, true)));
        let list = registry.list_providers();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].name, ProviderName::Openai);
    }

    #[tokio::test]
    async fn list_voices_is_cached_after_first_success() {
        let stub = Arc::new(StubProvider::new(ProviderName::Openai, true));
        let mut registry = ProviderRegistry::new();
        registry.register(stub.clone());

        let first = registry.list_voices(ProviderName::Openai).await.unwrap();
        let second = registry.list_voices(ProviderName::Openai).await.unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(second.len(), 1);
        assert_eq!(stub.list_voices_calls.load(std::sync::atomic::Ordering::SeqCst), 1);
    }
}
