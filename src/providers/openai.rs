//! OpenAI text-to-speech REST adapter.
//!
//! OpenAI reports no per-chunk timing at all; the job manager falls back to
//! sentence-duration estimation for this provider's output.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

use crate::config::{is_provider_configured, Settings, SharedRuntimeConfig};
use crate::error::{Result, TtsError};
use crate::models::provider::{ProviderCapabilities, ProviderName, Voice};
use crate::models::synthesis::SynthesisResult;
use crate::providers::base::TtsProvider;

const ENDPOINT: &str = "https://api.openai.com/v1/audio/speech";

const VOICES: [&str; 6] = ["alloy", "echo", "fable", "onyx", "nova", "shimmer"];

pub struct OpenAiProvider {
    client: Client,
    settings: Arc<Settings>,
    runtime: SharedRuntimeConfig,
}

impl OpenAiProvider {
    pub fn new(settings: Arc<Settings>, runtime: SharedRuntimeConfig) -> Self {
        Self {
            client: Client::new(),
            settings,
            runtime,
        }
    }

    fn resolve_api_key(&self) -> Option<String> {
        let runtime = self.runtime.read().expect("runtime config lock poisoned");
        runtime
            .api_key_override(ProviderName::Openai)
            .map(str::to_string)
            .or_else(|| self.settings.openai_api_key.clone())
    }

    fn clamp_speed(&self, speed: f32) -> f32 {
        speed.clamp(0.25, 4.0)
    }
}

#[async_trait]
impl TtsProvider for OpenAiProvider {
    fn provider_name(&self) -> ProviderName {
        ProviderName::Openai
    }

    fn is_configured(&self) -> bool {
        let runtime = self.runtime.read().expect("runtime config lock poisoned");
        is_provider_configured(ProviderName::Openai, &self.settings, &runtime)
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

    async fn list_voices(&self) -> Result<Vec<Voice>> {
        Ok(VOICES
            .iter()
            .map(|v| Voice {
                voice_id: v.to_string(),
                name: v.to_string(),
                language_code: None,
                gender: None,
            })
            .collect())
    }

    async fn synthesize(&self, text: &str, voice_id: &str, speed: f32) -> Result<SynthesisResult> {
        let api_key = self
            .resolve_api_key()
            .ok_or_else(|| TtsError::ProviderNotConfigured("openai".into()))?;
        if !VOICES.contains(&voice_id) {
            return Err(TtsError::Validation(format!(
                "unknown openai voice: {voice_id}"
            )));
        }
        let speed = self.clamp_speed(speed);

        let body = json!({
            "model": "tts-1",
            "input": text,
            "voice": voice_id,
            "speed": speed,
            "response_format": "mp3",
        });

        let response = self
            .client
            .post(ENDPOINT)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| TtsError::ProviderApi(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(classify_http_error(status, text));
        }

        let audio_bytes = response.bytes().await.map_err(|e| TtsError::ProviderApi(e.to_string()))?.to_vec();
        let duration_ms = crate::audio::duration::calculate(&audio_bytes)?;

        Ok(SynthesisResult {
            audio_bytes,
            word_timings: None,
            sentence_timings: None,
            duration_ms,
        })
    }
}

fn classify_http_error(status: reqwest::StatusCode, body: String) -> TtsError {
    match status.as_u16() {
        401 | 403 => TtsError::ProviderAuth(body),
        429 => TtsError::ProviderRateLimit(body),
        _ => TtsError::ProviderApi(body),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_voice_list_has_six_entries() {
        assert_eq!(VOICES.len(), 6);
        assert!(VOICES.contains(&"alloy"));
        assert!(VOICES.contains(&"shimmer"));
    }

    #[test]
    fn classify_http_error_maps_403_to_auth() {
        assert!(matches!(
            classify_http_error(reqwest::StatusCode::FORBIDDEN, "nope".into()),
            TtsError::ProviderAuth(_)
        ));
    }

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

    #[test]
    fn runtime_overlay_written_after_construction_is_seen_live() {
        let runtime: crate::config::SharedRuntimeConfig =
            Arc::new(std::sync::RwLock::new(crate::config::RuntimeConfig::new()));
        let provider = OpenAiProvider::new(Arc::new(empty_settings()), runtime.clone());
        assert!(!provider.is_configured());

        runtime
            .write()
            .unwrap()
            .set_api_key(ProviderName::Openai, "sk-test".into());
        assert!(provider.is_configured());
        assert_eq!(provider.resolve_api_key(), Some("sk-test".to_string()));
    }
}
