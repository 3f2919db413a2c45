//! ElevenLabs REST adapter.
//!
//! Word timing is derived from character-level alignment: ElevenLabs
//! returns a per-character start/end time array, which is grouped into
//! words on whitespace boundaries.

use std::sync::Arc;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use crate::config::{is_provider_configured, Settings, SharedRuntimeConfig};
use crate::error::{Result, TtsError};
use crate::models::provider::{ProviderCapabilities, ProviderName, Voice};
use crate::models::synthesis::SynthesisResult;
use crate::models::timing::WordTiming;
use crate::providers::base::TtsProvider;

const API_BASE: &str = "https://api.elevenlabs.io/v1";

pub struct ElevenLabsProvider {
    client: Client,
    settings: Arc<Settings>,
    runtime: SharedRuntimeConfig,
}

impl ElevenLabsProvider {
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
            .api_key_override(ProviderName::Elevenlabs)
            .map(str::to_string)
            .or_else(|| self.settings.elevenlabs_api_key.clone())
    }

    fn clamp_speed(&self, speed: f32) -> f32 {
        speed.clamp(0.7, 1.2)
    }
}

#[derive(Deserialize)]
struct WithTimestampsResponse {
    audio_base64: String,
    alignment: Alignment,
}

#[derive(Deserialize)]
struct Alignment {
    characters: Vec<String>,
    character_start_times_seconds: Vec<f64>,
    character_end_times_seconds: Vec<f64>,
}

#[derive(Deserialize)]
struct ElevenLabsVoice {
    voice_id: String,
    name: String,
    labels: Option<std::collections::HashMap<String, String>>,
}

#[derive(Deserialize)]
struct VoicesResponse {
    voices: Vec<ElevenLabsVoice>,
}

#[async_trait]
impl TtsProvider for ElevenLabsProvider {
    fn provider_name(&self) -> ProviderName {
        ProviderName::Elevenlabs
    }

    fn is_configured(&self) -> bool {
        let runtime = self.runtime.read().expect("runtime config lock poisoned");
        is_provider_configured(ProviderName::Elevenlabs, &self.settings, &runtime)
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities {
            supports_speed_control: true,
            supports_word_timing: true,
            min_speed: 0.7,
            max_speed: 1.2,
            default_speed: 1.0,
            max_chunk_chars: 4500,
        }
    }

    async fn list_voices(&self) -> Result<Vec<Voice>> {
        let api_key = self
            .resolve_api_key()
            .ok_or_else(|| TtsError::ProviderNotConfigured("elevenlabs".into()))?;

        let response = self
            .client
            .get(format!("{API_BASE}/voices"))
            .header("xi-api-key", &api_key)
            .send()
            .await
            .map_err(|e| TtsError::ProviderApi(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(classify_http_error(status, response.text().await.unwrap_or_default()));
        }

        let body: VoicesResponse = response.json().await.map_err(|e| TtsError::ProviderApi(e.to_string()))?;
        Ok(body
            .voices
            .into_iter()
            .map(|v| Voice {
                voice_id: v.voice_id,
                name: v.name,
                language_code: None,
                gender: v.labels.and_then(|l| l.get("gender").cloned()),
            })
            .collect())
    }

    async fn synthesize(&self, text: &str, voice_id: &str, speed: f32) -> Result<SynthesisResult> {
        let api_key = self
            .resolve_api_key()
            .ok_or_else(|| TtsError::ProviderNotConfigured("elevenlabs".into()))?;
        let speed = self.clamp_speed(speed);

        let body = json!({
            "text": text,
            "model_id": "eleven_multilingual_v2",
            "voice_settings": { "speed": speed, "stability": 0.5, "similarity_boost": 0.75 },
        });

        let response = self
            .client
            .post(format!("{API_BASE}/text-to-speech/{voice_id}/with-timestamps"))
            .header("xi-api-key", &api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| TtsError::ProviderApi(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(classify_http_error(status, response.text().await.unwrap_or_default()));
        }

        let parsed: WithTimestampsResponse = response.json().await.map_err(|e| TtsError::ProviderApi(e.to_string()))?;
        let audio_bytes = BASE64
            .decode(&parsed.audio_base64)
            .map_err(|e| TtsError::ProviderApi(format!("invalid base64 audio: {e}")))?;
        let duration_ms = crate::audio::duration::calculate(&audio_bytes)?;

        let word_timings = group_characters_into_words(&parsed.alignment);

        Ok(SynthesisResult {
            audio_bytes,
            word_timings: Some(word_timings),
            sentence_timings: None,
            duration_ms,
        })
    }
}

/// Groups a flat per-character alignment into word-level timings, splitting
/// on whitespace characters. Character offsets are relative to the chunk
/// text (origin 0), as the contract requires.
fn group_characters_into_words(alignment: &Alignment) -> Vec<WordTiming> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut word_start_char = 0usize;
    let mut word_start_ms = 0u64;

    for (i, ch) in alignment.characters.iter().enumerate() {
        let is_whitespace = ch.chars().all(char::is_whitespace) && !ch.is_empty();
        if is_whitespace {
            if !current.is_empty() {
                let end_ms = (alignment.character_end_times_seconds[i - 1] * 1000.0) as u64;
                words.push(WordTiming {
                    text: std::mem::take(&mut current),
                    start_ms: word_start_ms,
                    end_ms,
                    start_char: word_start_char,
                    end_char: i,
                });
            }
            continue;
        }
        if current.is_empty() {
            word_start_char = i;
            word_start_ms = (alignment.character_start_times_seconds[i] * 1000.0) as u64;
        }
        current.push_str(ch);
    }
    if !current.is_empty() {
        let last = alignment.characters.len() - 1;
        let end_ms = (alignment.character_end_times_seconds[last] * 1000.0) as u64;
        words.push(WordTiming {
            text: current,
            start_ms: word_start_ms,
            end_ms,
            start_char: word_start_char,
            end_char: alignment.characters.len(),
        });
    }
    words
}

fn classify_http_error(status: reqwest::StatusCode, body: String) -> TtsError {
    match status.as_u16() {
        401 | 403 => TtsError::ProviderAuth(body),
        429 => TtsError::ProviderRateLimit(body),
        _ => TtsError::ProviderApi(body),
    }
}
