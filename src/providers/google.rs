//! Google Cloud Text-to-Speech REST adapter.
//!
//! Word timing comes from Google's timepointing feature: the input text is
//! wrapped in SSML with a `<mark>` tag inserted before every word, and the
//! returned timepoints are matched back to those marks in order.

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

const ENDPOINT: &str = "https://texttospeech.googleapis.com/v1/text:synthesize";
const VOICES_ENDPOINT: &str = "https://texttospeech.googleapis.com/v1/voices";

pub struct GoogleProvider {
    client: Client,
    settings: Arc<Settings>,
    runtime: SharedRuntimeConfig,
}

impl GoogleProvider {
    pub fn new(settings: Arc<Settings>, runtime: SharedRuntimeConfig) -> Self {
        Self {
            client: Client::new(),
            settings,
            runtime,
        }
    }

    /// Resolved at call time so a `PUT /settings` write is picked up by the
    /// very next request, not just at process startup.
    fn resolve_api_key(&self) -> Option<String> {
        let runtime = self.runtime.read().expect("runtime config lock poisoned");
        runtime
            .api_key_override(ProviderName::Google)
            .map(str::to_string)
            .or_else(|| self.settings.google_api_key.clone())
    }

    fn clamp_speed(&self, speed: f32) -> f32 {
        speed.clamp(0.25, 4.0)
    }
}

fn wrap_ssml_with_marks(text: &str) -> (String, Vec<String>) {
    let mut marks = Vec::new();
    let mut ssml = String::from("<speak>");
    for (i, word) in text.split_whitespace().enumerate() {
        let mark = format!("w{i}");
        ssml.push_str(&format!("<mark name=\"{mark}\"/>{}", escape_ssml(word)));
        ssml.push(' ');
        marks.push(mark);
    }
    ssml.push_str("</speak>");
    (ssml, marks)
}

fn escape_ssml(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

#[derive(Deserialize)]
struct SynthesizeResponse {
    #[serde(rename = "audioContent")]
    audio_content: String,
    #[serde(default, rename = "timepoints")]
    timepoints: Vec<Timepoint>,
}

#[derive(Deserialize)]
struct Timepoint {
    #[serde(rename = "markName")]
    mark_name: String,
    #[serde(rename = "timeSeconds")]
    time_seconds: f64,
}

#[derive(Deserialize)]
struct VoicesResponse {
    voices: Vec<GoogleVoice>,
}

#[derive(Deserialize)]
struct GoogleVoice {
    name: String,
    #[serde(rename = "languageCodes")]
    language_codes: Vec<String>,
    #[serde(rename = "ssmlGender")]
    ssml_gender: Option<String>,
}

#[async_trait]
impl TtsProvider for GoogleProvider {
    fn provider_name(&self) -> ProviderName {
        ProviderName::Google
    }

    fn is_configured(&self) -> bool {
        let runtime = self.runtime.read().expect("runtime config lock poisoned");
        is_provider_configured(ProviderName::Google, &self.settings, &runtime)
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities {
            supports_speed_control: true,
            supports_word_timing: true,
            min_speed: 0.25,
            max_speed: 4.0,
            default_speed: 1.0,
            max_chunk_chars: 4500,
        }
    }

    async fn list_voices(&self) -> Result<Vec<Voice>> {
        let api_key = self
            .resolve_api_key()
            .ok_or_else(|| TtsError::ProviderNotConfigured("google".into()))?;

        let response = self
            .client
            .get(VOICES_ENDPOINT)
            .query(&[("key", api_key.as_str())])
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
                voice_id: v.name,
                name: v.language_codes.first().cloned().unwrap_or_default(),
                language_code: v.language_codes.into_iter().next(),
                gender: v.ssml_gender,
            })
            .collect())
    }

    async fn synthesize(&self, text: &str, voice_id: &str, speed: f32) -> Result<SynthesisResult> {
        let api_key = self
            .resolve_api_key()
            .ok_or_else(|| TtsError::ProviderNotConfigured("google".into()))?;
        let speed = self.clamp_speed(speed);

        let (ssml, marks) = wrap_ssml_with_marks(text);
        let body = json!({
            "input": { "ssml": ssml },
            "voice": { "name": voice_id, "languageCode": language_code_from_voice(voice_id) },
            "audioConfig": { "audioEncoding": "MP3", "speakingRate": speed, "sampleRateHertz": 24000 },
            "enableTimePointing": ["SSML_MARK"],
        });

        let response = self
            .client
            .post(ENDPOINT)
            .query(&[("key", api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| TtsError::ProviderApi(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(classify_http_error(status, response.text().await.unwrap_or_default()));
        }

        let parsed: SynthesizeResponse = response.json().await.map_err(|e| TtsError::ProviderApi(e.to_string()))?;
        let audio_bytes = BASE64
            .decode(&parsed.audio_content)
            .map_err(|e| TtsError::ProviderApi(format!("invalid base64 audio: {e}")))?;
        let duration_ms = crate::audio::duration::calculate(&audio_bytes)?;

        let word_timings = build_word_timings(text, &marks, &parsed.timepoints, duration_ms);

        Ok(SynthesisResult {
            audio_bytes,
            word_timings: Some(word_timings),
            sentence_timings: None,
            duration_ms,
        })
    }
}

fn language_code_from_voice(voice_id: &str) -> String {
    voice_id.splitn(3, '-').take(2).collect::<Vec<_>>().join("-")
}

fn build_word_timings(
    text: &str,
    marks: &[String],
    timepoints: &[Timepoint],
    duration_ms: u64,
) -> Vec<WordTiming> {
    let mark_times: std::collections::HashMap<&str, f64> = timepoints
        .iter()
        .map(|tp| (tp.mark_name.as_str(), tp.time_seconds))
        .collect();

    let words: Vec<(&str, usize, usize)> = word_char_spans(text);
    let mut out = Vec::with_capacity(words.len());
    for (i, (word, start_char, end_char)) in words.iter().enumerate() {
        let start_ms = marks
            .get(i)
            .and_then(|m| mark_times.get(m.as_str()))
            .map(|s| (*s * 1000.0) as u64)
            .unwrap_or(0);
        let end_ms = marks
            .get(i + 1)
            .and_then(|m| mark_times.get(m.as_str()))
            .map(|s| (*s * 1000.0) as u64)
            .unwrap_or(duration_ms);
        out.push(WordTiming {
            text: (*word).to_string(),
            start_ms,
            end_ms,
            start_char: *start_char,
            end_char: *end_char,
        });
    }
    out
}

fn word_char_spans(text: &str) -> Vec<(&str, usize, usize)> {
    let mut spans = Vec::new();
    let mut char_idx = 0;
    for word in text.split(' ') {
        let start = char_idx;
        let end = start + word.chars().count();
        if !word.is_empty() {
            spans.push((word, start, end));
        }
        char_idx = end + 1;
    }
    spans
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
    fn wrap_ssml_with_marks_inserts_one_mark_per_word() {
        let (ssml, marks) = wrap_ssml_with_marks("hello world");
        assert_eq!(marks, vec!["w0", "w1"]);
        assert!(ssml.contains("<mark name=\"w0\"/>hello"));
        assert!(ssml.contains("<mark name=\"w1\"/>world"));
    }

    #[test]
    fn escape_ssml_escapes_reserved_characters() {
        assert_eq!(escape_ssml("A & B < C > D"), "A &amp; B &lt; C &gt; D");
    }

    #[test]
    fn word_char_spans_match_original_text_offsets() {
        let text = "one two three";
        let spans = word_char_spans(text);
        assert_eq!(spans, vec![("one", 0, 3), ("two", 4, 7), ("three", 8, 13)]);
    }

    #[test]
    fn classify_http_error_maps_401_to_auth() {
        assert!(matches!(
            classify_http_error(reqwest::StatusCode::UNAUTHORIZED, "bad key".into()),
            TtsError::ProviderAuth(_)
        ));
    }

    #[test]
    fn classify_http_error_maps_429_to_rate_limit() {
        assert!(matches!(
            classify_http_error(reqwest::StatusCode::TOO_MANY_REQUESTS, "slow down".into()),
            TtsError::ProviderRateLimit(_)
        ));
    }
}
