//! Amazon Polly REST adapter, signed by hand with AWS Signature Version 4.
//!
//! No AWS SDK crate is available, so requests are signed directly with
//! `sha2`/`hmac` and sent over `reqwest` against Polly's public REST
//! endpoint. Word timing comes from a separate `SpeechMarkTypes=["word"]`
//! call; because synthesis uses SSML (required for speed control via
//! `<prosody rate="...">`), Polly reports character offsets into the SSML
//! string rather than the plain input text, so the wrapper prefix length is
//! subtracted before timings are emitted. This does not account for Polly
//! re-escaping `&`/`<` inside the original text, which remains an open edge
//! case (see DESIGN.md).

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use hmac::{Hmac, Mac};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use sha2::{Digest, Sha256};

use crate::config::{is_provider_configured, Settings, SharedRuntimeConfig};
use crate::error::{Result, TtsError};
use crate::models::provider::{ProviderCapabilities, ProviderName, Voice};
use crate::models::synthesis::SynthesisResult;
use crate::models::timing::WordTiming;
use crate::providers::base::TtsProvider;

type HmacSha256 = Hmac<Sha256>;

pub struct AmazonProvider {
    client: Client,
    settings: Arc<Settings>,
    runtime: SharedRuntimeConfig,
}

impl AmazonProvider {
    /// `PUT /settings` carries a single `api_key` field; for Amazon that
    /// overlays the secret access key only. The access key id always comes
    /// from the base environment-loaded settings.
    pub fn new(settings: Arc<Settings>, runtime: SharedRuntimeConfig) -> Self {
        Self {
            client: Client::new(),
            settings,
            runtime,
        }
    }

    fn resolve_secret_access_key(&self) -> Option<String> {
        let runtime = self.runtime.read().expect("runtime config lock poisoned");
        runtime
            .api_key_override(ProviderName::Amazon)
            .map(str::to_string)
            .or_else(|| self.settings.aws_secret_access_key.clone())
    }

    fn clamp_speed(&self, speed: f32) -> f32 {
        speed.clamp(0.5, 2.0)
    }

    fn region(&self) -> &str {
        &self.settings.aws_region
    }

    fn host(&self) -> String {
        format!("polly.{}.amazonaws.com", self.region())
    }

    async fn signed_post(&self, path: &str, body: &serde_json::Value) -> Result<reqwest::Response> {
        let access_key = self
            .settings
            .aws_access_key_id
            .as_ref()
            .ok_or_else(|| TtsError::ProviderNotConfigured("amazon".into()))?;
        let secret_key = self
            .resolve_secret_access_key()
            .ok_or_else(|| TtsError::ProviderNotConfigured("amazon".into()))?;

        let payload = serde_json::to_vec(body).map_err(|e| TtsError::Internal(e.to_string()))?;
        let now = Utc::now();
        let host = self.host();
        let signed = sign_v4_request(
            access_key,
            &secret_key,
            self.region(),
            "POST",
            path,
            &host,
            &payload,
            now,
        );

        self.client
            .post(format!("https://{host}{path}"))
            .header("host", host.clone())
            .header("x-amz-date", signed.amz_date)
            .header("authorization", signed.authorization)
            .header("content-type", "application/x-amz-json-1.0")
            .body(payload)
            .send()
            .await
            .map_err(|e| TtsError::ProviderApi(e.to_string()))
    }
}

struct SignedRequest {
    authorization: String,
    amz_date: String,
}

#[allow(clippy::too_many_arguments)]
fn sign_v4_request(
    access_key: &str,
    secret_key: &str,
    region: &str,
    method: &str,
    path: &str,
    host: &str,
    payload: &[u8],
    now: chrono::DateTime<Utc>,
) -> SignedRequest {
    let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
    let date_stamp = now.format("%Y%m%d").to_string();
    let service = "polly";

    let payload_hash = hex_sha256(payload);
    let signed_headers = "content-type;host;x-amz-date";
    let canonical_headers = format!(
        "content-type:application/x-amz-json-1.0\nhost:{host}\nx-amz-date:{amz_date}\n"
    );
    let canonical_request = format!(
        "{method}\n{path}\n\n{canonical_headers}\n{signed_headers}\n{payload_hash}"
    );

    let credential_scope = format!("{date_stamp}/{region}/{service}/aws4_request");
    let string_to_sign = format!(
        "AWS4-HMAC-SHA256\n{amz_date}\n{credential_scope}\n{}",
        hex_sha256(canonical_request.as_bytes())
    );

    let k_date = hmac_sha256(format!("AWS4{secret_key}").as_bytes(), date_stamp.as_bytes());
    let k_region = hmac_sha256(&k_date, region.as_bytes());
    let k_service = hmac_sha256(&k_region, service.as_bytes());
    let k_signing = hmac_sha256(&k_service, b"aws4_request");
    let signature = hex::encode(hmac_sha256(&k_signing, string_to_sign.as_bytes()));

    let authorization = format!(
        "AWS4-HMAC-SHA256 Credential={access_key}/{credential_scope}, SignedHeaders={signed_headers}, Signature={signature}"
    );

    SignedRequest { authorization, amz_date }
}

fn hex_sha256(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts any key length");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

/// Minimal hex encoding, avoided pulling in a dedicated crate for it.
mod hex {
    pub fn encode(bytes: impl AsRef<[u8]>) -> String {
        bytes.as_ref().iter().map(|b| format!("{b:02x}")).collect()
    }
}

fn wrap_ssml(text: &str, speed: f32) -> String {
    let rate_pct = (speed * 100.0).round() as i32;
    format!("<speak><prosody rate=\"{rate_pct}%\">{}</prosody></speak>", escape_ssml(text))
}

fn escape_ssml(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

#[derive(Deserialize)]
struct SpeechMark {
    time: u64,
    #[serde(rename = "type")]
    mark_type: String,
    start: usize,
    end: usize,
    value: String,
}

#[derive(Deserialize)]
struct DescribeVoicesResponse {
    #[serde(rename = "Voices")]
    voices: Vec<PollyVoice>,
}

#[derive(Deserialize)]
struct PollyVoice {
    #[serde(rename = "Id")]
    id: String,
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "LanguageCode")]
    language_code: Option<String>,
    #[serde(rename = "Gender")]
    gender: Option<String>,
}

#[async_trait]
impl TtsProvider for AmazonProvider {
    fn provider_name(&self) -> ProviderName {
        ProviderName::Amazon
    }

    fn is_configured(&self) -> bool {
        let runtime = self.runtime.read().expect("runtime config lock poisoned");
        is_provider_configured(ProviderName::Amazon, &self.settings, &runtime)
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities {
            supports_speed_control: true,
            supports_word_timing: true,
            min_speed: 0.5,
            max_speed: 2.0,
            default_speed: 1.0,
            max_chunk_chars: 2800,
        }
    }

    async fn list_voices(&self) -> Result<Vec<Voice>> {
        let response = self.signed_post("/v1/voices", &json!({})).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(classify_http_error(status, response.text().await.unwrap_or_default()));
        }
        let body: DescribeVoicesResponse = response.json().await.map_err(|e| TtsError::ProviderApi(e.to_string()))?;
        Ok(body
            .voices
            .into_iter()
            .map(|v| Voice {
                voice_id: v.id,
                name: v.name,
                language_code: v.language_code,
                gender: v.gender,
            })
            .collect())
    }

    async fn synthesize(&self, text: &str, voice_id: &str, speed: f32) -> Result<SynthesisResult> {
        let speed = self.clamp_speed(speed);
        let ssml = wrap_ssml(text, speed);
        let ssml_prefix = ssml.find(text).unwrap_or(0);

        let audio_body = json!({
            "Text": ssml,
            "TextType": "ssml",
            "VoiceId": voice_id,
            "OutputFormat": "mp3",
        });
        let audio_response = self.signed_post("/v1/speech", &audio_body).await?;
        let audio_status = audio_response.status();
        if !audio_status.is_success() {
            return Err(classify_http_error(audio_status, audio_response.text().await.unwrap_or_default()));
        }
        let audio_bytes = audio_response.bytes().await.map_err(|e| TtsError::ProviderApi(e.to_string()))?.to_vec();
        let duration_ms = crate::audio::duration::calculate(&audio_bytes)?;

        let marks_body = json!({
            "Text": ssml,
            "TextType": "ssml",
            "VoiceId": voice_id,
            "OutputFormat": "json",
            "SpeechMarkTypes": ["word"],
        });
        let marks_response = self.signed_post("/v1/speech", &marks_body).await?;
        let marks_status = marks_response.status();
        if !marks_status.is_success() {
            return Err(classify_http_error(marks_status, marks_response.text().await.unwrap_or_default()));
        }
        let marks_text = marks_response.text().await.map_err(|e| TtsError::ProviderApi(e.to_string()))?;
        let word_timings = parse_speech_marks(&marks_text, ssml_prefix, duration_ms);

        Ok(SynthesisResult {
            audio_bytes,
            word_timings: Some(word_timings),
            sentence_timings: None,
            duration_ms,
        })
    }
}

/// Polly returns newline-delimited JSON objects for speech marks, each
/// giving only a word's *start* time. A word's `end_ms` is the next word's
/// `start_ms`; the last word's `end_ms` is the fragment's `duration_ms`.
fn parse_speech_marks(body: &str, ssml_prefix: usize, duration_ms: u64) -> Vec<WordTiming> {
    let marks: Vec<SpeechMark> = body
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| serde_json::from_str::<SpeechMark>(line).ok())
        .filter(|mark| mark.mark_type == "word")
        .collect();

    let mut out = Vec::with_capacity(marks.len());
    for (i, mark) in marks.iter().enumerate() {
        let end_ms = marks.get(i + 1).map(|next| next.time).unwrap_or(duration_ms);
        out.push(WordTiming {
            start_ms: mark.time,
            end_ms,
            start_char: mark.start.saturating_sub(ssml_prefix),
            end_char: mark.end.saturating_sub(ssml_prefix),
            text: mark.value.clone(),
        });
    }
    out
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
    fn wrap_ssml_embeds_prosody_rate() {
        let ssml = wrap_ssml("hello", 1.5);
        assert!(ssml.contains("rate=\"150%\""));
        assert!(ssml.contains("hello"));
    }

    #[test]
    fn ssml_prefix_points_at_original_text() {
        let text = "hello world";
        let ssml = wrap_ssml(text, 1.0);
        let prefix = ssml.find(text).unwrap();
        assert_eq!(&ssml[prefix..prefix + text.len()], text);
    }

    #[test]
    fn parse_speech_marks_subtracts_ssml_prefix() {
        let body = r#"{"time":120,"type":"word","start":30,"end":35,"value":"hello"}
{"time":260,"type":"word","start":36,"end":41,"value":"world"}"#;
        let words = parse_speech_marks(body, 30, 900);
        assert_eq!(words.len(), 2);
        assert_eq!(words[0].start_char, 0);
        assert_eq!(words[0].end_char, 5);
        assert_eq!(words[1].start_char, 6);
    }

    #[test]
    fn parse_speech_marks_derives_end_from_next_mark_and_duration() {
        let body = r#"{"time":120,"type":"word","start":30,"end":35,"value":"hello"}
{"time":260,"type":"word","start":36,"end":41,"value":"world"}"#;
        let words = parse_speech_marks(body, 30, 900);
        assert_eq!((words[0].start_ms, words[0].end_ms), (120, 260));
        assert_eq!((words[1].start_ms, words[1].end_ms), (260, 900));
    }

    #[test]
    fn sigv4_signature_is_deterministic_for_fixed_inputs() {
        let now = chrono::DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let a = sign_v4_request("AKIA", "secret", "us-east-1", "POST", "/v1/speech", "polly.us-east-1.amazonaws.com", b"{}", now);
        let b = sign_v4_request("AKIA", "secret", "us-east-1", "POST", "/v1/speech", "polly.us-east-1.amazonaws.com", b"{}", now);
        assert_eq!(a.authorization, b.authorization);
    }
}
