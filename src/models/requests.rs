//! Inbound request bodies for the HTTP surface.

use serde::Deserialize;

use crate::config::constants::MAX_TEXT_LENGTH;
use crate::models::provider::ProviderName;

fn default_speed() -> f32 {
    1.0
}

#[derive(Debug, Clone, Deserialize)]
pub struct VoicesRequest {
    pub provider: ProviderName,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenerateRequest {
    pub provider: ProviderName,
    pub voice_id: String,
    pub text: String,
    #[serde(default = "default_speed")]
    pub speed: f32,
}

impl GenerateRequest {
    /// Structural validation only (non-empty text within the length bound,
    /// speed within the protocol-wide range). Provider-specific speed
    /// clamping happens inside the provider itself, never here.
    pub fn validate(&self) -> Result<(), String> {
        if self.voice_id.trim().is_empty() {
            return Err("voice_id must not be empty".to_string());
        }
        if self.text.trim().is_empty() {
            return Err("text must not be empty".to_string());
        }
        if self.text.chars().count() > MAX_TEXT_LENGTH {
            return Err(format!("text must be at most {MAX_TEXT_LENGTH} characters"));
        }
        if !(0.25..=4.0).contains(&self.speed) {
            return Err("speed must be between 0.25 and 4.0".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateSettingsRequest {
    pub provider: ProviderName,
    pub api_key: String,
}

impl UpdateSettingsRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.api_key.trim().is_empty() {
            return Err("api_key must not be empty".to_string());
        }
        Ok(())
    }
}
