//! Provider identity and capability types, shared between the provider
//! registry, the job manager, and the HTTP surface.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderName {
    Google,
    Amazon,
    Elevenlabs,
    Openai,
}

impl ProviderName {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderName::Google => "google",
            ProviderName::Amazon => "amazon",
            ProviderName::Elevenlabs => "elevenlabs",
            ProviderName::Openai => "openai",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ProviderName::Google => "Google Cloud Text-to-Speech",
            ProviderName::Amazon => "Amazon Polly",
            ProviderName::Elevenlabs => "ElevenLabs",
            ProviderName::Openai => "OpenAI",
        }
    }

    pub fn all() -> [ProviderName; 4] {
        [
            ProviderName::Google,
            ProviderName::Amazon,
            ProviderName::Elevenlabs,
            ProviderName::Openai,
        ]
    }
}

impl std::str::FromStr for ProviderName {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "google" => Ok(ProviderName::Google),
            "amazon" => Ok(ProviderName::Amazon),
            "elevenlabs" => Ok(ProviderName::Elevenlabs),
            "openai" => Ok(ProviderName::Openai),
            _ => Err(()),
        }
    }
}

impl std::fmt::Display for ProviderName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Static, per-provider traits. A pure function of provider identity, never
/// of credential state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ProviderCapabilities {
    pub supports_speed_control: bool,
    pub supports_word_timing: bool,
    pub min_speed: f32,
    pub max_speed: f32,
    pub default_speed: f32,
    pub max_chunk_chars: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProviderInfo {
    pub name: ProviderName,
    pub display_name: String,
    pub capabilities: ProviderCapabilities,
    pub is_configured: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Voice {
    pub voice_id: String,
    pub name: String,
    pub language_code: Option<String>,
    pub gender: Option<String>,
}
