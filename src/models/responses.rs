//! Outbound response bodies for the HTTP surface.

use serde::Serialize;

use crate::models::provider::{ProviderInfo, Voice};
use crate::models::timing::TimingData;

#[derive(Debug, Serialize)]
pub struct ProvidersResponse {
    pub providers: Vec<ProviderInfo>,
}

#[derive(Debug, Serialize)]
pub struct VoicesResponse {
    pub provider: String,
    pub voices: Vec<Voice>,
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub job_id: String,
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct JobStatusResponse {
    pub job_id: String,
    pub status: String,
    pub progress: f32,
    pub total_chunks: usize,
    pub completed_chunks: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AudioMetadataResponse {
    pub job_id: String,
    pub duration_ms: u64,
    pub size_bytes: u64,
    pub timing_data: TimingData,
}

#[derive(Debug, Serialize)]
pub struct ProviderKeyStatus {
    pub provider: String,
    pub is_configured: bool,
}

#[derive(Debug, Serialize)]
pub struct SettingsResponse {
    pub providers: Vec<ProviderKeyStatus>,
}

#[derive(Debug, Serialize)]
pub struct UpdateSettingsResponse {
    pub provider: String,
    pub is_configured: bool,
}

#[derive(Debug, Serialize)]
pub struct HealthDependencies {
    pub ffmpeg: bool,
    pub codec: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub dependencies: HealthDependencies,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_status_response_omits_error_message_when_absent() {
        let response = JobStatusResponse {
            job_id: "abc".into(),
            status: "in_progress".into(),
            progress: 0.5,
            total_chunks: 4,
            completed_chunks: 2,
            error_message: None,
        };
        let json = serde_json::to_value(&response).unwrap();
        assert!(!json.as_object().unwrap().contains_key("error_message"));
    }

    #[test]
    fn settings_response_never_carries_key_material() {
        let response = SettingsResponse {
            providers: vec![ProviderKeyStatus {
                provider: "openai".into(),
                is_configured: true,
            }],
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(!json.contains("api_key"));
        assert!(!json.contains("sk-"));
    }

    #[test]
    fn health_response_reports_in_process_codec() {
        let response = HealthResponse {
            status: "ok".into(),
            version: "0.1.0".into(),
            dependencies: HealthDependencies {
                ffmpeg: true,
                codec: "in-process".into(),
            },
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"ffmpeg\":true"));
        assert!(json.contains("in-process"));
    }
}
