use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use lazy_static::lazy_static;
use regex::Regex;
use std::fmt;

lazy_static! {
    static ref TOKEN_PATTERN: Regex = Regex::new(r"[A-Za-z0-9_-]{20,}").unwrap();
    static ref URL_PATTERN: Regex = Regex::new(r"https?://\S+").unwrap();
}

/// Redacts long alphanumeric runs (likely API keys or tokens) and URLs from
/// a provider error message before it reaches a job record, an HTTP
/// response, or a log line.
pub fn sanitize(message: &str) -> String {
    let without_tokens = TOKEN_PATTERN.replace_all(message, "[REDACTED]");
    URL_PATTERN.replace_all(&without_tokens, "[URL REDACTED]").into_owned()
}

#[derive(Debug)]
pub enum TtsError {
    Validation(String),
    InvalidProvider(String),
    ProviderNotConfigured(String),
    ProviderAuth(String),
    ProviderApi(String),
    ProviderRateLimit(String),
    JobNotFound(String),
    JobNotCompleted(String),
    AudioProcessing(String),
    Io(std::io::Error),
    Internal(String),
}

impl fmt::Display for TtsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TtsError::Validation(msg) => write!(f, "{}", msg),
            TtsError::InvalidProvider(msg) => write!(f, "{}", msg),
            TtsError::ProviderNotConfigured(msg) => write!(f, "{}", msg),
            TtsError::ProviderAuth(msg) => write!(f, "{}", msg),
            TtsError::ProviderApi(msg) => write!(f, "{}", msg),
            TtsError::ProviderRateLimit(msg) => write!(f, "{}", msg),
            TtsError::JobNotFound(msg) => write!(f, "{}", msg),
            TtsError::JobNotCompleted(msg) => write!(f, "{}", msg),
            TtsError::AudioProcessing(msg) => write!(f, "{}", msg),
            TtsError::Io(err) => write!(f, "I/O error: {}", err),
            TtsError::Internal(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for TtsError {}

impl TtsError {
    /// The stable machine-readable code carried in the error envelope.
    pub fn error_code(&self) -> &'static str {
        match self {
            TtsError::Validation(_) => "VALIDATION_ERROR",
            TtsError::InvalidProvider(_) => "INVALID_PROVIDER",
            TtsError::ProviderNotConfigured(_) => "PROVIDER_NOT_CONFIGURED",
            TtsError::ProviderAuth(_) => "PROVIDER_AUTH_ERROR",
            TtsError::ProviderApi(_) => "PROVIDER_API_ERROR",
            TtsError::ProviderRateLimit(_) => "PROVIDER_RATE_LIMIT",
            TtsError::JobNotFound(_) => "JOB_NOT_FOUND",
            TtsError::JobNotCompleted(_) => "JOB_NOT_COMPLETED",
            TtsError::AudioProcessing(_) => "AUDIO_PROCESSING_ERROR",
            TtsError::Io(_) | TtsError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            TtsError::Validation(_) | TtsError::InvalidProvider(_) | TtsError::ProviderNotConfigured(_) => {
                StatusCode::BAD_REQUEST
            }
            TtsError::ProviderAuth(_) | TtsError::ProviderApi(_) => StatusCode::BAD_GATEWAY,
            TtsError::ProviderRateLimit(_) => StatusCode::TOO_MANY_REQUESTS,
            TtsError::JobNotFound(_) => StatusCode::NOT_FOUND,
            TtsError::JobNotCompleted(_) => StatusCode::CONFLICT,
            TtsError::AudioProcessing(_) | TtsError::Io(_) | TtsError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// The message safe to place in a job's `error_message`, an HTTP
    /// response, or a log record.
    pub fn sanitized_message(&self) -> String {
        sanitize(&self.to_string())
    }
}

impl From<std::io::Error> for TtsError {
    fn from(err: std::io::Error) -> Self {
        TtsError::Io(err)
    }
}

impl From<serde_json::Error> for TtsError {
    fn from(err: serde_json::Error) -> Self {
        TtsError::Internal(err.to_string())
    }
}

impl From<reqwest::Error> for TtsError {
    fn from(err: reqwest::Error) -> Self {
        TtsError::ProviderApi(err.to_string())
    }
}

impl From<tokio::task::JoinError> for TtsError {
    fn from(err: tokio::task::JoinError) -> Self {
        TtsError::Internal(format!("background task failed: {}", err))
    }
}

impl IntoResponse for TtsError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_code = self.error_code();
        let message = self.sanitized_message();

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error_code, message = %message, "request failed");
        }

        (
            status,
            axum::Json(serde_json::json!({
                "error_code": error_code,
                "message": message,
                "details": serde_json::Value::Null,
            })),
        )
            .into_response()
    }
}

pub type Result<T> = std::result::Result<T, TtsError>;
