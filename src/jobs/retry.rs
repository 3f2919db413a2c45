//! Retries a single `synthesize` call on rate-limit responses only.

use std::sync::Arc;
use std::time::Duration;

use crate::error::{Result, TtsError};
use crate::models::synthesis::SynthesisResult;
use crate::providers::TtsProvider;

const MAX_RETRIES: u32 = 3;
const INITIAL_BACKOFF_SECONDS: f64 = 1.0;

/// Calls `provider.synthesize`, retrying up to `MAX_RETRIES` times (4 calls
/// total) on `ProviderRateLimit`, sleeping `1.0 * 2^attempt` seconds between
/// attempts. Any other error propagates immediately, unwrapped. Exhausted
/// retries re-raise the last rate-limit error.
pub async fn synthesize_with_retry(
    provider: &Arc<dyn TtsProvider>,
    text: &str,
    voice_id: &str,
    speed: f32,
) -> Result<SynthesisResult> {
    let mut attempt = 0;
    loop {
        match provider.synthesize(text, voice_id, speed).await {
            Ok(result) => return Ok(result),
            Err(TtsError::ProviderRateLimit(msg)) => {
                if attempt >= MAX_RETRIES {
                    return Err(TtsError::ProviderRateLimit(msg));
                }
                let backoff = INITIAL_BACKOFF_SECONDS * 2f64.powi(attempt as i32);
                tokio::time::sleep(Duration::from_secs_f64(backoff)).await;
                attempt += 1;
            }
            Err(other) => return Err(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::provider::{ProviderCapabilities, ProviderName, Voice};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct FlakyProvider {
        fails_before_success: u32,
        calls: AtomicU32,
    }

    #[async_trait]
    impl TtsProvider for FlakyProvider {
        fn provider_name(&self) -> ProviderName {
            ProviderName::Openai
        }
        fn is_configured(&self) -> bool {
            true
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
            Ok(vec![])
        }
        async fn synthesize(&self, _text: &str, _voice_id: &str, _speed: f32) -> Result<SynthesisResult> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.fails_before_success {
                Err(TtsError::ProviderRateLimit("throttled".into()))
            } else {
                Ok(SynthesisResult {
                    audio_bytes: vec![],
                    word_timings: None,
                    sentence_timings: None,
                    duration_ms: 0,
                })
            }
        }
    }

    struct AlwaysAuthError;

    #[async_trait]
    impl TtsProvider for AlwaysAuthError {
        fn provider_name(&self) -> ProviderName {
            ProviderName::Openai
        }
        fn is_configured(&self) -> bool {
            true
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
            Ok(vec![])
        }
        async fn synthesize(&self, _text: &str, _voice_id: &str, _speed: f32) -> Result<SynthesisResult> {
            Err(TtsError::ProviderAuth("bad key".into()))
        }
    }

    #[tokio::test]
    async fn retries_rate_limit_until_success() {
        let provider: Arc<dyn TtsProvider> = Arc::new(FlakyProvider {
            fails_before_success: 2,
            calls: AtomicU32::new(0),
        });
        let result = synthesize_with_retry(&provider, "hi", "voice", 1.0).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn exhausts_retries_and_reraises_rate_limit() {
        let provider: Arc<dyn TtsProvider> = Arc::new(FlakyProvider {
            fails_before_success: 10,
            calls: AtomicU32::new(0),
        });
        let result = synthesize_with_retry(&provider, "hi", "voice", 1.0).await;
        assert!(matches!(result, Err(TtsError::ProviderRateLimit(_))));
    }

    #[tokio::test]
    async fn non_rate_limit_errors_propagate_immediately() {
        let provider: Arc<dyn TtsProvider> = Arc::new(AlwaysAuthError);
        let result = synthesize_with_retry(&provider, "hi", "voice", 1.0).await;
        assert!(matches!(result, Err(TtsError::ProviderAuth(_))));
    }
}
