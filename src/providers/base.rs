//! The capability contract every provider adapter implements.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::provider::{ProviderCapabilities, ProviderName, Voice};
use crate::models::synthesis::SynthesisResult;

#[async_trait]
pub trait TtsProvider: Send + Sync {
    fn provider_name(&self) -> ProviderName;

    fn display_name(&self) -> &'static str {
        self.provider_name().display_name()
    }

    /// Checks credential presence only. Never makes a network call.
    fn is_configured(&self) -> bool;

    /// A pure function of provider identity, independent of credential state.
    fn capabilities(&self) -> ProviderCapabilities;

    /// May block on a network call; the registry caches the result per
    /// provider after the first success.
    async fn list_voices(&self) -> Result<Vec<Voice>>;

    /// Synthesizes one chunk of text. `speed` is clamped into this
    /// provider's own `[min_speed, max_speed]` before use — callers must not
    /// pre-clamp. Returned timings are in the chunk's own coordinate frame
    /// (time zero at the start of this fragment, character zero at the
    /// start of this text).
    async fn synthesize(&self, text: &str, voice_id: &str, speed: f32) -> Result<SynthesisResult>;
}
