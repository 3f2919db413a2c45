pub mod job;
pub mod provider;
pub mod requests;
pub mod responses;
pub mod synthesis;
pub mod timing;

pub use job::{GenerationStatus, Job};
pub use provider::{ProviderCapabilities, ProviderInfo, ProviderName, Voice};
pub use requests::{GenerateRequest, UpdateSettingsRequest, VoicesRequest};
pub use responses::{
    AudioMetadataResponse, GenerateResponse, HealthDependencies, HealthResponse, JobStatusResponse,
    ProviderKeyStatus, ProvidersResponse, SettingsResponse, UpdateSettingsResponse, VoicesResponse,
};
pub use synthesis::SynthesisResult;
pub use timing::{SentenceTiming, TimingData, WordTiming};
