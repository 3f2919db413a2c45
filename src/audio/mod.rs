pub mod duration;
pub mod stitcher;
pub mod store;

pub use stitcher::{get_duration_ms, AudioStitcher, StitchResult};
pub use store::AudioStore;
