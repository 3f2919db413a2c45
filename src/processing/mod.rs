pub mod chunker;
pub mod timing;

pub use chunker::{TextChunk, TextChunker};
pub use timing::TimingNormalizer;
