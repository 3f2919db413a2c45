//! Document-level timing types shared between the timing normalizer and the
//! HTTP layer.

use serde::{Deserialize, Serialize};

/// A single word's position in the final audio and in the original text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordTiming {
    pub text: String,
    pub start_ms: u64,
    pub end_ms: u64,
    pub start_char: usize,
    pub end_char: usize,
}

/// A single sentence's position in the final audio and in the original text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentenceTiming {
    pub text: String,
    pub start_ms: u64,
    pub end_ms: u64,
    pub start_char: usize,
    pub end_char: usize,
}

/// Document-wide timing, discriminated on which granularity is populated.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "timing_type", rename_all = "lowercase")]
pub enum TimingData {
    Word { words: Vec<WordTiming> },
    Sentence { sentences: Vec<SentenceTiming> },
}

impl TimingData {
    pub fn timing_type(&self) -> &'static str {
        match self {
            TimingData::Word { .. } => "word",
            TimingData::Sentence { .. } => "sentence",
        }
    }
}
