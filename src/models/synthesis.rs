//! Per-chunk synthesis output, produced by a provider adapter before the
//! timing normalizer and audio stitcher see it.

use crate::models::timing::{SentenceTiming, WordTiming};

/// The result of synthesizing a single chunk of text with one provider.
///
/// Timings, when present, are relative to the chunk's own audio (time
/// origin 0) and the chunk's own text (character origin 0) — the timing
/// normalizer is responsible for shifting them onto the document-wide axes.
#[derive(Debug, Clone)]
pub struct SynthesisResult {
    pub audio_bytes: Vec<u8>,
    pub word_timings: Option<Vec<WordTiming>>,
    pub sentence_timings: Option<Vec<SentenceTiming>>,
    pub duration_ms: u64,
}

impl SynthesisResult {
    pub fn has_word_timings(&self) -> bool {
        matches!(&self.word_timings, Some(w) if !w.is_empty())
    }

    pub fn has_sentence_timings(&self) -> bool {
        matches!(&self.sentence_timings, Some(s) if !s.is_empty())
    }
}
