//! Converts per-chunk provider timing into document-level timing, by
//! merging word or sentence timings across chunks, or by estimating
//! sentence boundaries proportionally when no provider timing exists.

use crate::error::{Result, TtsError};
use crate::models::synthesis::SynthesisResult;
use crate::models::timing::{SentenceTiming, TimingData, WordTiming};
use crate::processing::chunker::TextChunk;

#[derive(Debug, Default, Clone, Copy)]
pub struct TimingNormalizer;

impl TimingNormalizer {
    pub fn new() -> Self {
        Self
    }

    /// Picks word merge, sentence merge, or sentence estimation, in that
    /// priority order, falling back to estimation if a merge fails.
    ///
    /// `stitched_duration_ms` must be the *actual* re-encoded duration of
    /// the final stitched MP3 (from the audio stitcher), not the sum of
    /// per-chunk durations — the estimation fallback forces its last
    /// sentence to end exactly there, so any drift from the real audio
    /// length would leave the final highlight short of (or past) the
    /// audio's actual end.
    pub fn normalize(
        &self,
        chunks: &[TextChunk],
        results: &[SynthesisResult],
        silence_between_ms: u64,
        original_text: &str,
        stitched_duration_ms: u64,
    ) -> TimingData {
        if results.iter().any(SynthesisResult::has_word_timings) {
            if let Ok(data) = self.merge_word_timings(chunks, results, silence_between_ms) {
                return data;
            }
        } else if results.iter().any(SynthesisResult::has_sentence_timings) {
            if let Ok(data) = self.merge_sentence_timings(chunks, results, silence_between_ms) {
                return data;
            }
        }
        self.estimate_sentence_timings(original_text, stitched_duration_ms)
    }

    pub fn merge_word_timings(
        &self,
        chunks: &[TextChunk],
        results: &[SynthesisResult],
        silence_between_ms: u64,
    ) -> Result<TimingData> {
        if chunks.len() != results.len() {
            return Err(TtsError::Internal(
                "chunk and result counts must match for timing merge".into(),
            ));
        }
        let mut words = Vec::new();
        let mut cumulative_time_ms: u64 = 0;
        let last = chunks.len().saturating_sub(1);
        for (i, (chunk, result)) in chunks.iter().zip(results.iter()).enumerate() {
            if let Some(chunk_words) = &result.word_timings {
                for w in chunk_words {
                    words.push(WordTiming {
                        text: w.text.clone(),
                        start_ms: w.start_ms + cumulative_time_ms,
                        end_ms: w.end_ms + cumulative_time_ms,
                        start_char: w.start_char + chunk.start_char,
                        end_char: w.end_char + chunk.start_char,
                    });
                }
            }
            cumulative_time_ms += result.duration_ms;
            if i != last {
                cumulative_time_ms += silence_between_ms;
            }
        }
        Ok(TimingData::Word { words })
    }

    pub fn merge_sentence_timings(
        &self,
        chunks: &[TextChunk],
        results: &[SynthesisResult],
        silence_between_ms: u64,
    ) -> Result<TimingData> {
        if chunks.len() != results.len() {
            return Err(TtsError::Internal(
                "chunk and result counts must match for timing merge".into(),
            ));
        }
        let mut sentences = Vec::new();
        let mut cumulative_time_ms: u64 = 0;
        let last = chunks.len().saturating_sub(1);
        for (i, (chunk, result)) in chunks.iter().zip(results.iter()).enumerate() {
            if let Some(chunk_sentences) = &result.sentence_timings {
                for s in chunk_sentences {
                    sentences.push(SentenceTiming {
                        text: s.text.clone(),
                        start_ms: s.start_ms + cumulative_time_ms,
                        end_ms: s.end_ms + cumulative_time_ms,
                        start_char: s.start_char + chunk.start_char,
                        end_char: s.end_char + chunk.start_char,
                    });
                }
            }
            cumulative_time_ms += result.duration_ms;
            if i != last {
                cumulative_time_ms += silence_between_ms;
            }
        }
        Ok(TimingData::Sentence { sentences })
    }

    /// Distributes `total_duration_ms` across sentence boundaries found in
    /// `original_text`, proportionally to each sentence's character length.
    /// The last sentence's `end_ms` is forced to `total_duration_ms` exactly.
    pub fn estimate_sentence_timings(&self, original_text: &str, total_duration_ms: u64) -> TimingData {
        let chars: Vec<char> = original_text.chars().collect();
        let bounds = split_into_sentences(&chars);
        if bounds.is_empty() {
            return TimingData::Sentence { sentences: Vec::new() };
        }

        let total_chars: usize = bounds.iter().map(|(s, e)| e - s).sum();
        let n = bounds.len();
        let mut sentences = Vec::with_capacity(n);
        let mut cursor_ms: u64 = 0;

        for (idx, (s, e)) in bounds.iter().enumerate() {
            let len = e - s;
            let text: String = chars[*s..*e].iter().collect();
            let is_last = idx == n - 1;
            let end_ms = if is_last {
                total_duration_ms
            } else if total_chars == 0 {
                cursor_ms
            } else {
                cursor_ms + (total_duration_ms as u128 * len as u128 / total_chars as u128) as u64
            };
            sentences.push(SentenceTiming {
                text,
                start_ms: cursor_ms,
                end_ms,
                start_char: *s,
                end_char: *e,
            });
            cursor_ms = end_ms;
        }

        TimingData::Sentence { sentences }
    }
}

/// Splits text into sentences on a run of whitespace immediately following
/// `.`, `!`, or `?`, equivalent to the regex `(?<=[.!?])\s+` but without
/// relying on lookbehind. Returns half-open `[start, end)` char ranges.
fn split_into_sentences(chars: &[char]) -> Vec<(usize, usize)> {
    let mut bounds = Vec::new();
    let mut start = 0;
    let mut i = 0;
    while i < chars.len() {
        if matches!(chars[i], '.' | '!' | '?') {
            let punct_end = i + 1;
            let mut j = punct_end;
            while j < chars.len() && chars[j].is_whitespace() {
                j += 1;
            }
            if j > punct_end {
                bounds.push((start, punct_end));
                start = j;
                i = j;
                continue;
            }
        }
        i += 1;
    }
    if start < chars.len() {
        bounds.push((start, chars.len()));
    }
    bounds
}
