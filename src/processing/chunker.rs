//! Splits long-form text into provider-sized chunks without breaking words,
//! preferring paragraph, then sentence, then word boundaries.

use crate::error::{Result, TtsError};

/// A chunk of text together with its position in the original document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChunk {
    pub text: String,
    pub start_char: usize,
    pub end_char: usize,
    pub chunk_index: usize,
    pub total_chunks: usize,
}

const SENTENCE_PATTERNS: [&[char]; 6] = [
    &['.', ' '],
    &['!', ' '],
    &['?', ' '],
    &['.', '\n'],
    &['!', '\n'],
    &['?', '\n'],
];

/// Splits text into chunks of at most `max_chars` characters each.
///
/// Splitting rules in priority order: never split mid-word; prefer a
/// paragraph boundary (`\n\n`); then a sentence boundary (`. `, `! `, `? `
/// or their newline variants); then the nearest preceding space; and only
/// as a last resort, a hard split at `max_chars`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TextChunker;

impl TextChunker {
    pub fn new() -> Self {
        Self
    }

    pub fn chunk(&self, text: &str, max_chars: usize) -> Result<Vec<TextChunk>> {
        if max_chars < 1 {
            return Err(TtsError::Validation("max_chars must be at least 1".into()));
        }

        let chars: Vec<char> = text.chars().collect();
        let (strip_start, strip_end) = match trimmed_bounds(&chars, 0, chars.len()) {
            Some(bounds) => bounds,
            None => {
                return Err(TtsError::Validation(
                    "Text cannot be empty or whitespace-only".into(),
                ))
            }
        };

        if strip_end - strip_start <= max_chars {
            let text: String = chars[strip_start..strip_end].iter().collect();
            return Ok(vec![TextChunk {
                end_char: strip_start + text.chars().count(),
                text,
                start_char: strip_start,
                chunk_index: 0,
                total_chunks: 1,
            }]);
        }

        let mut chunks = Vec::new();
        let mut remaining_start = strip_start;

        while remaining_start < strip_end {
            while remaining_start < strip_end && chars[remaining_start].is_whitespace() {
                remaining_start += 1;
            }
            if remaining_start >= strip_end {
                break;
            }

            let remaining_len = strip_end - remaining_start;

            if remaining_len <= max_chars {
                let (t_start, t_end) = trimmed_bounds(&chars, remaining_start, strip_end)
                    .unwrap_or((remaining_start, remaining_start));
                push_chunk(&mut chunks, &chars, t_start, t_end, remaining_start);
                break;
            }

            let split_pos = find_split_point(&chars, remaining_start, max_chars);
            let (t_start, t_end) =
                trimmed_bounds(&chars, remaining_start, split_pos).unwrap_or((remaining_start, remaining_start));
            push_chunk(&mut chunks, &chars, t_start, t_end, remaining_start);

            remaining_start = split_pos;
        }

        let total = chunks.len();
        for c in chunks.iter_mut() {
            c.total_chunks = total;
        }

        Ok(chunks)
    }
}

fn push_chunk(
    chunks: &mut Vec<TextChunk>,
    chars: &[char],
    t_start: usize,
    t_end: usize,
    offset: usize,
) {
    let text: String = chars[t_start..t_end].iter().collect();
    let len = text.chars().count();
    chunks.push(TextChunk {
        text,
        start_char: offset,
        end_char: offset + len,
        chunk_index: chunks.len(),
        total_chunks: 0,
    });
}

/// Returns the bounds of `chars[start..end]` with leading/trailing
/// whitespace removed, or `None` if the range is entirely whitespace.
fn trimmed_bounds(chars: &[char], start: usize, end: usize) -> Option<(usize, usize)> {
    let mut lo = start;
    while lo < end && chars[lo].is_whitespace() {
        lo += 1;
    }
    if lo >= end {
        return None;
    }
    let mut hi = end;
    while hi > lo && chars[hi - 1].is_whitespace() {
        hi -= 1;
    }
    Some((lo, hi))
}

/// Finds the best split point within `chars[start..]`, searching only the
/// first `max_chars` characters of that window. Returns an absolute index.
fn find_split_point(chars: &[char], start: usize, max_chars: usize) -> usize {
    let candidate_len = max_chars.min(chars.len() - start);
    let candidate = &chars[start..start + candidate_len];
    let min_pos = (max_chars as f64 * 0.3) as usize;

    if let Some(pos) = rfind_pattern(candidate, &['\n', '\n']) {
        if pos > min_pos {
            return start + pos + 2;
        }
    }

    let mut best_sentence_pos: Option<usize> = None;
    for pattern in SENTENCE_PATTERNS {
        if let Some(pos) = rfind_pattern(candidate, pattern) {
            if pos > min_pos {
                let candidate_pos = pos + pattern.len();
                if best_sentence_pos.map_or(true, |best| candidate_pos > best) {
                    best_sentence_pos = Some(candidate_pos);
                }
            }
        }
    }
    if let Some(pos) = best_sentence_pos {
        if pos > min_pos {
            return start + pos;
        }
    }

    if let Some(pos) = rfind_pattern(candidate, &[' ']) {
        if pos > 0 {
            return start + pos + 1;
        }
    }

    start + max_chars
}

fn rfind_pattern(haystack: &[char], pattern: &[char]) -> Option<usize> {
    let (n, m) = (haystack.len(), pattern.len());
    if m == 0 || m > n {
        return None;
    }
    (0..=n - m).rev().find(|&i| &haystack[i..i + m] == pattern)
}
