//! MP3 duration queries via `symphonia`, used by provider adapters (to
//! report each chunk's own duration) and by the stitcher (to report the
//! stitched file's total duration).

use std::io::Cursor;

use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::error::{Result, TtsError};

/// Returns the duration of an MP3 byte buffer in milliseconds.
///
/// Prefers the container's frame count when present; falls back to
/// decoding every packet and summing frame counts for streams without one
/// (most raw MP3 encodes without a Xing/VBR header).
pub fn calculate(mp3_bytes: &[u8]) -> Result<u64> {
    let cursor = Cursor::new(mp3_bytes.to_vec());
    let mss = MediaSourceStream::new(Box::new(cursor), Default::default());

    let mut hint = Hint::new();
    hint.with_extension("mp3");

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| TtsError::AudioProcessing(format!("failed to probe mp3: {e}")))?;
    let mut format = probed.format;

    let (track_id, sample_rate, n_frames, codec_params) = {
        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| TtsError::AudioProcessing("mp3 stream has no audio track".into()))?;
        (
            track.id,
            track
                .codec_params
                .sample_rate
                .ok_or_else(|| TtsError::AudioProcessing("mp3 stream is missing a sample rate".into()))?,
            track.codec_params.n_frames,
            track.codec_params.clone(),
        )
    };

    if let Some(n_frames) = n_frames {
        return Ok(frames_to_ms(n_frames, sample_rate));
    }

    let mut decoder = symphonia::default::get_codecs()
        .make(&codec_params, &DecoderOptions::default())
        .map_err(|e| TtsError::AudioProcessing(format!("failed to create mp3 decoder: {e}")))?;

    let mut total_frames: u64 = 0;
    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(_) => break,
        };
        if packet.track_id() != track_id {
            continue;
        }
        if let Ok(decoded) = decoder.decode(&packet) {
            total_frames += decoded.frames() as u64;
        }
    }

    Ok(frames_to_ms(total_frames, sample_rate))
}

fn frames_to_ms(frames: u64, sample_rate: u32) -> u64 {
    (frames as f64 / sample_rate as f64 * 1000.0) as u64
}
