//! Joins an ordered list of MP3 fragments into a single MP3, inserting
//! silence (or, optionally, a linear crossfade) between fragments.

use std::io::Cursor;

use mp3lame_encoder::{Bitrate, Builder, DualPcm, FlushNoGap, MonoPcm};
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::error::{Result, TtsError};

/// Result of stitching a set of MP3 fragments together.
pub struct StitchResult {
    pub audio_bytes: Vec<u8>,
    pub duration_ms: u64,
    pub size_bytes: u64,
}

pub struct AudioStitcher {
    pub silence_between_ms: u64,
    pub crossfade_ms: u64,
}

impl Default for AudioStitcher {
    fn default() -> Self {
        Self {
            silence_between_ms: 100,
            crossfade_ms: 0,
        }
    }
}

impl AudioStitcher {
    pub fn new(silence_between_ms: u64, crossfade_ms: u64) -> Self {
        Self {
            silence_between_ms,
            crossfade_ms,
        }
    }

    pub fn stitch(&self, fragments: &[Vec<u8>]) -> Result<StitchResult> {
        if fragments.is_empty() {
            return Err(TtsError::AudioProcessing("no audio fragments to stitch".into()));
        }

        let decoded: Vec<DecodedPcm> = fragments.iter().map(|f| decode_mp3(f)).collect::<Result<_>>()?;
        let sample_rate = decoded[0].sample_rate;
        let channels = decoded[0].channels;
        if decoded.iter().any(|d| d.sample_rate != sample_rate || d.channels != channels) {
            return Err(TtsError::AudioProcessing(
                "audio fragments have mismatched sample rate or channel count".into(),
            ));
        }

        let mut pcm = Vec::new();
        let last = decoded.len() - 1;
        let crossfade_samples = (self.crossfade_ms as f64 / 1000.0 * sample_rate as f64) as usize * channels as usize;

        for (i, fragment) in decoded.into_iter().enumerate() {
            if self.crossfade_ms > 0 && i > 0 && crossfade_samples > 0 && crossfade_samples <= pcm.len() {
                crossfade_append(&mut pcm, &fragment.samples, crossfade_samples);
            } else {
                pcm.extend_from_slice(&fragment.samples);
            }
            if i != last && self.crossfade_ms == 0 {
                let silence_samples =
                    (self.silence_between_ms as f64 / 1000.0 * sample_rate as f64) as usize * channels as usize;
                pcm.extend(std::iter::repeat(0i16).take(silence_samples));
            }
        }

        let audio_bytes = encode_mp3(&pcm, sample_rate, channels)?;
        let duration_ms = crate::audio::duration::calculate(&audio_bytes)?;
        let size_bytes = audio_bytes.len() as u64;

        Ok(StitchResult {
            audio_bytes,
            duration_ms,
            size_bytes,
        })
    }
}

/// Queries the duration of an already-stitched (or any) MP3 buffer.
pub fn get_duration_ms(mp3_bytes: &[u8]) -> Result<u64> {
    crate::audio::duration::calculate(mp3_bytes)
}

struct DecodedPcm {
    samples: Vec<i16>,
    sample_rate: u32,
    channels: u16,
}

fn decode_mp3(mp3_bytes: &[u8]) -> Result<DecodedPcm> {
    let cursor = Cursor::new(mp3_bytes.to_vec());
    let mss = MediaSourceStream::new(Box::new(cursor), Default::default());
    let mut hint = Hint::new();
    hint.with_extension("mp3");

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| TtsError::AudioProcessing(format!("failed to probe mp3 fragment: {e}")))?;
    let mut format = probed.format;

    let (track_id, codec_params) = {
        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| TtsError::AudioProcessing("mp3 fragment has no audio track".into()))?;
        (track.id, track.codec_params.clone())
    };
    let sample_rate = codec_params
        .sample_rate
        .ok_or_else(|| TtsError::AudioProcessing("mp3 fragment is missing a sample rate".into()))?;
    let channels = codec_params
        .channels
        .map(|c| c.count() as u16)
        .unwrap_or(1);

    let mut decoder = symphonia::default::get_codecs()
        .make(&codec_params, &DecoderOptions::default())
        .map_err(|e| TtsError::AudioProcessing(format!("failed to create mp3 decoder: {e}")))?;

    let mut samples = Vec::new();
    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(_) => break,
        };
        if packet.track_id() != track_id {
            continue;
        }
        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(_) => continue,
        };
        append_samples_as_i16(&decoded, &mut samples);
    }

    Ok(DecodedPcm {
        samples,
        sample_rate,
        channels,
    })
}

fn append_samples_as_i16(decoded: &symphonia::core::audio::AudioBufferRef, out: &mut Vec<i16>) {
    let spec = *decoded.spec();
    let duration = decoded.capacity() as u64;
    let mut sample_buf = symphonia::core::audio::SampleBuffer::<i16>::new(duration, spec);
    sample_buf.copy_interleaved_ref(decoded.clone());
    out.extend_from_slice(sample_buf.samples());
}

fn crossfade_append(pcm: &mut Vec<i16>, incoming: &[i16], crossfade_samples: usize) {
    let overlap_start = pcm.len() - crossfade_samples;
    let overlap_len = crossfade_samples.min(incoming.len());
    for i in 0..overlap_len {
        let t = i as f32 / crossfade_samples as f32;
        let existing = pcm[overlap_start + i] as f32;
        let new = incoming[i] as f32;
        pcm[overlap_start + i] = (existing * (1.0 - t) + new * t) as i16;
    }
    pcm.extend_from_slice(&incoming[overlap_len..]);
}

/// Splits an interleaved `[L, R, L, R, ...]` buffer into separate channel
/// buffers for the encoder's stereo input path.
fn deinterleave_stereo(pcm: &[i16]) -> (Vec<i16>, Vec<i16>) {
    let mut left = Vec::with_capacity(pcm.len() / 2 + 1);
    let mut right = Vec::with_capacity(pcm.len() / 2 + 1);
    for pair in pcm.chunks(2) {
        left.push(pair[0]);
        right.push(*pair.get(1).unwrap_or(&pair[0]));
    }
    (left, right)
}

fn encode_mp3(pcm: &[i16], sample_rate: u32, channels: u16) -> Result<Vec<u8>> {
    let mut builder = Builder::new().ok_or_else(|| TtsError::AudioProcessing("failed to init mp3 encoder".into()))?;
    builder
        .set_num_channels(channels as u8)
        .map_err(|e| TtsError::AudioProcessing(format!("invalid channel count: {e:?}")))?;
    builder
        .set_sample_rate(sample_rate)
        .map_err(|e| TtsError::AudioProcessing(format!("invalid sample rate: {e:?}")))?;
    builder
        .set_brate(Bitrate::Kbps192)
        .map_err(|e| TtsError::AudioProcessing(format!("invalid bitrate: {e:?}")))?;
    let mut encoder = builder
        .build()
        .map_err(|e| TtsError::AudioProcessing(format!("failed to build mp3 encoder: {e:?}")))?;

    let mut output = Vec::with_capacity(mp3lame_encoder::max_required_buffer_size(pcm.len()));
    // `pcm` is interleaved (as produced by `symphonia`'s `SampleBuffer`). The
    // encoder's mono path takes a flat buffer as-is; its stereo path wants
    // separate left/right channel buffers, so a stereo fragment must be
    // de-interleaved first — encoding interleaved stereo samples as mono
    // would double the apparent sample count and corrupt both the audio and
    // the reported duration.
    let encoded = if channels <= 1 {
        encoder
            .encode(MonoPcm(pcm), output.spare_capacity_mut())
            .map_err(|e| TtsError::AudioProcessing(format!("mp3 encode failed: {e:?}")))?
    } else {
        let (left, right) = deinterleave_stereo(pcm);
        encoder
            .encode(
                DualPcm {
                    left: &left,
                    right: &right,
                },
                output.spare_capacity_mut(),
            )
            .map_err(|e| TtsError::AudioProcessing(format!("mp3 encode failed: {e:?}")))?
    };
    unsafe {
        output.set_len(output.len() + encoded);
    }

    let flushed = encoder
        .flush::<FlushNoGap>(output.spare_capacity_mut())
        .map_err(|e| TtsError::AudioProcessing(format!("mp3 flush failed: {e:?}")))?;
    unsafe {
        output.set_len(output.len() + flushed);
    }

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stitch_rejects_empty_fragment_list() {
        let stitcher = AudioStitcher::default();
        assert!(stitcher.stitch(&[]).is_err());
    }

    #[test]
    fn crossfade_append_blends_overlap_region() {
        let mut pcm = vec![1000i16; 10];
        let incoming = vec![2000i16; 10];
        crossfade_append(&mut pcm, &incoming, 4);
        assert_eq!(pcm.len(), 16);
        assert!(pcm[6] > 1000 && pcm[6] < 2000);
    }

    #[test]
    fn deinterleave_stereo_splits_left_and_right_channels() {
        let pcm = vec![1, -1, 2, -2, 3, -3];
        let (left, right) = deinterleave_stereo(&pcm);
        assert_eq!(left, vec![1, 2, 3]);
        assert_eq!(right, vec![-1, -2, -3]);
    }
}
