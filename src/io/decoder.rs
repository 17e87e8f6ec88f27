//! Audio decoding using Symphonia
//!
//! Decodes any container/codec Symphonia supports (MP3, WAV, FLAC, OGG/Vorbis,
//! M4A/AAC/ALAC, AIFF) into a mono `f32` waveform. Multi-channel audio is
//! averaged down to one channel while decoding.
//!
//! # Example
//!
//! ```no_run
//! use tempo_dsp::io::decode_audio;
//!
//! let decoded = decode_audio("track.flac", Some(15.0))?;
//! println!(
//!     "{} Hz, {} channel(s), {:.2}s",
//!     decoded.waveform.sample_rate(),
//!     decoded.channels,
//!     decoded.waveform.duration_seconds()
//! );
//! # Ok::<(), tempo_dsp::AnalysisError>(())
//! ```

use std::fs::File;
use std::path::Path;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use super::waveform::Waveform;
use crate::error::AnalysisError;
use crate::preprocessing::channel_mixer::downmix_interleaved;

/// Result of decoding a file
#[derive(Debug, Clone)]
pub struct DecodedAudio {
    /// Mono waveform at the file's native sample rate
    pub waveform: Waveform,

    /// Channel count of the source stream
    pub channels: usize,

    /// True if decoding stopped early because of `max_seconds`
    pub truncated: bool,
}

/// Decode an audio file to a mono waveform
///
/// # Arguments
///
/// * `path` - Path to the audio file; its extension is used as a probe hint
/// * `max_seconds` - Stop decoding once this much audio has been produced
///
/// # Errors
///
/// Returns `AnalysisError::DecodingError` if the file cannot be opened or
/// probed, has no audio track, or yields no samples.
pub fn decode_audio<P: AsRef<Path>>(
    path: P,
    max_seconds: Option<f32>,
) -> Result<DecodedAudio, AnalysisError> {
    let path = path.as_ref();
    log::debug!("Decoding audio file: {:?}", path);

    let file = File::open(path)
        .map_err(|e| AnalysisError::DecodingError(format!("Failed to open {:?}: {}", path, e)))?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| AnalysisError::DecodingError(format!("Unrecognised audio format: {}", e)))?;

    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| AnalysisError::DecodingError("No audio track found".to_string()))?;

    let track_id = track.id;
    let codec_params = track.codec_params.clone();

    let mut decoder = symphonia::default::get_codecs()
        .make(&codec_params, &DecoderOptions::default())
        .map_err(|e| AnalysisError::DecodingError(format!("Unsupported codec: {}", e)))?;

    let mut sample_rate = codec_params.sample_rate.unwrap_or(0);
    let mut channels = codec_params.channels.map(|c| c.count()).unwrap_or(0);
    let mut mono: Vec<f32> = Vec::new();
    let mut truncated = false;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(SymphoniaError::ResetRequired) => {
                log::warn!("Stream reset requested by {:?}, stopping", path);
                break;
            }
            Err(e) => {
                if mono.is_empty() {
                    return Err(AnalysisError::DecodingError(format!(
                        "Failed to read packet: {}",
                        e
                    )));
                }
                log::warn!("Error reading packet from {:?}: {}", path, e);
                break;
            }
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(SymphoniaError::DecodeError(e)) => {
                log::warn!("Skipping undecodable packet: {}", e);
                continue;
            }
            Err(e) => {
                return Err(AnalysisError::DecodingError(format!(
                    "Decoder failure: {}",
                    e
                )));
            }
        };

        let spec = *decoded.spec();
        if sample_rate == 0 {
            sample_rate = spec.rate;
        }
        channels = spec.channels.count();

        if decoded.frames() == 0 {
            continue;
        }

        let mut sample_buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
        sample_buf.copy_interleaved_ref(decoded);
        mono.extend(downmix_interleaved(sample_buf.samples(), channels));

        if let Some(seconds) = max_seconds {
            let limit = (seconds * sample_rate as f32) as usize;
            if sample_rate > 0 && mono.len() >= limit {
                mono.truncate(limit.max(1));
                truncated = true;
                break;
            }
        }
    }

    if mono.is_empty() {
        return Err(AnalysisError::DecodingError(
            "Decoded audio is empty".to_string(),
        ));
    }

    if sample_rate == 0 {
        return Err(AnalysisError::DecodingError(
            "Stream does not declare a sample rate".to_string(),
        ));
    }

    log::debug!(
        "Decoded {} samples ({:.1}s) at {} Hz from {} channel(s){}",
        mono.len(),
        mono.len() as f32 / sample_rate as f32,
        sample_rate,
        channels,
        if truncated { ", truncated" } else { "" }
    );

    let waveform = Waveform::new(mono, sample_rate)
        .map_err(|e| AnalysisError::DecodingError(e.cause().to_string()))?;

    Ok(DecodedAudio {
        waveform,
        channels,
        truncated,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_requires_file() {
        let result = decode_audio("/nonexistent/file.mp3", None);
        assert!(matches!(result, Err(AnalysisError::DecodingError(_))));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let dir = std::env::temp_dir();
        let path = dir.join(format!("tempo_dsp_garbage_{}.wav", std::process::id()));
        std::fs::write(&path, b"definitely not a riff header").unwrap();

        let result = decode_audio(&path, None);
        let _ = std::fs::remove_file(&path);

        let err = result.unwrap_err();
        assert!(err.is_client_error(), "garbage should be a decode error: {}", err);
    }
}
