//! Log-mel spectral flux onset strength
//!
//! # Algorithm
//!
//! 1. Centered STFT power spectrogram (Hann window)
//! 2. Mel filterbank projection (0 Hz to Nyquist)
//! 3. dB conversion: `10 * log10(max(AMIN, P))`, floored at `max_db - top_db`
//! 4. Per band: `max(0, S[b][t] - S[b][t - lag])`
//! 5. Fold bands into one value per frame (median by default)
//!
//! The first `lag` frames have no predecessor and are 0.
//!
//! # Example
//!
//! ```no_run
//! use tempo_dsp::features::onset::onset_strength;
//! use tempo_dsp::io::Waveform;
//! use tempo_dsp::AnalysisConfig;
//!
//! let waveform = Waveform::new(vec![0.0f32; 22050 * 10], 22050)?;
//! let envelope = onset_strength(&waveform, &AnalysisConfig::default())?;
//! println!("{} frames at {:.1} fps", envelope.len(), envelope.frame_rate());
//! # Ok::<(), tempo_dsp::AnalysisError>(())
//! ```

use super::mel::MelFilterbank;
use super::stft::power_spectrogram;
use super::{Aggregation, OnsetEnvelope};
use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::features::stats::{mean, median_in_place};
use crate::io::Waveform;

/// Power floor before taking the logarithm
const AMIN: f32 = 1e-10;

/// Numerical stability epsilon
const EPSILON: f32 = 1e-6;

/// Compute the onset strength envelope of a waveform
///
/// # Arguments
///
/// * `waveform` - Mono waveform
/// * `config` - Uses `frame_size`, `hop_size`, `n_mels`, `onset_lag`,
///   `top_db` and `aggregation`
///
/// # Returns
///
/// `OnsetEnvelope` with `1 + len / hop_size` non-negative values
///
/// # Errors
///
/// Returns `AnalysisError::InvalidInput` for invalid framing parameters,
/// `AnalysisError::NumericalError` if the spectrogram carries no energy and
/// `AnalysisError::ProcessingError` if the envelope is flat (no onsets at all).
pub fn onset_strength(
    waveform: &Waveform,
    config: &AnalysisConfig,
) -> Result<OnsetEnvelope, AnalysisError> {
    let n_fft = config.frame_size;
    let hop = config.hop_size;
    let lag = config.onset_lag.max(1);
    let sample_rate = waveform.sample_rate();

    log::debug!(
        "Computing onset strength: {} samples at {} Hz, n_fft={}, hop={}, n_mels={}, {:?}",
        waveform.len(),
        sample_rate,
        n_fft,
        hop,
        config.n_mels,
        config.aggregation
    );

    let spectrogram = power_spectrogram(waveform.samples(), n_fft, hop)?;
    let filterbank = MelFilterbank::new(
        config.n_mels,
        n_fft,
        sample_rate,
        0.0,
        sample_rate as f32 / 2.0,
    )?;

    // Log-mel spectrogram, frame-major
    let n_mels = filterbank.n_mels();
    let mut log_mel: Vec<Vec<f32>> = Vec::with_capacity(spectrogram.len());
    let mut max_power = 0.0f32;
    for frame in &spectrogram {
        let mut bands = vec![0.0f32; n_mels];
        filterbank.apply(frame, &mut bands);
        for band in bands.iter_mut() {
            max_power = max_power.max(*band);
            *band = 10.0 * band.max(AMIN).log10();
        }
        log_mel.push(bands);
    }

    if !max_power.is_finite() {
        return Err(AnalysisError::NumericalError(
            "Non-finite energy in mel spectrogram".to_string(),
        ));
    }

    if max_power <= AMIN {
        return Err(AnalysisError::NumericalError(
            "Mel spectrogram carries no energy (silent input)".to_string(),
        ));
    }

    let floor_db = 10.0 * max_power.log10() - config.top_db;
    for bands in log_mel.iter_mut() {
        for band in bands.iter_mut() {
            *band = band.max(floor_db);
        }
    }

    let mut values = vec![0.0f32; log_mel.len()];
    let mut diffs = vec![0.0f32; n_mels];
    for t in lag..log_mel.len() {
        for ((d, &cur), &prev) in diffs.iter_mut().zip(&log_mel[t]).zip(&log_mel[t - lag]) {
            *d = (cur - prev).max(0.0);
        }
        values[t] = match config.aggregation {
            Aggregation::Median => median_in_place(&mut diffs),
            Aggregation::Mean => mean(&diffs),
        };
    }

    let peak = values.iter().copied().fold(0.0f32, f32::max);
    if peak <= EPSILON {
        return Err(AnalysisError::ProcessingError(
            "Onset envelope is flat; no rhythmic onsets found".to_string(),
        ));
    }

    log::debug!(
        "Onset envelope: {} frames, peak={:.3}, mean={:.3}",
        values.len(),
        peak,
        mean(&values)
    );

    Ok(OnsetEnvelope {
        values,
        hop_length: hop,
        sample_rate,
    })
}
