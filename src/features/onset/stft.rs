//! Short-time Fourier transform
//!
//! Frames are centred: the signal is zero-padded by `n_fft / 2` on both
//! sides, so frame `i` is centred on sample `i * hop`. This gives
//! `1 + len / hop` frames for any non-empty input.

use rustfft::num_complex::Complex;
use rustfft::FftPlanner;

use crate::error::AnalysisError;

/// Periodic Hann window of length `n`
pub fn hann_window(n: usize) -> Vec<f32> {
    (0..n)
        .map(|i| 0.5 * (1.0 - (2.0 * std::f32::consts::PI * i as f32 / n as f32).cos()))
        .collect()
}

/// Compute the power spectrogram `|X|^2` of `samples`
///
/// # Arguments
///
/// * `samples` - Mono audio samples
/// * `n_fft` - FFT size (also the window length)
/// * `hop` - Samples between successive frame centres
///
/// # Returns
///
/// `n_frames × (n_fft / 2 + 1)` power values
///
/// # Errors
///
/// Returns `AnalysisError::InvalidInput` for empty input, `n_fft < 2` or
/// `hop == 0`.
pub fn power_spectrogram(
    samples: &[f32],
    n_fft: usize,
    hop: usize,
) -> Result<Vec<Vec<f32>>, AnalysisError> {
    if samples.is_empty() {
        return Err(AnalysisError::InvalidInput(
            "Empty audio samples".to_string(),
        ));
    }

    if n_fft < 2 || hop == 0 {
        return Err(AnalysisError::InvalidInput(format!(
            "Invalid STFT parameters: n_fft={}, hop={}",
            n_fft, hop
        )));
    }

    let pad = n_fft / 2;
    let mut padded = vec![0.0f32; samples.len() + 2 * pad];
    padded[pad..pad + samples.len()].copy_from_slice(samples);

    let n_frames = 1 + (padded.len() - n_fft) / hop;
    let n_bins = n_fft / 2 + 1;
    let window = hann_window(n_fft);

    let mut planner = FftPlanner::<f32>::new();
    let fft = planner.plan_fft_forward(n_fft);
    let mut buffer = vec![Complex::new(0.0f32, 0.0); n_fft];

    let mut frames = Vec::with_capacity(n_frames);
    for frame_idx in 0..n_frames {
        let start = frame_idx * hop;
        let segment = &padded[start..start + n_fft];
        for ((slot, &x), &w) in buffer.iter_mut().zip(segment).zip(&window) {
            *slot = Complex::new(x * w, 0.0);
        }

        fft.process(&mut buffer);

        frames.push(buffer[..n_bins].iter().map(|c| c.norm_sqr()).collect());
    }

    log::debug!(
        "STFT: {} frames x {} bins (n_fft={}, hop={})",
        n_frames,
        n_bins,
        n_fft,
        hop
    );

    Ok(frames)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_count_is_centered() {
        let samples = vec![0.0f32; 10_000];
        let spec = power_spectrogram(&samples, 2048, 512).unwrap();
        assert_eq!(spec.len(), 1 + 10_000 / 512);
        assert_eq!(spec[0].len(), 1025);
    }

    #[test]
    fn test_sine_peaks_at_expected_bin() {
        let sr = 8000.0;
        let n_fft = 512;
        // Exactly on bin 32
        let freq = 32.0 * sr / n_fft as f32;
        let samples: Vec<f32> = (0..8000)
            .map(|i| (2.0 * std::f32::consts::PI * freq * i as f32 / sr).sin())
            .collect();

        let spec = power_spectrogram(&samples, n_fft, 128).unwrap();
        let frame = &spec[spec.len() / 2];
        let peak_bin = frame
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .map(|(i, _)| i)
            .unwrap();
        assert_eq!(peak_bin, 32);
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(power_spectrogram(&[], 2048, 512).is_err());
        assert!(power_spectrogram(&[0.0; 100], 2048, 0).is_err());
        assert!(power_spectrogram(&[0.0; 100], 1, 512).is_err());
    }

    #[test]
    fn test_hann_window_shape() {
        let w = hann_window(8);
        assert!(w[0].abs() < 1e-6);
        assert!((w[4] - 1.0).abs() < 1e-6);
    }
}
