//! FFT autocorrelation and the log-normal tempo prior
//!
//! Autocorrelation uses `ACF = IFFT(|FFT(signal)|²)` with zero padding, so
//! a window of `n` frames costs `O(n log n)` instead of `O(n²)`.
//!
//! # Example
//!
//! ```no_run
//! use tempo_dsp::features::period::autocorrelation::Autocorrelator;
//!
//! let mut autocorrelator = Autocorrelator::new(384);
//! let acf = autocorrelator.compute(&[1.0, 0.0, 1.0, 0.0], 4);
//! assert_eq!(acf.len(), 4);
//! ```

use std::sync::Arc;

use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};

/// Reusable FFT autocorrelation for signals up to a fixed length
///
/// Uses the identity `ACF = IFFT(|FFT(signal)|²)` with zero padding to at
/// least twice the signal length, so the result is the linear (not circular)
/// autocorrelation.
pub struct Autocorrelator {
    max_len: usize,
    fft_size: usize,
    forward: Arc<dyn Fft<f32>>,
    inverse: Arc<dyn Fft<f32>>,
    buffer: Vec<Complex<f32>>,
}

impl Autocorrelator {
    /// Plan transforms for signals of at most `max_len` samples
    pub fn new(max_len: usize) -> Self {
        let fft_size = (2 * max_len.max(1)).next_power_of_two();
        let mut planner = FftPlanner::new();
        Self {
            max_len,
            fft_size,
            forward: planner.plan_fft_forward(fft_size),
            inverse: planner.plan_fft_inverse(fft_size),
            buffer: vec![Complex::new(0.0, 0.0); fft_size],
        }
    }

    /// Autocorrelation of `signal` for lags `0..max_lag`
    ///
    /// `signal` longer than the planned length is truncated. The result has
    /// `min(max_lag, signal.len())` values.
    pub fn compute(&mut self, signal: &[f32], max_lag: usize) -> Vec<f32> {
        let n = signal.len().min(self.max_len);
        let lags = max_lag.min(n);
        if lags == 0 {
            return vec![];
        }

        for (slot, &x) in self.buffer.iter_mut().zip(&signal[..n]) {
            *slot = Complex::new(x, 0.0);
        }
        for slot in self.buffer[n..].iter_mut() {
            *slot = Complex::new(0.0, 0.0);
        }

        self.forward.process(&mut self.buffer);
        for x in self.buffer.iter_mut() {
            *x = Complex::new(x.norm_sqr(), 0.0);
        }
        self.inverse.process(&mut self.buffer);

        let scale = 1.0 / self.fft_size as f32;
        self.buffer[..lags].iter().map(|x| x.re * scale).collect()
    }
}

/// Log-normal tempo prior
///
/// `-0.5 * ((log2(bpm) - log2(center)) / spread)²`, where `spread` is in
/// octaves. Zero at the centre; non-positive everywhere.
pub fn log_tempo_prior(bpm: f32, center: f32, spread: f32) -> f32 {
    let z = (bpm.log2() - center.log2()) / spread;
    -0.5 * z * z
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_autocorrelate_matches_direct_sum() {
        let signal = vec![1.0, 0.0, 1.0, 0.0, 1.0, 0.0];
        let acf = Autocorrelator::new(signal.len()).compute(&signal, 6);
        assert_eq!(acf.len(), 6);
        assert!((acf[0] - 3.0).abs() < 1e-4);
        assert!(acf[1].abs() < 1e-4);
        assert!((acf[2] - 2.0).abs() < 1e-4);
        assert!((acf[4] - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_autocorrelator_reuse() {
        let mut ac = Autocorrelator::new(8);
        let a = ac.compute(&[1.0, 2.0, 3.0], 3);
        let b = ac.compute(&[1.0, 2.0, 3.0], 3);
        assert_eq!(a, b);
        assert!((a[0] - 14.0).abs() < 1e-4);
        assert!((a[1] - 8.0).abs() < 1e-4);
        assert!((a[2] - 3.0).abs() < 1e-4);
    }

    #[test]
    fn test_prior_is_zero_at_center() {
        assert_eq!(log_tempo_prior(120.0, 120.0, 1.0), 0.0);
        assert!((log_tempo_prior(60.0, 120.0, 1.0) + 0.5).abs() < 1e-6);
        assert!((log_tempo_prior(240.0, 120.0, 1.0) + 0.5).abs() < 1e-6);
    }
}
