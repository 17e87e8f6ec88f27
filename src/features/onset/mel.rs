//! Triangular mel filterbank
//!
//! Filters are spaced evenly on the HTK mel scale between `fmin` and `fmax`
//! and area-normalised, so a flat spectrum gives roughly the same energy in
//! every band.

use crate::error::AnalysisError;

fn hz_to_mel(hz: f32) -> f32 {
    2595.0 * (1.0 + hz / 700.0).log10()
}

fn mel_to_hz(mel: f32) -> f32 {
    700.0 * (10.0f32.powf(mel / 2595.0) - 1.0)
}

/// One triangular filter, stored sparsely from its first non-zero bin
#[derive(Debug, Clone)]
struct MelFilter {
    start_bin: usize,
    weights: Vec<f32>,
}

/// Projects power spectra onto mel bands
#[derive(Debug, Clone)]
pub struct MelFilterbank {
    filters: Vec<MelFilter>,
    n_bins: usize,
}

impl MelFilterbank {
    /// Build a filterbank for spectra of `n_fft / 2 + 1` bins
    ///
    /// # Arguments
    ///
    /// * `n_mels` - Number of bands
    /// * `n_fft` - FFT size the spectra were computed with
    /// * `sample_rate` - Sample rate in Hz
    /// * `fmin` - Lowest filter edge in Hz
    /// * `fmax` - Highest filter edge in Hz (clamped to Nyquist)
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::InvalidInput` for a zero band count, zero
    /// sample rate or an empty frequency range.
    pub fn new(
        n_mels: usize,
        n_fft: usize,
        sample_rate: u32,
        fmin: f32,
        fmax: f32,
    ) -> Result<Self, AnalysisError> {
        let nyquist = sample_rate as f32 / 2.0;
        let fmax = fmax.min(nyquist);

        if n_mels == 0 || n_fft < 2 || sample_rate == 0 || fmin < 0.0 || fmax <= fmin {
            return Err(AnalysisError::InvalidInput(format!(
                "Invalid mel filterbank: n_mels={}, n_fft={}, sr={}, range=[{:.1}, {:.1}] Hz",
                n_mels, n_fft, sample_rate, fmin, fmax
            )));
        }

        let n_bins = n_fft / 2 + 1;
        let bin_hz = sample_rate as f32 / n_fft as f32;

        let mel_min = hz_to_mel(fmin);
        let mel_max = hz_to_mel(fmax);
        let edges: Vec<f32> = (0..n_mels + 2)
            .map(|i| mel_to_hz(mel_min + (mel_max - mel_min) * i as f32 / (n_mels + 1) as f32))
            .collect();

        let mut filters = Vec::with_capacity(n_mels);
        let mut empty = 0usize;
        for m in 0..n_mels {
            let (lower, centre, upper) = (edges[m], edges[m + 1], edges[m + 2]);
            let norm = 2.0 / (upper - lower);

            let mut start_bin = None;
            let mut weights = Vec::new();
            for bin in 0..n_bins {
                let freq = bin as f32 * bin_hz;
                let rising = (freq - lower) / (centre - lower);
                let falling = (upper - freq) / (upper - centre);
                let w = rising.min(falling).max(0.0) * norm;

                if w > 0.0 {
                    if start_bin.is_none() {
                        start_bin = Some(bin);
                    }
                    weights.push(w);
                } else if start_bin.is_some() {
                    break;
                }
            }

            if weights.is_empty() {
                empty += 1;
            }

            filters.push(MelFilter {
                start_bin: start_bin.unwrap_or(0),
                weights,
            });
        }

        if empty > 0 {
            log::warn!(
                "{} of {} mel filters cover no FFT bin (n_fft={} too small for n_mels={})",
                empty,
                n_mels,
                n_fft,
                n_mels
            );
        }

        Ok(Self { filters, n_bins })
    }

    /// Number of mel bands
    pub fn n_mels(&self) -> usize {
        self.filters.len()
    }

    /// Spectrum length this filterbank expects
    pub fn n_bins(&self) -> usize {
        self.n_bins
    }

    /// Project one power spectrum into `out` (one value per band)
    pub fn apply(&self, power: &[f32], out: &mut [f32]) {
        for (filter, slot) in self.filters.iter().zip(out.iter_mut()) {
            let end = (filter.start_bin + filter.weights.len()).min(power.len());
            *slot = power[filter.start_bin.min(end)..end]
                .iter()
                .zip(&filter.weights)
                .map(|(p, w)| p * w)
                .sum();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mel_scale_round_trip() {
        for hz in [0.0f32, 440.0, 1000.0, 8000.0] {
            assert!((mel_to_hz(hz_to_mel(hz)) - hz).abs() < 0.5);
        }
    }

    #[test]
    fn test_filterbank_covers_all_bands() {
        let fb = MelFilterbank::new(128, 2048, 22050, 0.0, 11025.0).unwrap();
        assert_eq!(fb.n_mels(), 128);
        assert_eq!(fb.n_bins(), 1025);
        assert!(fb.filters.iter().all(|f| !f.weights.is_empty()));
    }

    #[test]
    fn test_tone_lands_in_one_region() {
        let fb = MelFilterbank::new(40, 1024, 16000, 0.0, 8000.0).unwrap();
        let mut power = vec![0.0f32; 513];
        power[64] = 1.0; // 1 kHz

        let mut bands = vec![0.0f32; 40];
        fb.apply(&power, &mut bands);

        let active = bands.iter().filter(|&&b| b > 0.0).count();
        assert!(active >= 1 && active <= 2, "active bands: {}", active);
    }

    #[test]
    fn test_invalid_range_rejected() {
        assert!(MelFilterbank::new(0, 2048, 22050, 0.0, 11025.0).is_err());
        assert!(MelFilterbank::new(128, 2048, 22050, 5000.0, 4000.0).is_err());
    }
}
