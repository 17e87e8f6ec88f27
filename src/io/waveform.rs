//! Mono waveform container

use crate::error::AnalysisError;

/// Mono audio samples with their sample rate
///
/// A `Waveform` is never empty and always has a non-zero sample rate, so
/// `duration_seconds() == len() / sample_rate` is always well defined.
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    samples: Vec<f32>,
    sample_rate: u32,
}

impl Waveform {
    /// Wrap mono samples
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::InvalidInput` if `samples` is empty, the sample
    /// rate is zero, or any sample is not finite.
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Result<Self, AnalysisError> {
        if samples.is_empty() {
            return Err(AnalysisError::InvalidInput(
                "Empty audio samples".to_string(),
            ));
        }

        if sample_rate == 0 {
            return Err(AnalysisError::InvalidInput(
                "Invalid sample rate: 0".to_string(),
            ));
        }

        if let Some(idx) = samples.iter().position(|s| !s.is_finite()) {
            return Err(AnalysisError::InvalidInput(format!(
                "Non-finite sample at index {}",
                idx
            )));
        }

        Ok(Self {
            samples,
            sample_rate,
        })
    }

    /// Samples in time order
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Sample rate in Hz
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of samples
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Always false; kept for API symmetry with slices
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in seconds
    pub fn duration_seconds(&self) -> f32 {
        self.samples.len() as f32 / self.sample_rate as f32
    }

    /// Keep at most `seconds` of audio from the start
    ///
    /// Returns true if samples were dropped. At least one sample is always kept.
    pub fn truncate_to_seconds(&mut self, seconds: f32) -> bool {
        let max_samples = ((seconds.max(0.0) * self.sample_rate as f32) as usize).max(1);
        if self.samples.len() > max_samples {
            self.samples.truncate(max_samples);
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_is_len_over_rate() {
        let wf = Waveform::new(vec![0.1f32; 22050 * 3], 22050).unwrap();
        assert_eq!(wf.len(), 66150);
        assert!((wf.duration_seconds() - 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_rejects_empty_and_zero_rate() {
        assert!(Waveform::new(vec![], 44100).is_err());
        assert!(Waveform::new(vec![0.0; 10], 0).is_err());
    }

    #[test]
    fn test_rejects_nan() {
        let result = Waveform::new(vec![0.0, f32::NAN, 0.0], 8000);
        assert!(matches!(result, Err(AnalysisError::InvalidInput(_))));
    }

    #[test]
    fn test_truncate_to_seconds() {
        let mut wf = Waveform::new(vec![0.5f32; 8000 * 20], 8000).unwrap();
        assert!(wf.truncate_to_seconds(15.0));
        assert_eq!(wf.len(), 8000 * 15);
        assert!(!wf.truncate_to_seconds(30.0));
        assert_eq!(wf.len(), 8000 * 15);
    }
}
