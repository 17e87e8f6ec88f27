//! Silence detection

/// Silence detection configuration
#[derive(Debug, Clone)]
pub struct SilenceDetector {
    /// Threshold in dBFS (default: -60.0)
    /// Audio whose loudest frame RMS stays below this is silent.
    pub threshold_db: f32,

    /// Frame size for RMS analysis (default: 2048)
    pub frame_size: usize,
}

impl Default for SilenceDetector {
    fn default() -> Self {
        Self {
            threshold_db: -60.0,
            frame_size: 2048,
        }
    }
}

impl SilenceDetector {
    /// Loudest frame RMS in dBFS (`f32::NEG_INFINITY` for digital silence)
    pub fn max_frame_level_db(&self, samples: &[f32]) -> f32 {
        let frame_size = self.frame_size.max(1);
        let max_rms = samples
            .chunks(frame_size)
            .map(|frame| {
                let sum_sq: f32 = frame.iter().map(|&x| x * x).sum();
                (sum_sq / frame.len() as f32).sqrt()
            })
            .fold(0.0f32, f32::max);

        if max_rms > 0.0 {
            20.0 * max_rms.log10()
        } else {
            f32::NEG_INFINITY
        }
    }

    /// True if no frame rises above the threshold
    pub fn is_silent(&self, samples: &[f32]) -> bool {
        let level = self.max_frame_level_db(samples);
        log::debug!(
            "Silence check: loudest frame {:.1} dBFS, threshold {:.1} dBFS",
            level,
            self.threshold_db
        );
        level < self.threshold_db
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zeros_are_silent() {
        let detector = SilenceDetector::default();
        assert!(detector.is_silent(&vec![0.0f32; 44100]));
        assert_eq!(detector.max_frame_level_db(&[0.0; 16]), f32::NEG_INFINITY);
    }

    #[test]
    fn test_low_noise_floor_is_silent() {
        let detector = SilenceDetector::default();
        let samples: Vec<f32> = (0..44100).map(|i| if i % 2 == 0 { 1e-5 } else { -1e-5 }).collect();
        assert!(detector.is_silent(&samples));
    }

    #[test]
    fn test_single_loud_frame_is_not_silent() {
        let detector = SilenceDetector::default();
        let mut samples = vec![0.0f32; 44100];
        for s in samples[10_000..10_400].iter_mut() {
            *s = 0.5;
        }
        assert!(!detector.is_silent(&samples));
    }
}
