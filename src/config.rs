//! Configuration parameters for tempo analysis

use crate::error::AnalysisError;
use crate::features::onset::Aggregation;

/// Analysis configuration parameters
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    // Input bounding
    /// Maximum seconds of audio analysed (default: Some(15.0))
    /// Longer inputs are truncated before analysis. `None` analyses everything.
    pub max_analysis_seconds: Option<f32>,

    /// Rate the waveform is downsampled to before analysis (default: Some(22050))
    /// Inputs already at or below this rate are left untouched. `None` keeps the
    /// native rate.
    pub analysis_sample_rate: Option<u32>,

    /// Loudest-frame RMS level in dBFS below which the input counts as silent
    /// (default: -60.0)
    pub silence_threshold_db: f32,

    // Onset envelope
    /// FFT frame size for the spectrogram (default: 2048)
    pub frame_size: usize,

    /// Hop size between frames in samples (default: 512)
    pub hop_size: usize,

    /// Number of mel bands (default: 128)
    pub n_mels: usize,

    /// Frame lag used for the spectral difference (default: 1)
    pub onset_lag: usize,

    /// Dynamic range kept in the log-mel spectrogram in dB (default: 80.0)
    pub top_db: f32,

    /// How band differences are folded into one value per frame (default: Median)
    pub aggregation: Aggregation,

    // Tempo estimation
    /// Lower edge of the plausible tempo band (default: 60.0)
    pub min_bpm: f32,

    /// Upper edge of the plausible tempo band (default: 200.0)
    pub max_bpm: f32,

    /// Centre of the log-normal tempo prior in BPM (default: 120.0)
    pub prior_bpm: f32,

    /// Spread of the tempo prior in octaves (default: 1.0)
    pub prior_spread: f32,

    /// Highest tempo the periodicity search looks at (default: 320.0)
    pub max_search_bpm: f32,

    /// Tempogram window length in envelope frames (default: 384)
    pub tempogram_window: usize,

    /// Beat tracker tightness; higher values keep beats closer to the
    /// starting period (default: 100.0)
    pub tightness: f32,

    /// Run the periodicity-with-prior strategy (default: true)
    pub enable_periodicity_prior: bool,

    /// Run the periodicity-distribution strategy (default: true)
    pub enable_periodicity_distribution: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            max_analysis_seconds: Some(15.0),
            analysis_sample_rate: Some(22050),
            silence_threshold_db: -60.0,
            frame_size: 2048,
            hop_size: 512,
            n_mels: 128,
            onset_lag: 1,
            top_db: 80.0,
            aggregation: Aggregation::Median,
            min_bpm: 60.0,
            max_bpm: 200.0,
            prior_bpm: 120.0,
            prior_spread: 1.0,
            max_search_bpm: 320.0,
            tempogram_window: 384,
            tightness: 100.0,
            enable_periodicity_prior: true,
            enable_periodicity_distribution: true,
        }
    }
}

impl AnalysisConfig {
    /// Favour latency: analyse at most `seconds` of audio at a reduced rate
    pub fn fast(seconds: f32) -> Self {
        Self {
            max_analysis_seconds: Some(seconds),
            analysis_sample_rate: Some(11025),
            frame_size: 1024,
            hop_size: 256,
            ..Self::default()
        }
    }

    /// Check parameters before running the pipeline
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if let Some(seconds) = self.max_analysis_seconds {
            if !(seconds > 0.0) {
                return Err(AnalysisError::InvalidInput(format!(
                    "max_analysis_seconds must be > 0, got {}",
                    seconds
                )));
            }
        }

        if self.analysis_sample_rate == Some(0) {
            return Err(AnalysisError::InvalidInput(
                "analysis_sample_rate must be > 0".to_string(),
            ));
        }

        if self.frame_size < 16 || self.hop_size == 0 {
            return Err(AnalysisError::InvalidInput(format!(
                "Invalid framing: frame_size={}, hop_size={}",
                self.frame_size, self.hop_size
            )));
        }

        if self.n_mels == 0 || self.onset_lag == 0 {
            return Err(AnalysisError::InvalidInput(format!(
                "Invalid onset parameters: n_mels={}, onset_lag={}",
                self.n_mels, self.onset_lag
            )));
        }

        if !(self.top_db > 0.0) {
            return Err(AnalysisError::InvalidInput(format!(
                "top_db must be > 0, got {}",
                self.top_db
            )));
        }

        if !self.silence_threshold_db.is_finite() {
            return Err(AnalysisError::InvalidInput(format!(
                "silence_threshold_db must be finite, got {}",
                self.silence_threshold_db
            )));
        }

        if !(self.min_bpm > 0.0 && self.max_bpm > self.min_bpm && self.max_bpm.is_finite()) {
            return Err(AnalysisError::InvalidInput(format!(
                "Invalid BPM range: [{:.1}, {:.1}]",
                self.min_bpm, self.max_bpm
            )));
        }

        if !(self.prior_bpm > 0.0 && self.prior_bpm.is_finite())
            || !(self.prior_spread > 0.0 && self.prior_spread.is_finite())
        {
            return Err(AnalysisError::InvalidInput(format!(
                "Invalid tempo prior: center={:.1}, spread={:.2}",
                self.prior_bpm, self.prior_spread
            )));
        }

        if !(self.max_search_bpm > self.max_bpm && self.max_search_bpm.is_finite()) {
            return Err(AnalysisError::InvalidInput(format!(
                "max_search_bpm ({:.1}) must exceed max_bpm ({:.1})",
                self.max_search_bpm, self.max_bpm
            )));
        }

        if !(self.tightness >= 0.0 && self.tightness.is_finite()) {
            return Err(AnalysisError::InvalidInput(format!(
                "tightness must be finite and >= 0, got {}",
                self.tightness
            )));
        }

        if self.tempogram_window < 4 {
            return Err(AnalysisError::InvalidInput(format!(
                "tempogram_window too small: {}",
                self.tempogram_window
            )));
        }

        Ok(())
    }
}
