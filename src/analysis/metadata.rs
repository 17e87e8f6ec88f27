//! Analysis metadata structures

use serde::{Deserialize, Serialize};

/// Octave correction applied to the reconciled tempo
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OctaveCorrection {
    /// Tempo was below the band and was doubled (half-time detection)
    Doubled,

    /// Tempo was above the band and was halved (double-time detection)
    Halved,
}

/// Analysis metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisMetadata {
    /// Algorithm version
    pub algorithm_version: String,

    /// Processing time in milliseconds
    pub processing_time_ms: f32,

    /// Sample rate the onset envelope was computed at
    pub analysis_sample_rate: u32,

    /// True if the input was cut to `max_analysis_seconds`
    pub truncated: bool,

    /// Strategies that produced candidates
    pub strategies_used: Vec<String>,

    /// Candidates inside the plausible band
    pub qualifying_candidates: usize,

    /// Octave correction, if any
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub octave_correction: Option<OctaveCorrection>,

    /// Standard deviation of the in-band per-frame tempos
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub distribution_dispersion: Option<f32>,

    /// Caveats about the estimate
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub warnings: Vec<String>,
}

impl Default for AnalysisMetadata {
    fn default() -> Self {
        Self {
            algorithm_version: env!("CARGO_PKG_VERSION").to_string(),
            processing_time_ms: 0.0,
            analysis_sample_rate: 0,
            truncated: false,
            strategies_used: vec![],
            qualifying_candidates: 0,
            octave_correction: None,
            distribution_dispersion: None,
            warnings: vec![],
        }
    }
}
