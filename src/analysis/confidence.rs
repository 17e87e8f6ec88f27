//! Confidence scoring
//!
//! Confidence measures how well the tempo strategies agree with each other.
//! It is not a probability: three strategies landing on the same tempo give
//! 1.0, and the score falls linearly with the variance of their estimates.
//!
//! # Example
//!
//! ```
//! use tempo_dsp::analysis::confidence::agreement_confidence;
//!
//! assert_eq!(agreement_confidence(&[120.0, 120.0, 120.0]), 1.0);
//! assert!((agreement_confidence(&[100.0, 120.0, 140.0]) - 0.333).abs() < 0.01);
//! assert_eq!(agreement_confidence(&[128.0]), 0.7);
//! ```

use crate::features::stats::population_variance;

/// Confidence reported when only one candidate qualifies
pub const SINGLE_CANDIDATE_CONFIDENCE: f32 = 0.7;

/// Variance (BPM²) at which agreement confidence reaches zero
pub const VARIANCE_SCALE: f32 = 400.0;

/// Confidence below which a warning is attached to the result
pub const LOW_CONFIDENCE: f32 = 0.5;

/// Agreement-based confidence of a set of candidate tempos
///
/// - two or more values: `clamp(1 - variance / 400, 0, 1)` with the
///   population variance
/// - exactly one value: [`SINGLE_CANDIDATE_CONFIDENCE`]
/// - no values: 0.0
pub fn agreement_confidence(values: &[f32]) -> f32 {
    match values.len() {
        0 => 0.0,
        1 => SINGLE_CANDIDATE_CONFIDENCE,
        _ => (1.0 - population_variance(values) / VARIANCE_SCALE).clamp(0.0, 1.0),
    }
}

/// Human-readable caveats about an estimate
///
/// # Arguments
///
/// * `confidence` - Reconciled confidence
/// * `qualifying` - Number of candidates inside the plausible band
/// * `used_fallback` - True if no candidate qualified and the raw beat-track
///   tempo was used
/// * `octave_corrected` - True if the tempo was doubled or halved
pub fn confidence_warnings(
    confidence: f32,
    qualifying: usize,
    used_fallback: bool,
    octave_corrected: bool,
) -> Vec<String> {
    let mut warnings = Vec::new();

    if used_fallback {
        warnings.push(
            "No strategy produced a tempo in the plausible band; using the beat tracker alone"
                .to_string(),
        );
    } else if qualifying == 1 {
        warnings.push("Only one strategy produced a plausible tempo".to_string());
    }

    if qualifying >= 2 && confidence < LOW_CONFIDENCE {
        warnings.push(format!(
            "Strategies disagree (confidence {:.2}); tempo may be ambiguous",
            confidence
        ));
    }

    if octave_corrected {
        warnings.push("Octave correction applied (half/double-time detection)".to_string());
    }

    warnings
}
