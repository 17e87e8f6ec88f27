//! Estimate reconciliation
//!
//! Combines the strategy candidates into one tempo with a confidence score.
//!
//! # Algorithm
//!
//! 1. One value per strategy slot. The distribution slot keeps only in-band
//!    tempos and takes their mean; if none remain it falls back to the beat
//!    tracker's value with zero dispersion.
//! 2. Qualifying values: slots inside `[min_bpm, max_bpm]`. If none qualify,
//!    the unfiltered beat tracker value is used alone.
//! 3. Tempo: median of the qualifying values.
//! 4. Confidence: variance-based agreement (0.7 for a single value).
//! 5. Octave correction, once: below the band doubles, above halves.
//! 6. Round tempo and confidence to two decimals.
//!
//! # Example
//!
//! ```
//! use tempo_dsp::analysis::reconcile::combine;
//! use tempo_dsp::AnalysisConfig;
//!
//! let combined = combine(&[118.0, 120.0, 160.0], &AnalysisConfig::default())?;
//! assert_eq!(combined.bpm, 120.0);
//! # Ok::<(), tempo_dsp::AnalysisError>(())
//! ```

use super::confidence::agreement_confidence;
use super::metadata::OctaveCorrection;
use super::result::round2;
use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::features::period::{in_band, CandidateValue, StrategyKind, TempoCandidate};
use crate::features::stats::{mean, median, std_dev};

/// Median, confidence and octave correction of a set of tempos
#[derive(Debug, Clone, PartialEq)]
pub struct CombinedTempo {
    /// Tempo in BPM, octave-corrected and rounded
    pub bpm: f32,

    /// Agreement confidence, rounded
    pub confidence: f32,

    /// Correction applied to the median, if any
    pub octave_correction: Option<OctaveCorrection>,
}

/// Full reconciliation outcome
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation {
    /// Tempo, confidence and correction
    pub combined: CombinedTempo,

    /// Beat tracking slot value (unrounded)
    pub beat_track_bpm: f32,

    /// Periodicity-with-prior slot value, if that strategy ran
    pub periodicity_prior_bpm: Option<f32>,

    /// Periodicity distribution slot value, if that strategy ran
    pub periodicity_distribution_bpm: Option<f32>,

    /// Standard deviation of the in-band per-frame tempos (0 on fallback)
    pub distribution_dispersion: Option<f32>,

    /// Number of slot values inside the band
    pub qualifying: usize,

    /// True if no slot qualified and the raw beat-track value was used
    pub used_fallback: bool,
}

/// Apply single-pass octave correction
///
/// Below `min_bpm` the tempo is doubled, above `max_bpm` it is halved. The
/// result is not re-checked.
pub fn correct_octave(bpm: f32, min_bpm: f32, max_bpm: f32) -> (f32, Option<OctaveCorrection>) {
    if bpm < min_bpm {
        (bpm * 2.0, Some(OctaveCorrection::Doubled))
    } else if bpm > max_bpm {
        (bpm / 2.0, Some(OctaveCorrection::Halved))
    } else {
        (bpm, None)
    }
}

/// Combine qualifying tempos into one rounded value
///
/// # Errors
///
/// Returns `AnalysisError::ProcessingError` for an empty set and
/// `AnalysisError::NumericalError` for non-finite or non-positive values.
pub fn combine(values: &[f32], config: &AnalysisConfig) -> Result<CombinedTempo, AnalysisError> {
    if values.is_empty() {
        return Err(AnalysisError::ProcessingError(
            "No tempo candidates to combine".to_string(),
        ));
    }

    if let Some(bad) = values.iter().find(|v| !(v.is_finite() && **v > 0.0)) {
        return Err(AnalysisError::NumericalError(format!(
            "Invalid tempo candidate: {}",
            bad
        )));
    }

    let centre = median(values);
    let confidence = agreement_confidence(values);
    let (bpm, octave_correction) = correct_octave(centre, config.min_bpm, config.max_bpm);

    if let Some(correction) = octave_correction {
        log::debug!(
            "Octave correction {:?}: {:.2} -> {:.2} BPM",
            correction,
            centre,
            bpm
        );
    }

    Ok(CombinedTempo {
        bpm: round2(bpm),
        confidence: round2(confidence),
        octave_correction,
    })
}

/// Reconcile strategy candidates into one tempo
///
/// # Arguments
///
/// * `candidates` - Strategy outputs; must include a beat tracking candidate
/// * `config` - Uses `min_bpm` and `max_bpm`
///
/// # Errors
///
/// Returns `AnalysisError::ProcessingError` if the beat tracking candidate is
/// missing, plus anything [`combine`] returns.
pub fn reconcile(
    candidates: &[TempoCandidate],
    config: &AnalysisConfig,
) -> Result<Reconciliation, AnalysisError> {
    let (min_bpm, max_bpm) = (config.min_bpm, config.max_bpm);

    let beat_track_bpm = candidates
        .iter()
        .find(|c| c.kind == StrategyKind::BeatTrack)
        .and_then(|c| match c.value {
            CandidateValue::Single(bpm) => Some(bpm),
            CandidateValue::Distribution(_) => None,
        })
        .ok_or_else(|| {
            AnalysisError::ProcessingError("Beat tracking candidate is missing".to_string())
        })?;

    let mut periodicity_prior_bpm = None;
    let mut periodicity_distribution_bpm = None;
    let mut distribution_dispersion = None;

    for candidate in candidates {
        match (&candidate.kind, &candidate.value) {
            (StrategyKind::PeriodicityPrior, CandidateValue::Single(bpm)) => {
                periodicity_prior_bpm = Some(*bpm);
            }
            (StrategyKind::PeriodicityDistribution, CandidateValue::Distribution(bpms)) => {
                let in_band_bpms: Vec<f32> = bpms
                    .iter()
                    .copied()
                    .filter(|&b| in_band(b, min_bpm, max_bpm))
                    .collect();

                log::debug!(
                    "Distribution slot: {} of {} tempos in band",
                    in_band_bpms.len(),
                    bpms.len()
                );

                if in_band_bpms.is_empty() {
                    periodicity_distribution_bpm = Some(beat_track_bpm);
                    distribution_dispersion = Some(0.0);
                } else {
                    periodicity_distribution_bpm = Some(mean(&in_band_bpms));
                    distribution_dispersion = Some(std_dev(&in_band_bpms));
                }
            }
            (StrategyKind::PeriodicityDistribution, CandidateValue::Single(bpm)) => {
                periodicity_distribution_bpm = Some(*bpm);
            }
            _ => {}
        }
    }

    let slots = [
        Some(beat_track_bpm),
        periodicity_prior_bpm,
        periodicity_distribution_bpm,
    ];
    let mut qualifying: Vec<f32> = slots
        .iter()
        .flatten()
        .copied()
        .filter(|&b| in_band(b, min_bpm, max_bpm))
        .collect();

    let used_fallback = qualifying.is_empty();
    let qualifying_count = qualifying.len();
    if used_fallback {
        log::warn!(
            "No candidate in [{:.0}, {:.0}] BPM; falling back to beat tracking ({:.2})",
            min_bpm,
            max_bpm,
            beat_track_bpm
        );
        qualifying.push(beat_track_bpm);
    }

    qualifying.sort_by(|a, b| a.total_cmp(b));
    let combined = combine(&qualifying, config)?;

    log::debug!(
        "Reconciled {:?} -> {:.2} BPM (confidence {:.2})",
        qualifying,
        combined.bpm,
        combined.confidence
    );

    Ok(Reconciliation {
        combined,
        beat_track_bpm,
        periodicity_prior_bpm,
        periodicity_distribution_bpm,
        distribution_dispersion,
        qualifying: qualifying_count,
        used_fallback,
    })
}
