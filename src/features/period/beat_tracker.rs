//! Dynamic-programming beat tracker
//!
//! Finds the beat sequence that best balances two goals: beats should land on
//! strong onsets, and successive beats should be close to a target period.
//!
//! # Algorithm
//!
//! 1. Start period from the prior-weighted tempogram (see [`global_tempo`])
//! 2. Local score: envelope / std, smoothed with a narrow Gaussian
//! 3. Cumulative score: `C[i] = local[i] + max_j (C[j] - tightness * ln((i - j) / p)²)`
//!    over predecessors `j ∈ [i - 2p, i - p/2]`
//! 4. Backtrack from the last strong peak of `C`
//! 5. Trim weak leading and trailing beats
//! 6. Tempo from the least-squares beat spacing
//!
//! # Reference
//!
//! Ellis, D. P. W. (2007). Beat Tracking by Dynamic Programming.
//! *Journal of New Music Research*, 36(1), 51-60.

use super::peak_picking::local_maxima;
use super::tempogram::{global_tempo, Tempogram};
use super::{StrategyInput, StrategyKind, TempoCandidate, TempoStrategy};
use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::features::onset::OnsetEnvelope;
use crate::features::stats::{mean, median};

const EPSILON: f32 = 1e-10;

/// Minimum number of beats needed to derive a tempo
const MIN_BEATS: usize = 3;

/// Beat tracking result
#[derive(Debug, Clone)]
pub struct BeatTrack {
    /// Beat positions in envelope frames, increasing
    pub beats: Vec<usize>,

    /// Tempo implied by the beat spacing
    pub bpm: f32,
}

/// Track beats in an onset envelope
///
/// # Arguments
///
/// * `envelope` - Onset strength envelope
/// * `tempogram` - Tempogram of `envelope`, used to seed the period
/// * `config` - Uses the tempo prior, search range and `tightness`
///
/// # Returns
///
/// Beat frames and the tempo they imply
///
/// # Errors
///
/// Returns `AnalysisError::ProcessingError` if the envelope is too short or
/// flat, or fewer than 3 beats survive trimming, and
/// `AnalysisError::NumericalError` if the beat spacing is degenerate.
pub fn track_beats(
    envelope: &OnsetEnvelope,
    tempogram: &Tempogram,
    config: &AnalysisConfig,
) -> Result<BeatTrack, AnalysisError> {
    let period = envelope.bpm_to_lag(global_tempo(tempogram, config)?);

    let std = sample_std(&envelope.values);
    if std <= EPSILON {
        return Err(AnalysisError::ProcessingError(
            "Onset envelope is flat; cannot track beats".to_string(),
        ));
    }

    let normalised: Vec<f32> = envelope.values.iter().map(|v| v / std).collect();
    let local = local_score(&normalised, period);
    let (cumulative, backlink) = cumulative_score(&local, period, config.tightness);

    let last = last_beat(&cumulative).ok_or_else(|| {
        AnalysisError::ProcessingError("No beat candidates in cumulative score".to_string())
    })?;

    let mut beats = vec![last];
    while let Some(prev) = backlink[beats[beats.len() - 1]] {
        beats.push(prev);
    }
    beats.reverse();

    let beats = trim_beats(&local, beats);

    log::debug!(
        "Beat tracker: start period {:.2} frames, {} beats after trimming",
        period,
        beats.len()
    );

    if beats.len() < MIN_BEATS {
        return Err(AnalysisError::ProcessingError(format!(
            "Too few beats to estimate tempo: {}",
            beats.len()
        )));
    }

    let spacing = beat_spacing(&beats);
    if !(spacing.is_finite() && spacing > EPSILON) {
        return Err(AnalysisError::NumericalError(format!(
            "Degenerate beat spacing: {}",
            spacing
        )));
    }

    let bpm = envelope.lag_to_bpm(spacing);
    log::debug!("Beat tracker: spacing {:.3} frames -> {:.2} BPM", spacing, bpm);

    Ok(BeatTrack { beats, bpm })
}

/// Sample standard deviation (divides by `n - 1`)
fn sample_std(values: &[f32]) -> f32 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let ss: f32 = values.iter().map(|v| (v - m) * (v - m)).sum();
    (ss / (values.len() - 1) as f32).sqrt()
}

/// Smooth the envelope with a Gaussian of width `period / 32`, same length
fn local_score(envelope: &[f32], period: f32) -> Vec<f32> {
    let half = period.round().max(1.0) as isize;
    let kernel: Vec<f32> = (-half..=half)
        .map(|k| (-0.5 * (k as f32 * 32.0 / period).powi(2)).exp())
        .collect();

    let n = envelope.len() as isize;
    (0..n)
        .map(|i| {
            kernel
                .iter()
                .zip(-half..=half)
                .filter_map(|(&w, k)| {
                    let j = i - k;
                    (0..n).contains(&j).then(|| w * envelope[j as usize])
                })
                .sum()
        })
        .collect()
}

/// Forward pass of the dynamic program
///
/// Returns the cumulative score and, for each frame, the best preceding beat
/// (`None` before the first beat).
fn cumulative_score(local: &[f32], period: f32, tightness: f32) -> (Vec<f32>, Vec<Option<usize>>) {
    let n = local.len();
    let min_gap = (period / 2.0).round().max(1.0) as usize;
    let max_gap = (2.0 * period).round().max(min_gap as f32) as usize;
    let threshold = 0.01 * local.iter().copied().fold(0.0f32, f32::max);

    let mut cumulative = vec![0.0f32; n];
    let mut backlink = vec![None; n];
    let mut first_beat = true;

    for i in 0..n {
        let mut best: Option<(usize, f32)> = None;
        for gap in min_gap..=max_gap {
            if gap > i {
                break;
            }
            let j = i - gap;
            let penalty = tightness * (gap as f32 / period).ln().powi(2);
            let score = cumulative[j] - penalty;
            if best.map_or(true, |(_, s)| score > s) {
                best = Some((j, score));
            }
        }

        cumulative[i] = local[i] + best.map_or(0.0, |(_, s)| s);

        if first_beat && local[i] < threshold {
            backlink[i] = None;
        } else {
            backlink[i] = best.map(|(j, _)| j);
            first_beat = false;
        }
    }

    (cumulative, backlink)
}

/// Last local maximum of the cumulative score above half the median peak
fn last_beat(cumulative: &[f32]) -> Option<usize> {
    let peaks = local_maxima(cumulative);
    if peaks.is_empty() {
        return None;
    }
    let peak_values: Vec<f32> = peaks.iter().map(|&p| cumulative[p]).collect();
    let threshold = 0.5 * median(&peak_values);
    peaks.into_iter().rev().find(|&p| cumulative[p] >= threshold)
}

/// Drop weak beats at both ends of the sequence
///
/// Beat strength is the local score at each beat smoothed over neighbouring
/// beats; beats at or below half its RMS are removed from the edges.
fn trim_beats(local: &[f32], beats: Vec<usize>) -> Vec<usize> {
    if beats.len() < 2 {
        return beats;
    }

    let strength: Vec<f32> = beats.iter().map(|&b| local[b]).collect();
    let smoothed: Vec<f32> = (0..strength.len())
        .map(|i| {
            let left = if i > 0 { strength[i - 1] } else { 0.0 };
            let right = strength.get(i + 1).copied().unwrap_or(0.0);
            0.5 * left + strength[i] + 0.5 * right
        })
        .collect();

    let rms = (smoothed.iter().map(|s| s * s).sum::<f32>() / smoothed.len() as f32).sqrt();
    let threshold = 0.5 * rms;

    let first = smoothed.iter().position(|&s| s > threshold);
    let last = smoothed.iter().rposition(|&s| s > threshold);
    match (first, last) {
        (Some(first), Some(last)) => beats[first..=last].to_vec(),
        _ => beats,
    }
}

/// Least-squares slope of beat frame against beat index
fn beat_spacing(beats: &[usize]) -> f32 {
    let n = beats.len() as f32;
    let mean_x = (n - 1.0) / 2.0;
    let mean_y = beats.iter().map(|&b| b as f32).sum::<f32>() / n;

    let mut num = 0.0f32;
    let mut den = 0.0f32;
    for (i, &b) in beats.iter().enumerate() {
        let dx = i as f32 - mean_x;
        num += dx * (b as f32 - mean_y);
        den += dx * dx;
    }

    if den <= 0.0 {
        return 0.0;
    }
    num / den
}

/// Direct beat tracking strategy
#[derive(Debug, Clone, Copy, Default)]
pub struct BeatTrackStrategy;

impl TempoStrategy for BeatTrackStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::BeatTrack
    }

    fn estimate_from(
        &self,
        input: &StrategyInput<'_>,
        config: &AnalysisConfig,
    ) -> Result<TempoCandidate, AnalysisError> {
        let track = track_beats(input.envelope(), input.tempogram()?, config)?;
        Ok(TempoCandidate::single(self.kind(), track.bpm))
    }
}
