//! Autocorrelation tempogram and the periodicity scoring strategies
//!
//! The tempogram holds, for every envelope frame, the autocorrelation of a
//! Hann-windowed stretch of the envelope centred on that frame. Each frame is
//! normalised by its zero-lag value, so loud and quiet passages weigh the
//! same.
//!
//! Tempo scoring for a lag `l` (BPM = `60 * frame_rate / l`):
//!
//! ```text
//! score(l) = ln(1 + 1e6 * ac(l)) + log_prior(bpm(l))
//! ```
//!
//! Lags whose tempo is at or above `max_search_bpm` are excluded.
//!
//! # Reference
//!
//! Grosche, P., Müller, M., & Kurth, F. (2010). Cyclic Tempogram - A Mid-level
//! Tempo Representation for Music Signals. *ICASSP*.

use super::autocorrelation::{log_tempo_prior, Autocorrelator};
use super::peak_picking::{argmax_in, refine_peak};
use super::{StrategyInput, StrategyKind, TempoCandidate, TempoStrategy};
use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::features::onset::stft::hann_window;
use crate::features::onset::OnsetEnvelope;

const EPSILON: f32 = 1e-10;

/// Scale applied to autocorrelation values before log compression
const LOG_COMPRESSION: f32 = 1e6;

/// Local autocorrelation tempogram
#[derive(Debug, Clone)]
pub struct Tempogram {
    /// Normalised autocorrelation per envelope frame (`frames[t][lag]`)
    pub frames: Vec<Vec<f32>>,

    /// Whether frame `t` had any energy in its window
    pub active: Vec<bool>,

    /// Window length in frames (also the number of lags per frame)
    pub win_length: usize,

    /// Envelope frame rate in Hz
    pub frame_rate: f32,
}

impl Tempogram {
    /// Average autocorrelation over time
    pub fn mean_profile(&self) -> Vec<f32> {
        let mut profile = vec![0.0f32; self.win_length];
        if self.frames.is_empty() {
            return profile;
        }
        for frame in &self.frames {
            for (p, &v) in profile.iter_mut().zip(frame) {
                *p += v;
            }
        }
        let n = self.frames.len() as f32;
        profile.iter_mut().for_each(|p| *p /= n);
        profile
    }

    /// Tempo in BPM for a (fractional) lag
    pub fn lag_to_bpm(&self, lag: f32) -> f32 {
        60.0 * self.frame_rate / lag
    }
}

/// Compute the local autocorrelation tempogram of an envelope
///
/// # Arguments
///
/// * `envelope` - Onset strength envelope
/// * `win_length` - Window length in envelope frames (typically 384)
///
/// # Returns
///
/// One normalised autocorrelation row per envelope frame. The envelope is
/// zero-padded by `win_length / 2` on both sides so rows are centred.
///
/// # Errors
///
/// Returns `AnalysisError::InvalidInput` for an empty envelope or a window
/// shorter than 4 frames, and `AnalysisError::ProcessingError` for a flat
/// envelope.
pub fn autocorrelation_tempogram(
    envelope: &OnsetEnvelope,
    win_length: usize,
) -> Result<Tempogram, AnalysisError> {
    if envelope.is_empty() {
        return Err(AnalysisError::InvalidInput(
            "Empty onset envelope".to_string(),
        ));
    }

    if win_length < 4 {
        return Err(AnalysisError::InvalidInput(format!(
            "Tempogram window too small: {}",
            win_length
        )));
    }

    let (lo, hi) = envelope
        .values
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    if !(hi - lo > EPSILON * hi.abs().max(1.0)) {
        return Err(AnalysisError::ProcessingError(
            "Onset envelope is flat; no periodicity to measure".to_string(),
        ));
    }

    let n = envelope.len();
    let pad = win_length / 2;
    let mut padded = vec![0.0f32; n + 2 * pad];
    padded[pad..pad + n].copy_from_slice(&envelope.values);

    let window = hann_window(win_length);
    let mut autocorrelator = Autocorrelator::new(win_length);
    let mut segment = vec![0.0f32; win_length];

    let mut frames = Vec::with_capacity(n);
    let mut active = Vec::with_capacity(n);
    for t in 0..n {
        let end = (t + win_length).min(padded.len());
        segment.iter_mut().for_each(|s| *s = 0.0);
        for ((s, &x), &w) in segment.iter_mut().zip(&padded[t..end]).zip(&window) {
            *s = x * w;
        }

        let mut acf = autocorrelator.compute(&segment, win_length);
        let zero_lag = acf.first().copied().unwrap_or(0.0);
        if zero_lag > EPSILON && zero_lag.is_finite() {
            acf.iter_mut().for_each(|v| *v = (*v / zero_lag).max(0.0));
            active.push(true);
        } else {
            acf.iter_mut().for_each(|v| *v = 0.0);
            active.push(false);
        }
        frames.push(acf);
    }

    log::debug!(
        "Tempogram: {} frames x {} lags ({} active)",
        frames.len(),
        win_length,
        active.iter().filter(|&&a| a).count()
    );

    Ok(Tempogram {
        frames,
        active,
        win_length,
        frame_rate: envelope.frame_rate(),
    })
}

/// Score every lag of an autocorrelation profile
///
/// Lag 0 and lags at or above `max_search_bpm` score `-inf`.
pub fn score_lags(profile: &[f32], frame_rate: f32, config: &AnalysisConfig) -> Vec<f32> {
    profile
        .iter()
        .enumerate()
        .map(|(lag, &ac)| {
            if lag == 0 {
                return f32::NEG_INFINITY;
            }
            let bpm = 60.0 * frame_rate / lag as f32;
            if bpm >= config.max_search_bpm {
                return f32::NEG_INFINITY;
            }
            (LOG_COMPRESSION * ac.max(0.0)).ln_1p()
                + log_tempo_prior(bpm, config.prior_bpm, config.prior_spread)
        })
        .collect()
}

/// Best tempo of a scored lag curve, refined to a fractional lag
fn best_tempo(scores: &[f32], frame_rate: f32) -> Option<f32> {
    let best = argmax_in(scores, 1, scores.len())?;
    let lag = refine_peak(scores, best);
    if lag <= 0.0 {
        return None;
    }
    Some(60.0 * frame_rate / lag)
}

/// Best tempo of the time-averaged tempogram
///
/// Also seeds the beat tracker.
///
/// # Errors
///
/// Returns `AnalysisError::ProcessingError` if no frame had energy or the
/// winning lag carries no autocorrelation, and
/// `AnalysisError::NumericalError` for a non-finite tempo.
pub fn global_tempo(tempogram: &Tempogram, config: &AnalysisConfig) -> Result<f32, AnalysisError> {
    if !tempogram.active.iter().any(|&a| a) {
        return Err(AnalysisError::ProcessingError(
            "Tempogram has no active frames".to_string(),
        ));
    }

    let profile = tempogram.mean_profile();
    let scores = score_lags(&profile, tempogram.frame_rate, config);
    let best = argmax_in(&scores, 1, scores.len()).ok_or_else(|| {
        AnalysisError::ProcessingError("No tempo lag could be scored".to_string())
    })?;

    if profile[best] <= EPSILON {
        return Err(AnalysisError::ProcessingError(
            "Onset envelope shows no periodicity".to_string(),
        ));
    }

    let lag = refine_peak(&scores, best);
    let bpm = tempogram.lag_to_bpm(lag);
    if !(bpm.is_finite() && bpm > 0.0) {
        return Err(AnalysisError::NumericalError(format!(
            "Non-finite periodicity tempo: {}",
            bpm
        )));
    }

    log::debug!(
        "Global tempo: lag {:.2} frames ({:.2} BPM), mean autocorrelation {:.3}",
        lag,
        bpm,
        profile[best]
    );
    Ok(bpm)
}

/// Periodicity scoring with a tempo prior, aggregated over time
///
/// Scores the time-averaged tempogram and returns the single best tempo.
#[derive(Debug, Clone, Copy, Default)]
pub struct PeriodicityPriorStrategy;

impl TempoStrategy for PeriodicityPriorStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::PeriodicityPrior
    }

    fn estimate_from(
        &self,
        input: &StrategyInput<'_>,
        config: &AnalysisConfig,
    ) -> Result<TempoCandidate, AnalysisError> {
        let bpm = global_tempo(input.tempogram()?, config)?;
        log::debug!("Periodicity with prior: {:.2} BPM", bpm);
        Ok(TempoCandidate::single(self.kind(), bpm))
    }
}

/// Periodicity scoring with a tempo prior, one tempo per frame
///
/// Returns the unaggregated distribution: the best tempo of every tempogram
/// frame that had energy in its window.
#[derive(Debug, Clone, Copy, Default)]
pub struct PeriodicityDistributionStrategy;

impl TempoStrategy for PeriodicityDistributionStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::PeriodicityDistribution
    }

    fn estimate_from(
        &self,
        input: &StrategyInput<'_>,
        config: &AnalysisConfig,
    ) -> Result<TempoCandidate, AnalysisError> {
        let tempogram = input.tempogram()?;

        let tempos: Vec<f32> = tempogram
            .frames
            .iter()
            .zip(&tempogram.active)
            .filter(|(_, active)| **active)
            .filter_map(|(frame, _)| {
                let scores = score_lags(frame, tempogram.frame_rate, config);
                best_tempo(&scores, tempogram.frame_rate)
            })
            .filter(|bpm| bpm.is_finite())
            .collect();

        log::debug!("Periodicity distribution: {} per-frame tempos", tempos.len());

        Ok(TempoCandidate::distribution(self.kind(), tempos))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::period::CandidateValue;

    fn pulse_envelope(period_frames: f32, n_frames: usize) -> OnsetEnvelope {
        let mut values = vec![0.0f32; n_frames];
        let mut t = 0.0f32;
        while (t.round() as usize) < n_frames {
            let idx = t.round() as usize;
            values[idx] = 1.0;
            if idx + 1 < n_frames {
                values[idx + 1] = 0.4;
            }
            if idx >= 1 {
                values[idx - 1] = values[idx - 1].max(0.2);
            }
            t += period_frames;
        }
        OnsetEnvelope {
            values,
            hop_length: 512,
            sample_rate: 22050,
        }
    }

    #[test]
    fn test_tempogram_shape_and_normalisation() {
        let env = pulse_envelope(21.533, 300);
        let tg = autocorrelation_tempogram(&env, 128).unwrap();
        assert_eq!(tg.frames.len(), 300);
        assert!(tg.frames.iter().all(|f| f.len() == 128));
        for (frame, &active) in tg.frames.iter().zip(&tg.active) {
            if active {
                assert!((frame[0] - 1.0).abs() < 1e-4);
                assert!(frame.iter().all(|&v| (0.0..=1.0 + 1e-4).contains(&v)));
            }
        }
    }

    #[test]
    fn test_score_excludes_fast_lags() {
        let profile = vec![1.0f32; 50];
        let scores = score_lags(&profile, 43.066, &AnalysisConfig::default());
        assert_eq!(scores[0], f32::NEG_INFINITY);
        // Lag 8 is 323 BPM, above the 320 BPM search ceiling
        assert_eq!(scores[8], f32::NEG_INFINITY);
        assert!(scores[9].is_finite());
    }

    #[test]
    fn test_prior_strategy_finds_120bpm() {
        let env = pulse_envelope(21.533, 646);
        let candidate = PeriodicityPriorStrategy
            .estimate(&env, &AnalysisConfig::default())
            .unwrap();
        match candidate.value {
            CandidateValue::Single(bpm) => {
                assert!((bpm - 120.0).abs() < 3.0, "got {:.2} BPM", bpm)
            }
            other => panic!("expected a single value, got {:?}", other),
        }
        assert_eq!(candidate.kind, StrategyKind::PeriodicityPrior);
    }

    #[test]
    fn test_distribution_strategy_clusters_near_tempo() {
        let env = pulse_envelope(21.533, 646);
        let candidate = PeriodicityDistributionStrategy
            .estimate(&env, &AnalysisConfig::default())
            .unwrap();
        let tempos = match candidate.value {
            CandidateValue::Distribution(values) => values,
            other => panic!("expected a distribution, got {:?}", other),
        };
        assert!(!tempos.is_empty());
        let near = tempos.iter().filter(|&&b| (b - 120.0).abs() < 4.0).count();
        assert!(
            near * 10 >= tempos.len() * 8,
            "{} of {} frames near 120 BPM",
            near,
            tempos.len()
        );
    }

    #[test]
    fn test_silent_envelope_is_an_error() {
        let env = OnsetEnvelope {
            values: vec![0.0; 646],
            hop_length: 512,
            sample_rate: 22050,
        };
        let config = AnalysisConfig::default();
        assert!(PeriodicityPriorStrategy.estimate(&env, &config).is_err());
        assert!(PeriodicityDistributionStrategy.estimate(&env, &config).is_err());
    }

    #[test]
    fn test_flat_envelope_is_an_error() {
        let env = OnsetEnvelope {
            values: vec![0.3; 646],
            hop_length: 512,
            sample_rate: 22050,
        };
        let config = AnalysisConfig::default();
        assert!(matches!(
            PeriodicityPriorStrategy.estimate(&env, &config),
            Err(AnalysisError::ProcessingError(_))
        ));
        assert!(PeriodicityDistributionStrategy.estimate(&env, &config).is_err());
    }

    #[test]
    fn test_global_tempo_needs_active_frames() {
        let tg = Tempogram {
            frames: vec![vec![0.0; 64]; 10],
            active: vec![false; 10],
            win_length: 64,
            frame_rate: 43.066,
        };
        assert!(matches!(
            global_tempo(&tg, &AnalysisConfig::default()),
            Err(AnalysisError::ProcessingError(_))
        ));
    }

    #[test]
    fn test_global_tempo_between_integer_lags() {
        // 140 BPM: 18.46 frames per beat, split across lags 18 and 19
        let period = 60.0 * 22050.0 / 512.0 / 140.0;
        let env = pulse_envelope(period, 646);
        let tg = autocorrelation_tempogram(&env, 384).unwrap();
        let bpm = global_tempo(&tg, &AnalysisConfig::default()).unwrap();
        assert!((bpm - 140.0).abs() < 4.0, "got {:.2} BPM", bpm);
    }

    #[test]
    fn test_empty_envelope_rejected() {
        let env = OnsetEnvelope {
            values: vec![],
            hop_length: 512,
            sample_rate: 22050,
        };
        assert!(autocorrelation_tempogram(&env, 384).is_err());
    }
}
