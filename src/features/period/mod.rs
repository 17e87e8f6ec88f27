//! Tempo estimation strategies
//!
//! Derive BPM candidates from an onset envelope using independent,
//! complementary strategies:
//! - Direct beat tracking (dynamic programming)
//! - Periodicity scoring with a tempo prior, aggregated over time
//! - Periodicity scoring with a tempo prior, full per-frame distribution
//!
//! Each strategy is a stateless type implementing [`TempoStrategy`], so
//! strategies can be enabled, disabled and tested on their own. The
//! tempogram they share is computed once per [`StrategyInput`].

pub mod autocorrelation;
pub mod beat_tracker;
pub mod peak_picking;
pub mod tempogram;

pub use beat_tracker::BeatTrackStrategy;
pub use tempogram::{PeriodicityDistributionStrategy, PeriodicityPriorStrategy};

use std::cell::OnceCell;

use serde::{Deserialize, Serialize};

use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::features::onset::OnsetEnvelope;
use tempogram::{autocorrelation_tempogram, Tempogram};

/// Which strategy produced a candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// Direct beat tracking; always computed
    BeatTrack,

    /// Periodicity scoring with a prior, one aggregated tempo
    PeriodicityPrior,

    /// Periodicity scoring with a prior, one tempo per frame
    PeriodicityDistribution,
}

impl StrategyKind {
    /// Stable name used in logs and result metadata
    pub fn name(&self) -> &'static str {
        match self {
            StrategyKind::BeatTrack => "beat_track",
            StrategyKind::PeriodicityPrior => "periodicity_prior",
            StrategyKind::PeriodicityDistribution => "periodicity_distribution",
        }
    }
}

impl std::fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A strategy's output: one tempo or a distribution of tempos
#[derive(Debug, Clone, PartialEq)]
pub enum CandidateValue {
    /// A single tempo in BPM
    Single(f32),

    /// Unaggregated tempos in BPM (may contain out-of-band values)
    Distribution(Vec<f32>),
}

/// One strategy's raw BPM output before reconciliation
#[derive(Debug, Clone, PartialEq)]
pub struct TempoCandidate {
    /// Producing strategy
    pub kind: StrategyKind,

    /// Tempo value(s)
    pub value: CandidateValue,
}

impl TempoCandidate {
    /// Candidate carrying a single tempo
    pub fn single(kind: StrategyKind, bpm: f32) -> Self {
        Self {
            kind,
            value: CandidateValue::Single(bpm),
        }
    }

    /// Candidate carrying a distribution of tempos
    pub fn distribution(kind: StrategyKind, bpms: Vec<f32>) -> Self {
        Self {
            kind,
            value: CandidateValue::Distribution(bpms),
        }
    }
}

/// Onset envelope plus the derived features strategies share
///
/// The tempogram is computed on first use and reused by every later caller,
/// including its error.
#[derive(Debug)]
pub struct StrategyInput<'a> {
    envelope: &'a OnsetEnvelope,
    win_length: usize,
    tempogram: OnceCell<Result<Tempogram, AnalysisError>>,
}

impl<'a> StrategyInput<'a> {
    /// Wrap `envelope`; the tempogram window comes from `config`
    pub fn new(envelope: &'a OnsetEnvelope, config: &AnalysisConfig) -> Self {
        Self {
            envelope,
            win_length: config.tempogram_window,
            tempogram: OnceCell::new(),
        }
    }

    /// The onset envelope
    pub fn envelope(&self) -> &'a OnsetEnvelope {
        self.envelope
    }

    /// Local autocorrelation tempogram of the envelope
    ///
    /// # Errors
    ///
    /// Whatever [`autocorrelation_tempogram`] returned on the first call.
    pub fn tempogram(&self) -> Result<&Tempogram, AnalysisError> {
        self.tempogram
            .get_or_init(|| autocorrelation_tempogram(self.envelope, self.win_length))
            .as_ref()
            .map_err(|e| e.clone())
    }
}

/// A tempo estimation strategy over an onset envelope
///
/// Implementations hold no mutable state and may be shared across threads.
pub trait TempoStrategy: Send + Sync {
    /// Kind tag attached to every candidate this strategy produces
    fn kind(&self) -> StrategyKind;

    /// Strategy name for logs
    fn name(&self) -> &'static str {
        self.kind().name()
    }

    /// Estimate tempo from a shared strategy input
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError` on a degenerate envelope or numeric failure;
    /// never a silent wrong answer.
    fn estimate_from(
        &self,
        input: &StrategyInput<'_>,
        config: &AnalysisConfig,
    ) -> Result<TempoCandidate, AnalysisError>;

    /// Estimate tempo from `envelope` alone
    fn estimate(
        &self,
        envelope: &OnsetEnvelope,
        config: &AnalysisConfig,
    ) -> Result<TempoCandidate, AnalysisError> {
        self.estimate_from(&StrategyInput::new(envelope, config), config)
    }
}

/// Strategies enabled by `config`, beat tracking first
pub fn strategies_for(config: &AnalysisConfig) -> Vec<Box<dyn TempoStrategy>> {
    let mut strategies: Vec<Box<dyn TempoStrategy>> = vec![Box::new(BeatTrackStrategy)];
    if config.enable_periodicity_prior {
        strategies.push(Box::new(PeriodicityPriorStrategy));
    }
    if config.enable_periodicity_distribution {
        strategies.push(Box::new(PeriodicityDistributionStrategy));
    }
    strategies
}

/// True if `bpm` lies in the closed band `[min_bpm, max_bpm]`
pub fn in_band(bpm: f32, min_bpm: f32, max_bpm: f32) -> bool {
    bpm.is_finite() && bpm >= min_bpm && bpm <= max_bpm
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_band_is_closed() {
        assert!(in_band(60.0, 60.0, 200.0));
        assert!(in_band(200.0, 60.0, 200.0));
        assert!(!in_band(59.99, 60.0, 200.0));
        assert!(!in_band(f32::NAN, 60.0, 200.0));
    }

    #[test]
    fn test_tempogram_is_computed_once() {
        let envelope = OnsetEnvelope {
            values: (0..400).map(|i| if i % 20 == 0 { 1.0 } else { 0.0 }).collect(),
            hop_length: 512,
            sample_rate: 22050,
        };
        let input = StrategyInput::new(&envelope, &AnalysisConfig::default());
        let first = input.tempogram().unwrap();
        let second = input.tempogram().unwrap();
        assert!(std::ptr::eq(first, second));
    }

    #[test]
    fn test_tempogram_error_is_shared() {
        let envelope = OnsetEnvelope {
            values: vec![0.0; 400],
            hop_length: 512,
            sample_rate: 22050,
        };
        let input = StrategyInput::new(&envelope, &AnalysisConfig::default());
        assert!(input.tempogram().is_err());
        assert_eq!(input.tempogram().unwrap_err(), input.tempogram().unwrap_err());
    }

    #[test]
    fn test_strategies_follow_config() {
        let all = strategies_for(&AnalysisConfig::default());
        let kinds: Vec<StrategyKind> = all.iter().map(|s| s.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                StrategyKind::BeatTrack,
                StrategyKind::PeriodicityPrior,
                StrategyKind::PeriodicityDistribution
            ]
        );

        let config = AnalysisConfig {
            enable_periodicity_prior: false,
            enable_periodicity_distribution: false,
            ..AnalysisConfig::default()
        };
        let only = strategies_for(&config);
        assert_eq!(only.len(), 1);
        assert_eq!(only[0].name(), "beat_track");
    }
}
