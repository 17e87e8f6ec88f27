//! Pipeline instrumentation hooks
//!
//! The analysis pipeline reports each stage to a [`PipelineObserver`]. The
//! default observer does nothing; [`LogObserver`] forwards a summary of every
//! stage to the `log` facade.
//!
//! # Example
//!
//! ```no_run
//! use tempo_dsp::observer::LogObserver;
//! use tempo_dsp::{analyze_audio_with_observer, AnalysisConfig};
//!
//! let samples = vec![0.0f32; 44100 * 15];
//! let estimate = analyze_audio_with_observer(&samples, 44100, AnalysisConfig::default(), &LogObserver)?;
//! # Ok::<(), tempo_dsp::AnalysisError>(())
//! ```

use crate::analysis::result::TempoEstimate;
use crate::error::AnalysisError;
use crate::features::onset::OnsetEnvelope;
use crate::features::period::{CandidateValue, TempoCandidate};
use crate::io::Waveform;

/// A pipeline stage and the data it produced
#[derive(Debug)]
pub enum PipelineEvent<'a> {
    /// Input passed validation
    InputAccepted {
        /// Number of input samples
        samples: usize,
        /// Input sample rate in Hz
        sample_rate: u32,
    },

    /// Waveform is truncated and resampled, ready for analysis
    Prepared {
        /// Waveform that will be analysed
        waveform: &'a Waveform,
        /// True if the input was cut to the maximum analysis duration
        truncated: bool,
        /// True if the waveform was resampled
        resampled: bool,
    },

    /// Onset envelope computed
    EnvelopeReady(&'a OnsetEnvelope),

    /// One strategy produced a candidate
    CandidateProduced(&'a TempoCandidate),

    /// Final estimate ready
    Reconciled(&'a TempoEstimate),

    /// The pipeline stopped with an error
    Failed(&'a AnalysisError),
}

/// Receives pipeline stage events
///
/// Observers must not panic; they run inline on the analysis thread.
pub trait PipelineObserver {
    /// Called once per stage, in pipeline order
    fn on_event(&self, event: &PipelineEvent<'_>);
}

/// Observer that ignores every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl PipelineObserver for NoopObserver {
    fn on_event(&self, _event: &PipelineEvent<'_>) {}
}

/// Observer that logs each stage through the `log` facade
#[derive(Debug, Clone, Copy, Default)]
pub struct LogObserver;

impl PipelineObserver for LogObserver {
    fn on_event(&self, event: &PipelineEvent<'_>) {
        match event {
            PipelineEvent::InputAccepted {
                samples,
                sample_rate,
            } => {
                log::info!(
                    "Analysing {} samples at {} Hz ({:.2}s)",
                    samples,
                    sample_rate,
                    *samples as f32 / *sample_rate as f32
                );
            }
            PipelineEvent::Prepared {
                waveform,
                truncated,
                resampled,
            } => {
                log::info!(
                    "Prepared {:.2}s at {} Hz (truncated: {}, resampled: {})",
                    waveform.duration_seconds(),
                    waveform.sample_rate(),
                    truncated,
                    resampled
                );
            }
            PipelineEvent::EnvelopeReady(envelope) => {
                log::info!(
                    "Onset envelope: {} frames at {:.2} fps",
                    envelope.len(),
                    envelope.frame_rate()
                );
            }
            PipelineEvent::CandidateProduced(candidate) => match &candidate.value {
                CandidateValue::Single(bpm) => {
                    log::info!("{}: {:.2} BPM", candidate.kind, bpm);
                }
                CandidateValue::Distribution(bpms) => {
                    log::info!("{}: {} per-frame tempos", candidate.kind, bpms.len());
                }
            },
            PipelineEvent::Reconciled(estimate) => {
                log::info!(
                    "Tempo {:.2} BPM (confidence {:.2}) in {:.1} ms",
                    estimate.bpm,
                    estimate.confidence,
                    estimate.metadata.processing_time_ms
                );
            }
            PipelineEvent::Failed(err) => {
                log::warn!("Analysis failed: {}", err);
            }
        }
    }
}
