//! # Tempo DSP
//!
//! Tempo (BPM) estimation for audio files, with a confidence score and
//! octave-error correction.
//!
//! ## Features
//!
//! - **Onset envelope**: log-mel spectral flux with median aggregation
//! - **Three tempo strategies**: dynamic-programming beat tracking plus two
//!   tempogram periodicity scorers with a log-normal tempo prior
//! - **Reconciliation**: median of in-band candidates, agreement-based
//!   confidence, single-pass half/double-time correction
//! - **Decoding**: MP3, WAV, FLAC, OGG, M4A, AIFF via Symphonia
//! - **HTTP service** (feature `server`): upload endpoint returning JSON
//!
//! ## Quick Start
//!
//! ```no_run
//! use tempo_dsp::{analyze_audio, AnalysisConfig};
//!
//! // Mono samples, f32, normalized
//! let samples: Vec<f32> = vec![]; // Your audio data
//! let sample_rate = 44100;
//!
//! let estimate = analyze_audio(&samples, sample_rate, AnalysisConfig::default())?;
//! println!("BPM: {:.2} (confidence: {:.2})", estimate.bpm, estimate.confidence);
//! # Ok::<(), tempo_dsp::AnalysisError>(())
//! ```
//!
//! ## Architecture
//!
//! ```text
//! Waveform → Truncate / Resample → Onset Envelope → Strategies (A, B, C) → Reconcile → TempoEstimate
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod analysis;
pub mod config;
pub mod error;
pub mod features;
pub mod io;
pub mod observer;
pub mod preprocessing;

#[cfg(feature = "server")]
pub mod server;

use std::path::Path;
use std::time::Instant;

// Re-export main types
pub use analysis::metadata::{AnalysisMetadata, OctaveCorrection};
pub use analysis::result::TempoEstimate;
pub use config::AnalysisConfig;
pub use error::AnalysisError;
pub use features::onset::{Aggregation, OnsetEnvelope};
pub use features::period::{
    CandidateValue, StrategyInput, StrategyKind, TempoCandidate, TempoStrategy,
};
pub use io::Waveform;
pub use observer::{LogObserver, NoopObserver, PipelineEvent, PipelineObserver};

use analysis::confidence::confidence_warnings;
use analysis::reconcile::reconcile;
use analysis::result::round2;
use features::onset::onset_strength;
use features::period::strategies_for;
use preprocessing::resample::resample;
use preprocessing::silence::SilenceDetector;

/// Main analysis function
///
/// Estimates the tempo of mono audio samples.
///
/// # Arguments
///
/// * `samples` - Mono audio samples, normalized to [-1.0, 1.0]
/// * `sample_rate` - Sample rate in Hz (typically 44100 or 48000)
/// * `config` - Analysis configuration parameters
///
/// # Returns
///
/// `TempoEstimate` with the reconciled BPM, confidence and per-strategy tempos
///
/// # Errors
///
/// Returns `AnalysisError::InvalidInput` for empty input, a zero sample rate
/// or an invalid configuration, and `AnalysisError::ProcessingError` /
/// `AnalysisError::NumericalError` if the audio is silent or no tempo can be
/// derived.
///
/// # Example
///
/// ```no_run
/// use tempo_dsp::{analyze_audio, AnalysisConfig};
///
/// let samples = vec![0.0f32; 44100 * 30];
/// let estimate = analyze_audio(&samples, 44100, AnalysisConfig::default())?;
/// # Ok::<(), tempo_dsp::AnalysisError>(())
/// ```
pub fn analyze_audio(
    samples: &[f32],
    sample_rate: u32,
    config: AnalysisConfig,
) -> Result<TempoEstimate, AnalysisError> {
    analyze_audio_with_observer(samples, sample_rate, config, &NoopObserver)
}

/// Like [`analyze_audio`], reporting every stage to `observer`
pub fn analyze_audio_with_observer(
    samples: &[f32],
    sample_rate: u32,
    config: AnalysisConfig,
    observer: &dyn PipelineObserver,
) -> Result<TempoEstimate, AnalysisError> {
    let result = Waveform::new(samples.to_vec(), sample_rate)
        .and_then(|waveform| run_pipeline(waveform, false, &config, observer));

    if let Err(err) = &result {
        observer.on_event(&PipelineEvent::Failed(err));
    }
    result
}

/// Decode an audio file and estimate its tempo
///
/// Decoding stops at `config.max_analysis_seconds`, so long files are never
/// fully decoded.
///
/// # Errors
///
/// Returns `AnalysisError::DecodingError` if the file cannot be decoded or
/// yields no audio, plus anything [`analyze_audio`] returns.
///
/// # Example
///
/// ```no_run
/// use tempo_dsp::{analyze_file, AnalysisConfig};
///
/// let estimate = analyze_file("track.mp3", AnalysisConfig::default())?;
/// println!("{:.2} BPM", estimate.bpm);
/// # Ok::<(), tempo_dsp::AnalysisError>(())
/// ```
pub fn analyze_file<P: AsRef<Path>>(
    path: P,
    config: AnalysisConfig,
) -> Result<TempoEstimate, AnalysisError> {
    analyze_file_with_observer(path, config, &NoopObserver)
}

/// Like [`analyze_file`], reporting every stage to `observer`
pub fn analyze_file_with_observer<P: AsRef<Path>>(
    path: P,
    config: AnalysisConfig,
    observer: &dyn PipelineObserver,
) -> Result<TempoEstimate, AnalysisError> {
    let result = config.validate().and_then(|_| {
        let decoded = io::decode_audio(path, config.max_analysis_seconds)?;
        run_pipeline(decoded.waveform, decoded.truncated, &config, observer)
    });

    if let Err(err) = &result {
        observer.on_event(&PipelineEvent::Failed(err));
    }
    result
}

fn run_pipeline(
    mut waveform: Waveform,
    already_truncated: bool,
    config: &AnalysisConfig,
    observer: &dyn PipelineObserver,
) -> Result<TempoEstimate, AnalysisError> {
    let start_time = Instant::now();
    config.validate()?;

    let sample_rate = waveform.sample_rate();
    log::debug!(
        "Starting tempo analysis: {} samples at {} Hz",
        waveform.len(),
        sample_rate
    );
    observer.on_event(&PipelineEvent::InputAccepted {
        samples: waveform.len(),
        sample_rate,
    });

    // Bound the work before anything expensive happens
    let truncated = match config.max_analysis_seconds {
        Some(seconds) => waveform.truncate_to_seconds(seconds) || already_truncated,
        None => already_truncated,
    };
    let duration_seconds = waveform.duration_seconds();

    let silence = SilenceDetector {
        threshold_db: config.silence_threshold_db,
        frame_size: config.frame_size,
    };
    if silence.is_silent(waveform.samples()) {
        return Err(AnalysisError::ProcessingError(format!(
            "Audio is silent (loudest frame below {:.0} dBFS)",
            config.silence_threshold_db
        )));
    }

    let (waveform, resampled) = match config.analysis_sample_rate {
        Some(target) if target < sample_rate => {
            let samples = resample(waveform.samples(), sample_rate, target)?;
            (Waveform::new(samples, target)?, true)
        }
        _ => (waveform, false),
    };

    observer.on_event(&PipelineEvent::Prepared {
        waveform: &waveform,
        truncated,
        resampled,
    });

    let envelope = onset_strength(&waveform, config)?;
    observer.on_event(&PipelineEvent::EnvelopeReady(&envelope));

    // One tempogram serves every strategy
    let input = StrategyInput::new(&envelope, config);
    let mut candidates = Vec::new();
    let mut strategies_used = Vec::new();
    for strategy in strategies_for(config) {
        let candidate = strategy.estimate_from(&input, config)?;
        log::debug!("Strategy {} produced {:?}", strategy.name(), candidate.value);
        observer.on_event(&PipelineEvent::CandidateProduced(&candidate));
        strategies_used.push(strategy.name().to_string());
        candidates.push(candidate);
    }

    let reconciliation = reconcile(&candidates, config)?;
    let combined = &reconciliation.combined;

    let warnings = confidence_warnings(
        combined.confidence,
        reconciliation.qualifying,
        reconciliation.used_fallback,
        combined.octave_correction.is_some(),
    );

    let processing_time_ms = start_time.elapsed().as_secs_f32() * 1000.0;

    let estimate = TempoEstimate {
        bpm: combined.bpm,
        confidence: combined.confidence,
        sample_rate,
        duration_seconds: round2(duration_seconds),
        method1_bpm: Some(round2(reconciliation.beat_track_bpm)),
        method2_bpm: reconciliation.periodicity_prior_bpm.map(round2),
        method3_bpm: reconciliation.periodicity_distribution_bpm.map(round2),
        metadata: AnalysisMetadata {
            processing_time_ms,
            analysis_sample_rate: waveform.sample_rate(),
            truncated,
            strategies_used,
            qualifying_candidates: reconciliation.qualifying,
            octave_correction: combined.octave_correction,
            distribution_dispersion: reconciliation.distribution_dispersion.map(round2),
            warnings,
            ..AnalysisMetadata::default()
        },
    };

    log::debug!(
        "Tempo analysis complete: {:.2} BPM, confidence {:.2}, {:.1} ms",
        estimate.bpm,
        estimate.confidence,
        processing_time_ms
    );
    observer.on_event(&PipelineEvent::Reconciled(&estimate));

    Ok(estimate)
}
