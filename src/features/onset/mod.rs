//! Onset envelope extraction
//!
//! Turns a waveform into a frame-rate signal describing how strongly new
//! rhythmic events start at each moment:
//! - Centered STFT power spectrogram
//! - Mel filterbank projection and dB compression
//! - Half-wave rectified band differences folded into one value per frame

pub mod mel;
pub mod stft;
pub mod strength;

pub use strength::onset_strength;

/// How per-band spectral differences are combined into one value per frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Aggregation {
    /// Median across bands; robust to a few bands spiking on their own
    #[default]
    Median,

    /// Arithmetic mean across bands
    Mean,
}

/// Onset strength over time
///
/// One non-negative value per analysis frame. Frame `i` is centred on sample
/// `i * hop_length` of the waveform it was derived from.
#[derive(Debug, Clone, PartialEq)]
pub struct OnsetEnvelope {
    /// Onset strength per frame (all values >= 0)
    pub values: Vec<f32>,

    /// Waveform samples advanced per frame
    pub hop_length: usize,

    /// Sample rate of the source waveform in Hz
    pub sample_rate: u32,
}

impl OnsetEnvelope {
    /// Number of frames
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True if the envelope has no frames
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Frames per second
    pub fn frame_rate(&self) -> f32 {
        self.sample_rate as f32 / self.hop_length as f32
    }

    /// Time span covered by the envelope
    pub fn duration_seconds(&self) -> f32 {
        self.values.len() as f32 / self.frame_rate()
    }

    /// Convert a period in frames to BPM
    pub fn lag_to_bpm(&self, lag_frames: f32) -> f32 {
        60.0 * self.frame_rate() / lag_frames
    }

    /// Convert a tempo in BPM to a period in frames
    pub fn bpm_to_lag(&self, bpm: f32) -> f32 {
        60.0 * self.frame_rate() / bpm
    }
}
