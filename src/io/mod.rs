//! Audio input: waveform container and file decoding
//!
//! - [`waveform::Waveform`]: validated mono samples plus sample rate
//! - [`decoder::decode_audio`]: Symphonia-backed file decoding to a mono waveform

pub mod decoder;
pub mod waveform;

pub use decoder::{decode_audio, DecodedAudio};
pub use waveform::Waveform;
