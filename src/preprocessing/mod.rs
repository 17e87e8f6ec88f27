//! Audio preprocessing modules
//!
//! This module contains utilities for preparing audio for analysis:
//! - Channel mixing (multi-channel to mono)
//! - Silence detection
//! - Resampling to the analysis rate

pub mod channel_mixer;
pub mod resample;
pub mod silence;
