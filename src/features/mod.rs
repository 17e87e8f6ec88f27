//! Feature extraction modules
//!
//! - Onset envelope (log-mel spectral flux)
//! - Period estimation (tempo strategies)

pub mod onset;
pub mod period;
pub mod stats;
