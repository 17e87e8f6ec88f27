//! Reconciliation and result modules
//!
//! Combines strategy candidates into the final estimate:
//! - Candidate reconciliation (median, octave correction)
//! - Confidence scoring
//! - Result types and metadata

pub mod confidence;
pub mod metadata;
pub mod reconcile;
pub mod result;
