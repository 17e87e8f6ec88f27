//! Analysis result types

use serde::{Deserialize, Serialize};

use super::metadata::AnalysisMetadata;

/// Round to two decimal places for presentation
///
/// Idempotent: rounding an already rounded value returns it unchanged.
pub fn round2(value: f32) -> f32 {
    (value * 100.0).round() / 100.0
}

/// Final tempo estimate
///
/// Serialises to
/// `{ bpm, confidence, sample_rate, duration_seconds, method1_bpm?, method2_bpm?, method3_bpm?, metadata }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TempoEstimate {
    /// Reconciled tempo in BPM, rounded to 2 decimals
    pub bpm: f32,

    /// Strategy agreement in [0, 1], rounded to 2 decimals
    pub confidence: f32,

    /// Sample rate of the input in Hz
    pub sample_rate: u32,

    /// Seconds of audio analysed (after truncation), rounded to 2 decimals
    pub duration_seconds: f32,

    /// Beat tracking tempo
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub method1_bpm: Option<f32>,

    /// Periodicity-with-prior tempo
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub method2_bpm: Option<f32>,

    /// Periodicity distribution tempo (mean of in-band frames)
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub method3_bpm: Option<f32>,

    /// Analysis metadata
    pub metadata: AnalysisMetadata,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round2_is_idempotent() {
        for v in [119.99499f32, 120.005, 0.333_333, 87.125, 199.999, 0.7] {
            let once = round2(v);
            assert_eq!(round2(once), once, "re-rounding {} changed it", once);
        }
        assert_eq!(round2(0.333_333), 0.33);
    }

    #[test]
    fn test_optional_methods_skipped_in_json() {
        let estimate = TempoEstimate {
            bpm: 120.0,
            confidence: 0.7,
            sample_rate: 44100,
            duration_seconds: 15.0,
            method1_bpm: Some(120.0),
            method2_bpm: None,
            method3_bpm: None,
            metadata: AnalysisMetadata::default(),
        };

        let json = serde_json::to_value(&estimate).unwrap();
        assert_eq!(json["bpm"], 120.0);
        assert_eq!(json["sample_rate"], 44100);
        assert!(json.get("method1_bpm").is_some());
        assert!(json.get("method2_bpm").is_none());
        assert!(json["metadata"].get("warnings").is_none());
    }
}
