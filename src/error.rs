//! Error types for the tempo analysis engine

use std::fmt;

/// Errors that can occur during tempo analysis
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisError {
    /// Invalid input parameters (empty waveform, zero sample rate, bad config)
    InvalidInput(String),

    /// Audio decoding error (unreadable stream, no audio track, empty result)
    DecodingError(String),

    /// Processing error during analysis
    ProcessingError(String),

    /// Numerical error (degenerate envelope, non-finite values, etc.)
    NumericalError(String),
}

impl AnalysisError {
    /// True when the failure is caused by the caller's input rather than by the
    /// analysis itself.
    ///
    /// Invalid input and decode failures are client errors; processing and
    /// numerical failures are analysis failures.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            AnalysisError::InvalidInput(_) | AnalysisError::DecodingError(_)
        )
    }

    /// Human-readable cause without the category prefix
    pub fn cause(&self) -> &str {
        match self {
            AnalysisError::InvalidInput(msg)
            | AnalysisError::DecodingError(msg)
            | AnalysisError::ProcessingError(msg)
            | AnalysisError::NumericalError(msg) => msg,
        }
    }
}

impl fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            AnalysisError::DecodingError(msg) => write!(f, "Decoding error: {}", msg),
            AnalysisError::ProcessingError(msg) => write!(f, "Processing error: {}", msg),
            AnalysisError::NumericalError(msg) => write!(f, "Numerical error: {}", msg),
        }
    }
}

impl std::error::Error for AnalysisError {}

impl From<symphonia::core::errors::Error> for AnalysisError {
    fn from(err: symphonia::core::errors::Error) -> Self {
        AnalysisError::DecodingError(err.to_string())
    }
}

impl From<std::io::Error> for AnalysisError {
    fn from(err: std::io::Error) -> Self {
        AnalysisError::DecodingError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_error_classification() {
        assert!(AnalysisError::InvalidInput("x".into()).is_client_error());
        assert!(AnalysisError::DecodingError("x".into()).is_client_error());
        assert!(!AnalysisError::ProcessingError("x".into()).is_client_error());
        assert!(!AnalysisError::NumericalError("x".into()).is_client_error());
    }

    #[test]
    fn test_display_includes_cause() {
        let err = AnalysisError::ProcessingError("Onset envelope is flat".to_string());
        assert_eq!(err.to_string(), "Processing error: Onset envelope is flat");
        assert_eq!(err.cause(), "Onset envelope is flat");
    }
}
