//! HTTP error mapping

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

use super::upload::ALLOWED_EXTENSIONS;
use crate::error::AnalysisError;

/// Failures surfaced to HTTP clients
#[derive(Debug, Error)]
pub enum ApiError {
    /// The form had no `file` field
    #[error("No file uploaded")]
    MissingFile,

    /// Extension not in the accepted list
    #[error("Unsupported file format. Allowed formats: {}", ALLOWED_EXTENSIONS.join(", "))]
    UnsupportedFormat,

    /// Zero-byte upload
    #[error("Uploaded file is empty")]
    EmptyFile,

    /// Malformed multipart body
    #[error("Invalid upload: {0}")]
    Upload(String),

    /// Decoding or analysis failed
    #[error("{0}")]
    Analysis(#[from] AnalysisError),

    /// Server-side I/O or task failure
    #[error("Error processing audio file: {0}")]
    Internal(String),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    detail: String,
}

impl ApiError {
    /// HTTP status for this failure
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingFile
            | ApiError::UnsupportedFormat
            | ApiError::EmptyFile
            | ApiError::Upload(_) => StatusCode::BAD_REQUEST,
            ApiError::Analysis(err) if err.is_client_error() => StatusCode::BAD_REQUEST,
            ApiError::Analysis(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn detail(&self) -> String {
        match self {
            ApiError::Analysis(err) if !err.is_client_error() => {
                format!("Error processing audio file: {}", err.cause())
            }
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = self.detail();
        if status.is_server_error() {
            error!("{}", detail);
        } else {
            warn!("Rejected upload: {}", detail);
        }
        (status, Json(ErrorBody { detail })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_errors_map_to_bad_request() {
        assert_eq!(ApiError::MissingFile.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::EmptyFile.status(), StatusCode::BAD_REQUEST);
        let decode = ApiError::from(AnalysisError::DecodingError("bad header".into()));
        assert_eq!(decode.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_analysis_failure_is_server_error() {
        let err = ApiError::from(AnalysisError::ProcessingError("Audio is silent".into()));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.detail(), "Error processing audio file: Audio is silent");
    }

    #[test]
    fn test_unsupported_format_lists_extensions() {
        let detail = ApiError::UnsupportedFormat.to_string();
        for ext in ALLOWED_EXTENSIONS {
            assert!(detail.contains(ext), "{} missing from {}", ext, detail);
        }
    }
}
