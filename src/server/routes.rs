//! HTTP routes.
//!
//! - `GET /`: service banner
//! - `GET /health`: liveness probe
//! - `POST /detect-bpm`: multipart upload (`file` field), returns the tempo estimate

use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use super::error::ApiError;
use super::upload::Upload;
use crate::analysis::result::TempoEstimate;
use crate::config::AnalysisConfig;

/// Shared, read-only handler state
#[derive(Debug, Clone)]
pub struct AppState {
    /// Parameters applied to every analysis
    pub analysis: Arc<AnalysisConfig>,
}

impl AppState {
    /// Wrap an analysis configuration for sharing across handlers
    pub fn new(analysis: AnalysisConfig) -> Self {
        Self {
            analysis: Arc::new(analysis),
        }
    }
}

/// `POST /detect-bpm` response body
#[derive(Debug, Serialize)]
pub struct DetectResponse {
    /// Name of the uploaded file
    pub filename: String,

    /// Tempo estimate fields, inlined
    #[serde(flatten)]
    pub estimate: TempoEstimate,
}

/// `GET /`
pub async fn root() -> Json<Value> {
    Json(json!({
        "status": "online",
        "service": "BPM Detection API",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// `GET /health`
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

async fn read_upload(multipart: &mut Multipart) -> Result<Option<Upload>, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Upload(e.body_text()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::Upload(e.body_text()))?;
        return Ok(Some(Upload {
            filename,
            data: data.to_vec(),
        }));
    }
    Ok(None)
}

/// `POST /detect-bpm`
///
/// # Errors
///
/// 400 for a missing, unsupported, empty or undecodable upload; 500 when the
/// analysis itself fails.
pub async fn detect_bpm(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<DetectResponse>, ApiError> {
    let upload = read_upload(&mut multipart)
        .await?
        .ok_or(ApiError::MissingFile)?;
    debug!("Received {} ({} bytes)", upload.filename, upload.data.len());

    let filename = upload.filename.clone();
    let temp_file = upload.into_temp_file()?;
    let config = (*state.analysis).clone();

    // Analysis is CPU bound; the temp file lives until the task finishes
    let estimate = tokio::task::spawn_blocking(move || {
        let result = crate::analyze_file(temp_file.path(), config);
        drop(temp_file);
        result
    })
    .await
    .map_err(|e| ApiError::Internal(format!("Analysis task failed: {}", e)))??;

    info!(
        "{}: {:.2} BPM (confidence {:.2})",
        filename, estimate.bpm, estimate.confidence
    );
    Ok(Json(DetectResponse { filename, estimate }))
}
