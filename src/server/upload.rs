//! Upload validation and temporary storage

use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

use super::error::ApiError;

/// Accepted upload extensions, compared case-insensitively
pub const ALLOWED_EXTENSIONS: &[&str] = &[".mp3", ".wav", ".flac", ".ogg", ".m4a", ".aiff", ".aif"];

/// A file received from a multipart form
#[derive(Debug)]
pub struct Upload {
    /// Client-supplied file name
    pub filename: String,
    /// Raw file bytes
    pub data: Vec<u8>,
}

/// Lowercased extension of `filename` with its leading dot, if accepted
pub fn allowed_extension(filename: &str) -> Option<String> {
    let ext = Path::new(filename).extension()?.to_str()?;
    let ext = format!(".{}", ext.to_lowercase());
    ALLOWED_EXTENSIONS
        .contains(&ext.as_str())
        .then_some(ext)
}

impl Upload {
    /// Check the upload and spill it to a temp file carrying the same extension
    ///
    /// The file is removed when the returned handle is dropped.
    pub fn into_temp_file(self) -> Result<NamedTempFile, ApiError> {
        let ext = allowed_extension(&self.filename).ok_or(ApiError::UnsupportedFormat)?;
        if self.data.is_empty() {
            return Err(ApiError::EmptyFile);
        }

        let mut file = tempfile::Builder::new()
            .prefix("bpm-upload-")
            .suffix(&ext)
            .tempfile()
            .map_err(|e| ApiError::Internal(format!("Failed to create temp file: {}", e)))?;
        file.write_all(&self.data)
            .and_then(|_| file.flush())
            .map_err(|e| ApiError::Internal(format!("Failed to store upload: {}", e)))?;
        Ok(file)
    }
}
