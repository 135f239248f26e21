use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClaimFormError {
    #[error("Template document not found: {0}")]
    TemplateNotFound(PathBuf),

    #[error("Host environment error: {0}")]
    HostError(String),

    #[error("Export failed for {path}: {details}")]
    ExportFailed { path: PathBuf, details: String },

    #[error("Extraction failed: {0}")]
    ExtractionFailed(String),

    #[cfg(feature = "gemini")]
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ClaimFormError>;
