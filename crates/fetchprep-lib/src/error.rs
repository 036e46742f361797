use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchPrepError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid command line arguments: {details}")]
    CliArgumentValidation { details: String },

    #[error("Failed to load manifest from {path}: {reason}")]
    ManifestLoad { path: PathBuf, reason: String },

    #[error("Invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Checksum error: {0}")]
    Checksum(#[from] crate::verification::ChecksumError),

    #[error("Download error: {0}")]
    Download(#[from] crate::download::DownloadError),

    #[error("Download failed for {url}: {message}")]
    TransferFailed { url: String, message: String },

    #[error("{failed} of {requested} downloads failed")]
    BatchIncomplete { failed: usize, requested: usize },

    #[error("Checksum verification failed for {path}: expected {expected}, got {actual}")]
    VerificationFailed {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Failed to write report to {path}: {reason}")]
    ReportWrite { path: PathBuf, reason: String },

    #[error("JSON serialization/deserialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected error: {0}")]
    Unexpected(#[from] eyre::Report),
}
