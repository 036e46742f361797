use crate::verification::ChecksumAlgorithm;
use reqwest::StatusCode;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// One file to acquire. Immutable once constructed.
#[derive(Clone, Debug)]
pub struct TransferRequest {
    pub source: Url,
    pub destination: PathBuf,
    pub expected_digest: Option<String>,
    pub algorithm: ChecksumAlgorithm,
    pub resume: bool,
}

impl TransferRequest {
    pub fn new(source: Url, destination: impl Into<PathBuf>) -> Self {
        Self {
            source,
            destination: destination.into(),
            expected_digest: None,
            algorithm: ChecksumAlgorithm::Sha256,
            resume: true,
        }
    }

    /// Attach an expected digest to verify after transfer.
    pub fn with_digest(mut self, algorithm: ChecksumAlgorithm, digest: impl Into<String>) -> Self {
        self.algorithm = algorithm;
        self.expected_digest = Some(digest.into());
        self
    }

    /// Disable byte-range resume for this request.
    pub fn without_resume(mut self) -> Self {
        self.resume = false;
        self
    }
}

/// Default transfer policy, overridable per call site.
///
/// Supplied explicitly to [`Downloader::new`](crate::download::Downloader::new);
/// the engine never reads ambient global state.
#[derive(Clone, Debug)]
pub struct TransferConfig {
    /// Retry attempts after the initial one.
    pub max_retries: u32,
    /// Delay before the first retry.
    pub retry_delay: Duration,
    /// Multiplier applied to the delay for each further retry.
    pub retry_backoff: f64,
    /// Per-operation network timeout.
    pub timeout: Duration,
    /// Buffer size for file reads (checksum passes).
    pub chunk_size: usize,
    pub show_progress: bool,
    /// Concurrency cap for batch execution.
    pub max_parallel: usize,
    /// Client identifier attached to outgoing requests.
    pub user_agent: String,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_delay: Duration::from_secs(1),
            retry_backoff: 2.0,
            timeout: Duration::from_secs(30),
            chunk_size: 8192,
            show_progress: true,
            max_parallel: 4,
            user_agent: concat!("fetchprep/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl TransferConfig {
    /// Reject unusable tunables before any I/O happens.
    pub fn validate(&self) -> Result<(), DownloadError> {
        if self.max_parallel == 0 {
            return Err(DownloadError::InvalidConfig {
                details: "max_parallel must be greater than 0".to_string(),
            });
        }
        if self.chunk_size == 0 {
            return Err(DownloadError::InvalidConfig {
                details: "chunk_size must be greater than 0".to_string(),
            });
        }
        if self.retry_backoff <= 1.0 {
            return Err(DownloadError::InvalidConfig {
                details: format!(
                    "retry_backoff must be greater than 1.0 so retry delays increase, got {}",
                    self.retry_backoff
                ),
            });
        }
        if self.timeout.is_zero() {
            return Err(DownloadError::InvalidConfig {
                details: "timeout must be non-zero".to_string(),
            });
        }
        Ok(())
    }
}

/// Failure taxonomy surfaced in [`TransferOutcome`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Timeout, connection reset, 5xx, 408, 429. Retried with backoff.
    Transient,
    /// 404 and other terminal remote conditions. Never retried.
    Permanent,
    /// Post-transfer digest mismatch. Destination discarded, not retried.
    ChecksumMismatch,
    /// Local filesystem failure. Surfaced immediately.
    LocalIo,
    /// Invalid tunables or algorithm. Rejected before any I/O.
    Configuration,
    /// Cancellation token fired mid-transfer.
    Canceled,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorCategory::Transient => "transient",
            ErrorCategory::Permanent => "permanent",
            ErrorCategory::ChecksumMismatch => "checksum_mismatch",
            ErrorCategory::LocalIo => "local_io",
            ErrorCategory::Configuration => "configuration",
            ErrorCategory::Canceled => "canceled",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("HTTP status {status} for {url}")]
    Status {
        status: StatusCode,
        url: String,
        retryable: bool,
    },

    #[error("Transport error for {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Response body for {url} ended after {received} of {expected} bytes")]
    Incomplete {
        url: String,
        expected: u64,
        received: u64,
    },

    #[error("Checksum mismatch for {path}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid transfer configuration: {details}")]
    InvalidConfig { details: String },

    #[error("Transfer canceled")]
    Canceled,
}

impl From<crate::verification::ChecksumError> for DownloadError {
    fn from(err: crate::verification::ChecksumError) -> Self {
        use crate::verification::ChecksumError;
        match err {
            ChecksumError::UnsupportedAlgorithm { name } => DownloadError::InvalidConfig {
                details: format!("unsupported checksum algorithm: {name}"),
            },
            ChecksumError::Io { path, source } => DownloadError::Io { path, source },
        }
    }
}

impl DownloadError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            DownloadError::Status { retryable, .. } => {
                if *retryable {
                    ErrorCategory::Transient
                } else {
                    ErrorCategory::Permanent
                }
            }
            DownloadError::Transport { source, .. } => {
                if is_retryable_reqwest_error(source) {
                    ErrorCategory::Transient
                } else {
                    ErrorCategory::Permanent
                }
            }
            DownloadError::Incomplete { .. } => ErrorCategory::Transient,
            DownloadError::ChecksumMismatch { .. } => ErrorCategory::ChecksumMismatch,
            DownloadError::Io { .. } => ErrorCategory::LocalIo,
            DownloadError::InvalidConfig { .. } => ErrorCategory::Configuration,
            DownloadError::Canceled => ErrorCategory::Canceled,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.category() == ErrorCategory::Transient
    }
}

/// Classify a reqwest error as retryable or not.
///
/// Retryable: connect, timeout, request and body read errors.
/// Non-retryable: redirect loops and builder errors.
pub(crate) fn is_retryable_reqwest_error(e: &reqwest::Error) -> bool {
    e.is_connect() || e.is_timeout() || e.is_request() || e.is_body() || e.is_decode()
}

pub(crate) fn is_retryable_status(status: StatusCode) -> bool {
    status.is_server_error()
        || status == StatusCode::REQUEST_TIMEOUT
        || status == StatusCode::TOO_MANY_REQUESTS
}

/// Result of one [`TransferRequest`]. Immutable after creation.
///
/// `success == true` implies the destination exists with the transferred
/// size, and that any supplied digest matched. `checksum_verified` is only
/// set when an expected digest was supplied and compared.
#[derive(Clone, Debug, Serialize)]
pub struct TransferOutcome {
    pub success: bool,
    pub file_path: Option<PathBuf>,
    pub error_category: Option<ErrorCategory>,
    pub error_message: Option<String>,
    pub file_size: u64,
    pub elapsed_seconds: f64,
    pub checksum_verified: bool,
    pub checksum_value: Option<String>,
}

impl TransferOutcome {
    pub(crate) fn success(
        file_path: PathBuf,
        file_size: u64,
        elapsed: Duration,
        checksum_verified: bool,
        checksum_value: Option<String>,
    ) -> Self {
        Self {
            success: true,
            file_path: Some(file_path),
            error_category: None,
            error_message: None,
            file_size,
            elapsed_seconds: elapsed.as_secs_f64(),
            checksum_verified,
            checksum_value,
        }
    }

    pub(crate) fn failure(
        category: ErrorCategory,
        message: impl Into<String>,
        elapsed: Duration,
    ) -> Self {
        Self {
            success: false,
            file_path: None,
            error_category: Some(category),
            error_message: Some(message.into()),
            file_size: 0,
            elapsed_seconds: elapsed.as_secs_f64(),
            checksum_verified: false,
            checksum_value: None,
        }
    }
}

/// Per-source outcomes of a batch, keyed by source URL.
#[derive(Debug, Default, Serialize)]
#[serde(transparent)]
pub struct BatchReport {
    outcomes: BTreeMap<String, TransferOutcome>,
}

/// Counts consumed by whatever reporting layer sits outside the engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub requested: usize,
    pub succeeded: usize,
    pub failed: usize,
}

impl BatchReport {
    pub(crate) fn insert(&mut self, source: String, outcome: TransferOutcome) {
        self.outcomes.insert(source, outcome);
    }

    pub fn get(&self, source: &str) -> Option<&TransferOutcome> {
        self.outcomes.get(source)
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &TransferOutcome)> {
        self.outcomes.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &TransferOutcome)> {
        self.iter().filter(|(_, outcome)| !outcome.success)
    }

    pub fn summary(&self) -> BatchSummary {
        let succeeded = self.outcomes.values().filter(|o| o.success).count();
        BatchSummary {
            requested: self.outcomes.len(),
            succeeded,
            failed: self.outcomes.len() - succeeded,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        TransferConfig::default().validate().expect("default config");
    }

    #[test]
    fn zero_parallelism_is_rejected() {
        let config = TransferConfig {
            max_parallel: 0,
            ..TransferConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Configuration);
    }

    #[test]
    fn non_increasing_backoff_is_rejected() {
        let config = TransferConfig {
            retry_backoff: 1.0,
            ..TransferConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn status_classification() {
        assert!(is_retryable_status(StatusCode::INTERNAL_SERVER_ERROR));
        assert!(is_retryable_status(StatusCode::SERVICE_UNAVAILABLE));
        assert!(is_retryable_status(StatusCode::TOO_MANY_REQUESTS));
        assert!(is_retryable_status(StatusCode::REQUEST_TIMEOUT));
        assert!(!is_retryable_status(StatusCode::NOT_FOUND));
        assert!(!is_retryable_status(StatusCode::FORBIDDEN));
        assert!(!is_retryable_status(StatusCode::GONE));
    }

    #[test]
    fn summary_counts_successes_and_failures() {
        let mut report = BatchReport::default();
        report.insert(
            "https://example.com/a".to_string(),
            TransferOutcome::success("a".into(), 10, Duration::from_secs(1), false, None),
        );
        report.insert(
            "https://example.com/b".to_string(),
            TransferOutcome::failure(
                ErrorCategory::Permanent,
                "HTTP status 404",
                Duration::from_secs(1),
            ),
        );

        let summary = report.summary();
        assert_eq!(
            summary,
            BatchSummary {
                requested: 2,
                succeeded: 1,
                failed: 1
            }
        );
        let failures: Vec<_> = report.failures().collect();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].0, "https://example.com/b");
    }

    #[test]
    fn request_builder_helpers() {
        let url = Url::parse("https://example.com/file.bin").expect("url");
        let request = TransferRequest::new(url, "out/file.bin")
            .with_digest(ChecksumAlgorithm::Md5, "ABC123")
            .without_resume();
        assert_eq!(request.algorithm, ChecksumAlgorithm::Md5);
        assert_eq!(request.expected_digest.as_deref(), Some("ABC123"));
        assert!(!request.resume);
    }
}
