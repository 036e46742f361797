use super::executor::Downloader;
use super::types::{DownloadError, is_retryable_status};
use reqwest::header;
use serde::Serialize;
use url::Url;

/// What a header-only probe learned about a remote resource.
#[derive(Clone, Debug, Serialize)]
pub struct DownloadInfo {
    pub url: String,
    pub status: u16,
    pub content_length: Option<u64>,
    pub content_type: Option<String>,
    pub last_modified: Option<String>,
    /// Whether the server advertises byte-range support (`Accept-Ranges: bytes`).
    pub supports_resume: bool,
}

impl Downloader {
    /// Issue a HEAD probe against `url` without writing any file.
    ///
    /// Best-effort advisory call: transport failures come back as the
    /// structured error, never as a panic.
    pub async fn probe(&self, url: &Url) -> Result<DownloadInfo, DownloadError> {
        let response = self
            .client
            .head(url.clone())
            .send()
            .await
            .map_err(|source| DownloadError::Transport {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::Status {
                status,
                url: url.to_string(),
                retryable: is_retryable_status(status),
            });
        }

        let headers = response.headers();
        let header_str = |name: header::HeaderName| {
            headers
                .get(name)
                .and_then(|value| value.to_str().ok())
                .map(str::to_string)
        };

        Ok(DownloadInfo {
            url: url.to_string(),
            status: status.as_u16(),
            content_length: headers
                .get(header::CONTENT_LENGTH)
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.parse().ok()),
            content_type: header_str(header::CONTENT_TYPE),
            last_modified: header_str(header::LAST_MODIFIED),
            supports_resume: headers
                .get(header::ACCEPT_RANGES)
                .and_then(|value| value.to_str().ok())
                .is_some_and(|value| value.contains("bytes")),
        })
    }
}
