use super::retry::{RetryAction, RetryPolicy, retry_with_backoff};
use super::types::{
    DownloadError, TransferConfig, TransferOutcome, TransferRequest, is_retryable_status,
};
use crate::error::FetchPrepError;
use crate::progress::ProgressTracker;
use crate::verification::{digest_file, verify_file};
use futures::StreamExt;
use reqwest::{StatusCode, header};
use std::path::Path;
use std::time::Instant;
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Resilient file acquisition over HTTP.
///
/// Owns the HTTP client and the transfer policy; all tunables come in
/// through [`TransferConfig`] at construction.
#[derive(Clone)]
pub struct Downloader {
    pub(super) client: reqwest::Client,
    config: TransferConfig,
}

/// What a completed acquisition observed about the destination file.
struct Completed {
    file_size: u64,
    checksum_verified: bool,
    checksum_value: Option<String>,
}

impl Downloader {
    pub fn new(config: TransferConfig) -> Result<Self, FetchPrepError> {
        config.validate()?;
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .connect_timeout(config.timeout)
            .read_timeout(config.timeout)
            .build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &TransferConfig {
        &self.config
    }

    /// Acquire one file, producing exactly one outcome. Never panics past
    /// this boundary; every failure mode is captured in the outcome.
    pub async fn transfer(&self, request: &TransferRequest) -> TransferOutcome {
        self.transfer_with_token(request, &CancellationToken::new())
            .await
    }

    pub async fn transfer_with_token(
        &self,
        request: &TransferRequest,
        token: &CancellationToken,
    ) -> TransferOutcome {
        let started = Instant::now();
        match self.try_transfer(request, token).await {
            Ok(completed) => TransferOutcome::success(
                request.destination.clone(),
                completed.file_size,
                started.elapsed(),
                completed.checksum_verified,
                completed.checksum_value,
            ),
            Err(err) => {
                warn!(source = %request.source, error = %err, "Transfer failed");
                TransferOutcome::failure(err.category(), err.to_string(), started.elapsed())
            }
        }
    }

    async fn try_transfer(
        &self,
        request: &TransferRequest,
        token: &CancellationToken,
    ) -> Result<Completed, DownloadError> {
        if let Some(parent) = request.destination.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| DownloadError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }

        // Idempotent short-circuit: an existing destination that already
        // matches the expected digest costs nothing to "re-download".
        if request.resume
            && let Some(expected) = &request.expected_digest
            && file_exists(&request.destination).await
        {
            let matches = verify_file(
                &request.destination,
                expected,
                request.algorithm,
                self.config.chunk_size,
            )
            .await
            .map_err(DownloadError::from)?;

            if matches {
                info!(
                    destination = %request.destination.display(),
                    "Destination already matches expected digest, skipping download"
                );
                let file_size = file_len(&request.destination).await?;
                return Ok(Completed {
                    file_size,
                    checksum_verified: true,
                    checksum_value: Some(expected.to_ascii_lowercase()),
                });
            }
            debug!(
                destination = %request.destination.display(),
                "Existing destination does not match expected digest, re-downloading"
            );
        }

        let policy = RetryPolicy::from_config(&self.config);
        retry_with_backoff(&policy, token, |attempt| async move {
            match self.attempt_transfer(request, attempt, token).await {
                Ok(bytes) => RetryAction::Success(bytes),
                Err(err) if err.is_retryable() => RetryAction::Retry(err),
                Err(err) => RetryAction::Fail(err),
            }
        })
        .await?;

        let file_size = file_len(&request.destination).await?;

        // Post-transfer verification. A mismatch is terminal for this
        // request: the corrupted file is removed so a later resume cannot
        // continue from bad bytes, and no retry happens here.
        let (checksum_verified, checksum_value) = match &request.expected_digest {
            Some(expected) => {
                let actual = digest_file(
                    &request.destination,
                    request.algorithm,
                    self.config.chunk_size,
                )
                .await
                .map_err(DownloadError::from)?;

                if !actual.eq_ignore_ascii_case(expected) {
                    if let Err(remove_err) = tokio::fs::remove_file(&request.destination).await {
                        warn!(
                            destination = %request.destination.display(),
                            error = %remove_err,
                            "Failed to remove destination after checksum mismatch"
                        );
                    }
                    return Err(DownloadError::ChecksumMismatch {
                        path: request.destination.clone(),
                        expected: expected.clone(),
                        actual,
                    });
                }
                (true, Some(actual))
            }
            None => (false, None),
        };

        Ok(Completed {
            file_size,
            checksum_verified,
            checksum_value,
        })
    }

    /// One attempt: ranged continuation when retrying with a partial file
    /// present, full fetch otherwise. Returns bytes written this attempt.
    async fn attempt_transfer(
        &self,
        request: &TransferRequest,
        attempt: u32,
        token: &CancellationToken,
    ) -> Result<u64, DownloadError> {
        let url = request.source.as_str();
        let transport = |source| DownloadError::Transport {
            url: url.to_string(),
            source,
        };
        let local_io = |source| DownloadError::Io {
            path: request.destination.clone(),
            source,
        };

        let resume_from = if attempt > 0 && request.resume && file_exists(&request.destination).await
        {
            file_len(&request.destination).await?
        } else {
            0
        };

        let mut http_request = self.client.get(request.source.clone());
        if resume_from > 0 {
            http_request =
                http_request.header(header::RANGE, format!("bytes={resume_from}-"));
            info!(source = %request.source, offset = resume_from, "Resuming download");
        }

        let response = tokio::select! {
            _ = token.cancelled() => return Err(DownloadError::Canceled),
            sent = http_request.send() => sent.map_err(transport)?,
        };

        let status = response.status();
        if resume_from > 0 && status == StatusCode::RANGE_NOT_SATISFIABLE {
            // The partial file already covers the full content.
            info!(source = %request.source, "Requested range past end of content, file already complete");
            return Ok(0);
        }
        if !status.is_success() {
            return Err(DownloadError::Status {
                status,
                url: url.to_string(),
                retryable: is_retryable_status(status),
            });
        }

        // A server that ignores the range request answers 200 with the full
        // body; appending would corrupt the file, so start over instead.
        let appending = resume_from > 0 && status == StatusCode::PARTIAL_CONTENT;
        if resume_from > 0 && !appending {
            debug!(source = %request.source, "Server ignored range request, restarting from scratch");
        }

        let content_length = response.content_length();
        let total = if appending {
            content_length.map(|len| len + resume_from)
        } else {
            content_length
        };

        info!(
            source = %request.source,
            destination = %request.destination.display(),
            size = total,
            "Downloading"
        );

        let progress = ProgressTracker::new(total, self.config.show_progress);
        if appending {
            progress.advance(resume_from);
        }

        let file = if appending {
            tokio::fs::OpenOptions::new()
                .append(true)
                .open(&request.destination)
                .await
        } else {
            tokio::fs::File::create(&request.destination).await
        }
        .map_err(local_io)?;
        let mut writer = BufWriter::new(file);

        let mut stream = response.bytes_stream();
        let mut written: u64 = 0;
        loop {
            let chunk = tokio::select! {
                _ = token.cancelled() => return Err(DownloadError::Canceled),
                next = stream.next() => match next {
                    None => break,
                    Some(chunk) => chunk.map_err(transport)?,
                },
            };
            writer.write_all(&chunk).await.map_err(local_io)?;
            written += chunk.len() as u64;
            progress.advance(chunk.len() as u64);
        }

        writer.flush().await.map_err(local_io)?;
        progress.finish();

        // Bodies cut short without a transport error are worth a resume.
        if let Some(expected) = content_length
            && written < expected
        {
            return Err(DownloadError::Incomplete {
                url: url.to_string(),
                expected,
                received: written,
            });
        }

        debug!(
            source = %request.source,
            bytes = written,
            "Download attempt completed"
        );
        Ok(written)
    }
}

async fn file_exists(path: &Path) -> bool {
    tokio::fs::try_exists(path).await.unwrap_or(false)
}

async fn file_len(path: &Path) -> Result<u64, DownloadError> {
    let metadata = tokio::fs::metadata(path)
        .await
        .map_err(|source| DownloadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(metadata.len())
}
