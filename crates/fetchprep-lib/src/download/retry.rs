use super::types::{DownloadError, TransferConfig};
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// Backoff policy for one transfer's retry loop.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retry attempts after the initial one.
    pub max_retries: u32,
    /// Delay before the first retry. Each further retry multiplies it by
    /// `backoff`, so delays strictly increase attempt-over-attempt.
    pub base_delay: Duration,
    pub backoff: f64,
    /// Hard cap on the computed delay.
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &TransferConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base_delay: config.retry_delay,
            backoff: config.retry_backoff,
            max_delay: Duration::from_secs(300),
        }
    }

    /// Compute the delay after a failed attempt (0-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let scaled = self.base_delay.as_secs_f64() * self.backoff.powi(attempt as i32);
        if !scaled.is_finite() {
            return self.max_delay;
        }
        Duration::from_secs_f64(scaled.min(self.max_delay.as_secs_f64()))
    }
}

/// Result of a single attempt, used by the caller to signal retryability.
pub enum RetryAction<T> {
    /// Operation succeeded.
    Success(T),
    /// Operation failed with a retryable error (network, 5xx, timeout).
    Retry(DownloadError),
    /// Operation failed with a terminal error (4xx, local I/O, mismatch).
    Fail(DownloadError),
}

/// Execute an async operation with retry-and-backoff.
///
/// The `operation` closure receives the current attempt number (0-indexed)
/// and returns a [`RetryAction`]. Cancellation is honored both before each
/// attempt and during the backoff sleep.
pub async fn retry_with_backoff<F, Fut, T>(
    policy: &RetryPolicy,
    token: &CancellationToken,
    operation: F,
) -> Result<T, DownloadError>
where
    F: Fn(u32) -> Fut,
    Fut: Future<Output = RetryAction<T>>,
{
    for attempt in 0..=policy.max_retries {
        if token.is_cancelled() {
            return Err(DownloadError::Canceled);
        }

        match operation(attempt).await {
            RetryAction::Success(value) => return Ok(value),
            RetryAction::Fail(err) => return Err(err),
            RetryAction::Retry(err) => {
                if attempt >= policy.max_retries {
                    return Err(err);
                }
                let delay = policy.delay_for_attempt(attempt);
                warn!(
                    attempt = attempt + 1,
                    max = policy.max_retries,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "Retrying after transient error"
                );
                tokio::select! {
                    _ = token.cancelled() => {
                        return Err(DownloadError::Canceled);
                    }
                    _ = tokio::time::sleep(delay) => {}
                }
            }
        }
    }

    // Unreachable: the loop covers 0..=max_retries and the last iteration returns on Retry.
    Err(DownloadError::InvalidConfig {
        details: "retry loop exited without result".to_string(),
    })
}
