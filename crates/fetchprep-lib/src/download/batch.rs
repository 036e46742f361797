use super::executor::Downloader;
use super::types::{BatchReport, ErrorCategory, TransferOutcome, TransferRequest};
use futures::stream::{FuturesUnordered, StreamExt};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

impl Downloader {
    /// Run every request under the configured concurrency cap and return
    /// one outcome per request, keyed by source URL.
    ///
    /// No single failure aborts its siblings; an empty request list yields
    /// an empty report. With `max_parallel == 1` requests complete strictly
    /// in submission order.
    pub async fn transfer_all(&self, requests: Vec<TransferRequest>) -> BatchReport {
        self.transfer_all_with_token(requests, &CancellationToken::new())
            .await
    }

    pub async fn transfer_all_with_token(
        &self,
        requests: Vec<TransferRequest>,
        token: &CancellationToken,
    ) -> BatchReport {
        let mut report = BatchReport::default();
        if requests.is_empty() {
            return report;
        }

        info!(count = requests.len(), "Starting batch download");

        if self.config().max_parallel == 1 {
            // Single worker: deterministic submission order.
            for request in requests {
                let outcome = self.transfer_with_token(&request, token).await;
                report.insert(request.source.to_string(), outcome);
            }
            return report;
        }

        let semaphore = Arc::new(Semaphore::new(self.config().max_parallel));
        let mut transfers = FuturesUnordered::new();

        for request in requests {
            let semaphore = semaphore.clone();
            let token = token.clone();
            let downloader = self.clone();
            let source = request.source.to_string();

            transfers.push(async move {
                let started = Instant::now();
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .expect("batch semaphore closed");

                // Run the transfer on its own task so a panic inside one
                // request surfaces as a join error here instead of tearing
                // down the batch.
                let handle =
                    tokio::spawn(
                        async move { downloader.transfer_with_token(&request, &token).await },
                    );
                let outcome = match handle.await {
                    Ok(outcome) => outcome,
                    Err(join_err) => {
                        warn!(source = %source, error = %join_err, "Transfer task aborted");
                        TransferOutcome::failure(
                            ErrorCategory::Permanent,
                            format!("transfer task aborted: {join_err}"),
                            started.elapsed(),
                        )
                    }
                };
                (source, outcome)
            });
        }

        while let Some((source, outcome)) = transfers.next().await {
            report.insert(source, outcome);
        }

        let summary = report.summary();
        info!(
            requested = summary.requested,
            succeeded = summary.succeeded,
            failed = summary.failed,
            "Batch download finished"
        );
        report
    }
}
