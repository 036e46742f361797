use crate::cli::params::BatchDownloadParams;
use crate::download::{BatchReport, Downloader};
use crate::error::FetchPrepError;
use serde_json::json;
use std::path::Path;
use tracing;

pub async fn run_batch_download(params: BatchDownloadParams) -> Result<(), FetchPrepError> {
    println!("Starting batch download of {} files...", params.requests.len());

    let downloader = Downloader::new(params.config)?;
    let report = downloader.transfer_all(params.requests).await;
    let summary = report.summary();

    println!();
    println!("Batch download completed:");
    println!("  ✓ Successful: {}", summary.succeeded);
    println!("  ✗ Failed: {}", summary.failed);

    if summary.failed > 0 {
        println!();
        println!("Failed downloads:");
        for (source, outcome) in report.failures() {
            let category = outcome
                .error_category
                .map(|category| category.to_string())
                .unwrap_or_else(|| "unknown".to_string());
            let message = outcome.error_message.as_deref().unwrap_or("unknown error");
            println!("  {source}: [{category}] {message}");
        }
    }

    if let Some(report_path) = &params.report_path {
        write_report(&report, report_path)?;
        tracing::info!(path = %report_path.display(), "Wrote batch report");
    }

    if summary.failed > 0 {
        Err(FetchPrepError::BatchIncomplete {
            failed: summary.failed,
            requested: summary.requested,
        })
    } else {
        Ok(())
    }
}

fn write_report(report: &BatchReport, path: &Path) -> Result<(), FetchPrepError> {
    let document = json!({
        "summary": report.summary(),
        "outcomes": report,
    });
    let rendered = serde_json::to_string_pretty(&document)?;
    std::fs::write(path, rendered).map_err(|err| FetchPrepError::ReportWrite {
        path: path.to_path_buf(),
        reason: err.to_string(),
    })
}
