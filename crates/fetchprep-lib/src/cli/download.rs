use crate::cli::params::DownloadParams;
use crate::download::Downloader;
use crate::error::FetchPrepError;
use tracing;

pub async fn run_download(params: DownloadParams) -> Result<(), FetchPrepError> {
    tracing::info!(source = %params.request.source, "Starting download");
    let algorithm = params.request.algorithm;
    let downloader = Downloader::new(params.config)?;
    let outcome = downloader.transfer(&params.request).await;

    if outcome.success {
        println!(
            "✓ Download successful: {}",
            params.request.destination.display()
        );
        println!("  Size: {:.1} MB", outcome.file_size as f64 / (1024.0 * 1024.0));
        println!("  Time: {:.1}s", outcome.elapsed_seconds);
        if outcome.checksum_verified {
            println!("  ✓ Checksum verified ({})", algorithm.as_str().to_uppercase());
        }
        Ok(())
    } else {
        let message = outcome
            .error_message
            .unwrap_or_else(|| "unknown error".to_string());
        println!("✗ Download failed: {message}");
        Err(FetchPrepError::TransferFailed {
            url: params.request.source.to_string(),
            message,
        })
    }
}
