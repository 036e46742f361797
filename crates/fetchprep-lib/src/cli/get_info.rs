use crate::cli::params::GetInfoParams;
use crate::download::Downloader;
use crate::error::FetchPrepError;

pub async fn run_get_info(params: GetInfoParams) -> Result<(), FetchPrepError> {
    let downloader = Downloader::new(params.config)?;
    let info = downloader.probe(&params.url).await?;

    println!("Download Information for: {}", info.url);
    println!("  Status: {}", info.status);
    match info.content_length {
        Some(length) => println!("  Size: {:.1} MB", length as f64 / (1024.0 * 1024.0)),
        None => println!("  Size: unknown"),
    }
    println!(
        "  Type: {}",
        info.content_type.as_deref().unwrap_or("unknown")
    );
    println!(
        "  Resume Support: {}",
        if info.supports_resume { "Yes" } else { "No" }
    );
    if let Some(last_modified) = &info.last_modified {
        println!("  Last Modified: {last_modified}");
    }

    Ok(())
}
