use crate::cli::args::Command;
use crate::cli::params::{BatchDownloadParams, DownloadParams, GetInfoParams, VerifyParams};
use crate::config::{Settings, load_settings};
use crate::download::{TransferConfig, TransferRequest};
use crate::error::FetchPrepError;
use crate::manifest::load_manifest;
use crate::verification::ChecksumAlgorithm;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone)]
pub enum ResolvedCommand {
    Download(DownloadParams),
    BatchDownload(BatchDownloadParams),
    Verify(VerifyParams),
    GetInfo(GetInfoParams),
}

/// Validate a parsed command into ready-to-run parameters.
///
/// All configuration errors (unsupported algorithm, zero concurrency,
/// malformed URLs) surface here, before any network I/O.
pub fn resolve_command(command: Command, quiet: bool) -> Result<ResolvedCommand, FetchPrepError> {
    match command {
        Command::Download {
            url,
            output,
            config_path,
            retries,
            timeout_secs,
            chunk_size,
            no_resume,
            verify_md5,
            verify_sha1,
            verify_sha256,
            verify_sha512,
        } => {
            let mut config = resolve_transfer_config(config_path.as_deref(), quiet)?;
            if let Some(retries) = retries {
                config.max_retries = retries;
            }
            if let Some(timeout_secs) = timeout_secs {
                config.timeout = Duration::from_secs(timeout_secs);
            }
            if let Some(chunk_size) = chunk_size {
                config.chunk_size = chunk_size;
            }
            config.validate()?;

            let source = parse_url(&url)?;
            let mut request = TransferRequest::new(source, &output);
            if no_resume {
                request = request.without_resume();
            }

            let checksum_flags = [
                (ChecksumAlgorithm::Md5, verify_md5),
                (ChecksumAlgorithm::Sha1, verify_sha1),
                (ChecksumAlgorithm::Sha256, verify_sha256),
                (ChecksumAlgorithm::Sha512, verify_sha512),
            ];
            let mut supplied = checksum_flags
                .into_iter()
                .filter_map(|(algorithm, digest)| digest.map(|digest| (algorithm, digest)));
            if let Some((algorithm, digest)) = supplied.next() {
                if supplied.next().is_some() {
                    return Err(FetchPrepError::CliArgumentValidation {
                        details: "At most one --verify-* option may be given.".to_string(),
                    });
                }
                request = request.with_digest(algorithm, digest);
            }

            Ok(ResolvedCommand::Download(DownloadParams { request, config }))
        }

        Command::BatchDownload {
            manifest_path,
            config_path,
            retries,
            timeout_secs,
            parallel,
            report_path,
        } => {
            if let Some(parallel) = parallel
                && parallel == 0
            {
                return Err(FetchPrepError::CliArgumentValidation {
                    details: "parallel must be greater than 0.".to_string(),
                });
            }

            let mut config = resolve_transfer_config(config_path.as_deref(), quiet)?;
            if let Some(retries) = retries {
                config.max_retries = retries;
            }
            if let Some(timeout_secs) = timeout_secs {
                config.timeout = Duration::from_secs(timeout_secs);
            }
            if let Some(parallel) = parallel {
                config.max_parallel = parallel;
            }
            config.validate()?;

            let requests = load_manifest(Path::new(&manifest_path))?;
            if requests.is_empty() {
                return Err(FetchPrepError::CliArgumentValidation {
                    details: format!("No valid download entries found in {manifest_path}."),
                });
            }

            Ok(ResolvedCommand::BatchDownload(BatchDownloadParams {
                requests,
                config,
                report_path: report_path.map(PathBuf::from),
            }))
        }

        Command::Verify {
            file,
            checksum,
            algorithm,
        } => {
            let algorithm: ChecksumAlgorithm = algorithm.parse()?;
            Ok(ResolvedCommand::Verify(VerifyParams {
                file: PathBuf::from(file),
                expected: checksum,
                algorithm,
                chunk_size: TransferConfig::default().chunk_size,
            }))
        }

        Command::GetInfo { url, config_path } => {
            let config = resolve_transfer_config(config_path.as_deref(), quiet)?;
            let url = parse_url(&url)?;
            Ok(ResolvedCommand::GetInfo(GetInfoParams { url, config }))
        }
    }
}

fn resolve_transfer_config(
    config_path: Option<&str>,
    quiet: bool,
) -> Result<TransferConfig, FetchPrepError> {
    let settings = match config_path {
        Some(path) => load_settings(path)?,
        None => Settings::default(),
    };
    let mut config = TransferConfig::from(settings);
    if quiet {
        config.show_progress = false;
    }
    Ok(config)
}

fn parse_url(url: &str) -> Result<Url, FetchPrepError> {
    Url::parse(url).map_err(|err| FetchPrepError::InvalidUrl {
        url: url.to_string(),
        reason: err.to_string(),
    })
}
