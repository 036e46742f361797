use crate::download::{TransferConfig, TransferRequest};
use crate::verification::ChecksumAlgorithm;
use std::path::PathBuf;
use url::Url;

#[derive(Debug, Clone)]
pub struct DownloadParams {
    pub request: TransferRequest,
    pub config: TransferConfig,
}

#[derive(Debug, Clone)]
pub struct BatchDownloadParams {
    pub requests: Vec<TransferRequest>,
    pub config: TransferConfig,
    pub report_path: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct VerifyParams {
    pub file: PathBuf,
    pub expected: String,
    pub algorithm: ChecksumAlgorithm,
    pub chunk_size: usize,
}

#[derive(Debug, Clone)]
pub struct GetInfoParams {
    pub url: Url,
    pub config: TransferConfig,
}
