pub mod cli;
pub mod config;
pub mod download;
pub mod error;
pub mod manifest;
pub mod progress;
pub mod verification;

pub use config::Settings;
pub use download::{
    BatchReport, BatchSummary, DownloadInfo, Downloader, ErrorCategory, TransferConfig,
    TransferOutcome, TransferRequest,
};
pub use error::FetchPrepError;
pub use verification::ChecksumAlgorithm;
