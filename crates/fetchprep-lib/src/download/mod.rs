mod batch;
mod executor;
mod info;
mod retry;
mod types;

pub use executor::Downloader;
pub use info::DownloadInfo;
pub use retry::{RetryAction, RetryPolicy, retry_with_backoff};
pub use types::{
    BatchReport, BatchSummary, DownloadError, ErrorCategory, TransferConfig, TransferOutcome,
    TransferRequest,
};
