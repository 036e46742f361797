mod args;
mod batch_download;
mod download;
mod get_info;
mod params;
mod resolved_command;
mod verify;

pub use args::{Args, Command, parse_args};
pub use batch_download::run_batch_download;
pub use download::run_download;
pub use get_info::run_get_info;
pub use params::{BatchDownloadParams, DownloadParams, GetInfoParams, VerifyParams};
pub use resolved_command::{ResolvedCommand, resolve_command};
pub use verify::run_verify;
