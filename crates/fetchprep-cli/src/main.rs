use fetchprep_lib::cli::{
    ResolvedCommand, parse_args, resolve_command, run_batch_download, run_download, run_get_info,
    run_verify,
};
use fetchprep_lib::error::FetchPrepError;

#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<(), FetchPrepError> {
    color_eyre::install()?;

    let args = parse_args();
    let command = resolve_command(args.command, args.quiet)?;

    match command {
        ResolvedCommand::Download(params) => run_download(params).await?,
        ResolvedCommand::BatchDownload(params) => run_batch_download(params).await?,
        ResolvedCommand::Verify(params) => run_verify(params).await?,
        ResolvedCommand::GetInfo(params) => run_get_info(params).await?,
    }

    Ok(())
}
