use clap::{ArgAction, Parser, Subcommand};
use tracing::Level;
use tracing_subscriber;

#[derive(Debug, Clone)]
pub enum Command {
    Download {
        url: String,
        output: String,
        config_path: Option<String>,
        retries: Option<u32>,
        timeout_secs: Option<u64>,
        chunk_size: Option<usize>,
        no_resume: bool,
        verify_md5: Option<String>,
        verify_sha1: Option<String>,
        verify_sha256: Option<String>,
        verify_sha512: Option<String>,
    },
    BatchDownload {
        manifest_path: String,
        config_path: Option<String>,
        retries: Option<u32>,
        timeout_secs: Option<u64>,
        parallel: Option<usize>,
        report_path: Option<String>,
    },
    Verify {
        file: String,
        checksum: String,
        algorithm: String,
    },
    GetInfo {
        url: String,
        config_path: Option<String>,
    },
}

pub struct Args {
    pub command: Command,
    pub log_level: Level,
    pub quiet: bool,
}

#[derive(Debug, Parser)]
#[command(
    name = "fetchprep",
    version,
    about = "Download files over HTTP with retry, resume, checksum verification and parallel batches"
)]
struct Cli {
    #[arg(
        short = 'v',
        long = "verbose",
        help = "Sets the level of verbosity",
        action = ArgAction::Count,
        global = true
    )]
    verbose: u8,

    #[arg(
        short = 'q',
        long = "quiet",
        help = "Suppress progress output",
        action = ArgAction::SetTrue,
        global = true
    )]
    quiet: bool,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Debug, Subcommand)]
enum CliCommand {
    /// Download a single file
    Download {
        #[arg(value_name = "URL", help = "URL to download")]
        url: String,

        #[arg(value_name = "OUTPUT", help = "Output file path")]
        output: String,

        #[arg(
            short = 'c',
            long = "config",
            value_name = "FILE",
            help = "Optional settings file with engine defaults"
        )]
        config: Option<String>,

        #[arg(long = "retries", value_name = "N", help = "Number of retries")]
        retries: Option<u32>,

        #[arg(long = "timeout", value_name = "SECONDS", help = "Network timeout in seconds")]
        timeout: Option<u64>,

        #[arg(long = "chunk-size", value_name = "BYTES", help = "File read chunk size")]
        chunk_size: Option<usize>,

        #[arg(long = "no-resume", action = ArgAction::SetTrue, help = "Disable resume capability")]
        no_resume: bool,

        #[arg(long = "verify-md5", value_name = "DIGEST", help = "Verify MD5 checksum")]
        verify_md5: Option<String>,

        #[arg(long = "verify-sha1", value_name = "DIGEST", help = "Verify SHA1 checksum")]
        verify_sha1: Option<String>,

        #[arg(long = "verify-sha256", value_name = "DIGEST", help = "Verify SHA256 checksum")]
        verify_sha256: Option<String>,

        #[arg(long = "verify-sha512", value_name = "DIGEST", help = "Verify SHA512 checksum")]
        verify_sha512: Option<String>,
    },

    /// Download multiple files listed in a manifest
    BatchDownload {
        #[arg(
            value_name = "MANIFEST",
            help = "Manifest file with tab-separated URL, destination and optional algorithm:digest"
        )]
        manifest: String,

        #[arg(
            short = 'c',
            long = "config",
            value_name = "FILE",
            help = "Optional settings file with engine defaults"
        )]
        config: Option<String>,

        #[arg(long = "retries", value_name = "N", help = "Number of retries")]
        retries: Option<u32>,

        #[arg(long = "timeout", value_name = "SECONDS", help = "Network timeout in seconds")]
        timeout: Option<u64>,

        #[arg(long = "parallel", value_name = "N", help = "Max parallel downloads")]
        parallel: Option<usize>,

        #[arg(
            long = "report",
            value_name = "FILE",
            help = "Write the per-item outcome report as JSON"
        )]
        report: Option<String>,
    },

    /// Verify a local file against an expected checksum
    Verify {
        #[arg(value_name = "FILE", help = "File to verify")]
        file: String,

        #[arg(value_name = "CHECKSUM", help = "Expected checksum")]
        checksum: String,

        #[arg(
            long = "algorithm",
            value_name = "ALGORITHM",
            help = "Checksum algorithm (md5, sha1, sha256, sha512)",
            default_value = "sha256"
        )]
        algorithm: String,
    },

    /// Probe download metadata without transferring the body
    GetInfo {
        #[arg(value_name = "URL", help = "URL to probe")]
        url: String,

        #[arg(
            short = 'c',
            long = "config",
            value_name = "FILE",
            help = "Optional settings file with engine defaults"
        )]
        config: Option<String>,
    },
}

pub fn parse_args() -> Args {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(log_level.into())
                .from_env_lossy(),
        )
        .init();

    let command = match cli.command {
        CliCommand::Download {
            url,
            output,
            config,
            retries,
            timeout,
            chunk_size,
            no_resume,
            verify_md5,
            verify_sha1,
            verify_sha256,
            verify_sha512,
        } => Command::Download {
            url,
            output,
            config_path: config,
            retries,
            timeout_secs: timeout,
            chunk_size,
            no_resume,
            verify_md5,
            verify_sha1,
            verify_sha256,
            verify_sha512,
        },
        CliCommand::BatchDownload {
            manifest,
            config,
            retries,
            timeout,
            parallel,
            report,
        } => Command::BatchDownload {
            manifest_path: manifest,
            config_path: config,
            retries,
            timeout_secs: timeout,
            parallel,
            report_path: report,
        },
        CliCommand::Verify {
            file,
            checksum,
            algorithm,
        } => Command::Verify {
            file,
            checksum,
            algorithm,
        },
        CliCommand::GetInfo { url, config } => Command::GetInfo {
            url,
            config_path: config,
        },
    };

    Args {
        command,
        log_level,
        quiet: cli.quiet,
    }
}
