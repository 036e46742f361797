use crate::cli::params::VerifyParams;
use crate::error::FetchPrepError;
use crate::verification::{digest_file, verify_file};

pub async fn run_verify(params: VerifyParams) -> Result<(), FetchPrepError> {
    if !params.file.exists() {
        return Err(FetchPrepError::FileNotFound { path: params.file });
    }

    let algorithm_label = params.algorithm.as_str().to_uppercase();
    let matches = verify_file(
        &params.file,
        &params.expected,
        params.algorithm,
        params.chunk_size,
    )
    .await?;

    if matches {
        println!("✓ Checksum verification successful ({algorithm_label})");
        Ok(())
    } else {
        let actual = digest_file(&params.file, params.algorithm, params.chunk_size).await?;
        println!("✗ Checksum verification failed ({algorithm_label})");
        println!("  Expected: {}", params.expected);
        println!("  Actual:   {actual}");
        Err(FetchPrepError::VerificationFailed {
            path: params.file,
            expected: params.expected,
            actual,
        })
    }
}
