use digest::Digest;
use md5::Md5;
use serde::{Deserialize, Serialize};
use sha1::Sha1;
use sha2::{Sha256, Sha512};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use tokio::io::AsyncReadExt;

#[derive(Error, Debug)]
pub enum ChecksumError {
    #[error("Unsupported checksum algorithm: {name}")]
    UnsupportedAlgorithm { name: String },

    #[error("Failed to read {path} while hashing: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Digest algorithms the engine can compute and verify.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChecksumAlgorithm {
    Md5,
    Sha1,
    Sha256,
    Sha512,
}

impl ChecksumAlgorithm {
    pub const ALL: [ChecksumAlgorithm; 4] = [
        ChecksumAlgorithm::Md5,
        ChecksumAlgorithm::Sha1,
        ChecksumAlgorithm::Sha256,
        ChecksumAlgorithm::Sha512,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChecksumAlgorithm::Md5 => "md5",
            ChecksumAlgorithm::Sha1 => "sha1",
            ChecksumAlgorithm::Sha256 => "sha256",
            ChecksumAlgorithm::Sha512 => "sha512",
        }
    }
}

impl std::fmt::Display for ChecksumAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChecksumAlgorithm {
    type Err = ChecksumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "md5" => Ok(ChecksumAlgorithm::Md5),
            "sha1" => Ok(ChecksumAlgorithm::Sha1),
            "sha256" => Ok(ChecksumAlgorithm::Sha256),
            "sha512" => Ok(ChecksumAlgorithm::Sha512),
            other => Err(ChecksumError::UnsupportedAlgorithm {
                name: other.to_string(),
            }),
        }
    }
}

/// Incremental hasher dispatching over the supported algorithms.
///
/// Memory use is independent of input size: feed bounded chunks through
/// [`StreamingHasher::update`] and take the hex digest at the end.
pub enum StreamingHasher {
    Md5(Md5),
    Sha1(Sha1),
    Sha256(Sha256),
    Sha512(Sha512),
}

impl StreamingHasher {
    pub fn new(algorithm: ChecksumAlgorithm) -> Self {
        match algorithm {
            ChecksumAlgorithm::Md5 => StreamingHasher::Md5(Md5::new()),
            ChecksumAlgorithm::Sha1 => StreamingHasher::Sha1(Sha1::new()),
            ChecksumAlgorithm::Sha256 => StreamingHasher::Sha256(Sha256::new()),
            ChecksumAlgorithm::Sha512 => StreamingHasher::Sha512(Sha512::new()),
        }
    }

    #[inline]
    pub fn update(&mut self, data: impl AsRef<[u8]>) {
        match self {
            StreamingHasher::Md5(digest) => Digest::update(digest, data.as_ref()),
            StreamingHasher::Sha1(digest) => Digest::update(digest, data.as_ref()),
            StreamingHasher::Sha256(digest) => Digest::update(digest, data.as_ref()),
            StreamingHasher::Sha512(digest) => Digest::update(digest, data.as_ref()),
        }
    }

    pub fn finalize(self) -> String {
        match self {
            StreamingHasher::Md5(digest) => hex::encode(digest.finalize()),
            StreamingHasher::Sha1(digest) => hex::encode(digest.finalize()),
            StreamingHasher::Sha256(digest) => hex::encode(digest.finalize()),
            StreamingHasher::Sha512(digest) => hex::encode(digest.finalize()),
        }
    }
}

/// Compute the hex digest of a file, reading it in `chunk_size` pieces.
pub async fn digest_file(
    path: &Path,
    algorithm: ChecksumAlgorithm,
    chunk_size: usize,
) -> Result<String, ChecksumError> {
    let io_err = |source| ChecksumError::Io {
        path: path.to_path_buf(),
        source,
    };

    let file = tokio::fs::File::open(path).await.map_err(io_err)?;
    let mut reader = tokio::io::BufReader::new(file);
    let mut buffer = vec![0u8; chunk_size.max(1)];
    let mut hasher = StreamingHasher::new(algorithm);

    loop {
        let bytes_read = reader.read(&mut buffer).await.map_err(io_err)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hasher.finalize())
}

/// Verify a file against an expected hex digest, comparing case-insensitively.
pub async fn verify_file(
    path: &Path,
    expected: &str,
    algorithm: ChecksumAlgorithm,
    chunk_size: usize,
) -> Result<bool, ChecksumError> {
    let actual = digest_file(path, algorithm, chunk_size).await?;
    Ok(actual.eq_ignore_ascii_case(expected))
}
