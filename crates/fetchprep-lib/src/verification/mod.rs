mod hasher;

pub use hasher::{ChecksumAlgorithm, ChecksumError, StreamingHasher, digest_file, verify_file};
