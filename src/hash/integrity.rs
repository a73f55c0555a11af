//! Integrity verification using content digests
//!
//! Supports SHA-256 and BLAKE3, both with a standard remote checksum
//! command counterpart. All hashing is streaming with constant memory.

use crate::config::HashAlgorithm;
use crate::error::{IoResultExt, Result, SigmaCopyError};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Hash result as hex string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashResult {
    /// The hash algorithm used
    pub algorithm: HashAlgorithm,
    /// Hash value as lowercase hex string
    pub hash: String,
    /// Content size in bytes
    pub size: u64,
}

impl HashResult {
    /// Create a new hash result
    pub fn new(algorithm: HashAlgorithm, hash: String, size: u64) -> Self {
        Self { algorithm, hash, size }
    }

    /// Verify against another hash result
    pub fn verify(&self, other: &HashResult) -> bool {
        self.algorithm == other.algorithm && self.hash == other.hash
    }
}

impl std::fmt::Display for HashResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.hash)
    }
}

/// Unified hasher that supports all algorithms
pub enum Hasher {
    /// SHA-256
    Sha256(sha2::Sha256),
    /// BLAKE3
    Blake3(blake3::Hasher),
}

impl Hasher {
    /// Create a new hasher for the given algorithm
    pub fn new(algorithm: HashAlgorithm) -> Self {
        match algorithm {
            HashAlgorithm::Sha256 => {
                use sha2::Digest;
                Self::Sha256(sha2::Sha256::new())
            }
            HashAlgorithm::Blake3 => Self::Blake3(blake3::Hasher::new()),
        }
    }

    /// Get the algorithm this hasher uses
    pub fn algorithm(&self) -> HashAlgorithm {
        match self {
            Self::Sha256(_) => HashAlgorithm::Sha256,
            Self::Blake3(_) => HashAlgorithm::Blake3,
        }
    }

    /// Update the hasher with more data
    pub fn update(&mut self, data: &[u8]) {
        match self {
            Self::Sha256(h) => {
                use sha2::Digest;
                h.update(data);
            }
            Self::Blake3(h) => {
                h.update(data);
            }
        }
    }

    /// Finalize and get the hash as lowercase hex string
    pub fn finalize(self) -> String {
        match self {
            Self::Sha256(h) => {
                use sha2::Digest;
                let result = h.finalize();
                hex::encode(result)
            }
            Self::Blake3(h) => h.finalize().to_hex().to_string(),
        }
    }
}

/// Compute hash of a file
pub fn hash_file(path: &Path, algorithm: HashAlgorithm) -> Result<HashResult> {
    hash_file_with_buffer(path, algorithm, 1024 * 1024) // 1MB buffer
}

/// Compute hash of a file with custom buffer size
pub fn hash_file_with_buffer(
    path: &Path,
    algorithm: HashAlgorithm,
    buffer_size: usize,
) -> Result<HashResult> {
    let file = File::open(path).with_path(path)?;
    let mut reader = BufReader::with_capacity(buffer_size, file);
    let mut hasher = Hasher::new(algorithm);
    let mut buffer = vec![0u8; buffer_size];
    let mut size = 0u64;

    loop {
        let bytes_read = reader.read(&mut buffer).map_err(|e| SigmaCopyError::io(path, e))?;

        if bytes_read == 0 {
            break;
        }

        hasher.update(&buffer[..bytes_read]);
        size += bytes_read as u64;
    }

    Ok(HashResult::new(algorithm, hasher.finalize(), size))
}

/// Compute hash of data in memory
pub fn hash_bytes(data: &[u8], algorithm: HashAlgorithm) -> HashResult {
    let mut hasher = Hasher::new(algorithm);
    hasher.update(data);
    HashResult::new(algorithm, hasher.finalize(), data.len() as u64)
}

/// Extract the digest from remote checksum-command output.
///
/// Commands like `sha256sum` print `<digest>  <path>`; only the first
/// whitespace-delimited token is the digest. The token is normalized to
/// lowercase and checked against the algorithm's expected length.
pub fn parse_digest_output(raw: &str, algorithm: HashAlgorithm) -> Result<String> {
    let token = raw
        .split_whitespace()
        .next()
        .ok_or_else(|| SigmaCopyError::DigestParseError("empty digest output".to_string()))?;

    let digest = token.to_lowercase();

    if digest.len() != algorithm.digest_len() || !digest.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(SigmaCopyError::DigestParseError(format!(
            "'{}' is not a {}-char hex digest",
            token,
            algorithm.digest_len()
        )));
    }

    Ok(digest)
}
