//! Streaming file hasher for prefix and full content digests.
//!
//! # Overview
//!
//! The [`Hasher`] computes two kinds of digest:
//! - **prehash**: over the first [`PREHASH_SIZE`] bytes only (the whole file if
//!   it is shorter), used as a cheap discriminator
//! - **full hash**: over the entire content, streamed in [`BLOCK_SIZE`] blocks
//!   so memory use does not depend on file size
//!
//! SHA-256 is the default digest. BLAKE3 can be selected instead; both
//! produce 32-byte digests so the rest of the pipeline does not care.
//!
//! # Example
//!
//! ```no_run
//! use dupehunt::scanner::{hash_to_hex, Hasher};
//! use std::path::Path;
//!
//! let hasher = Hasher::new();
//! let digest = hasher.full_hash(Path::new("photo.jpg")).unwrap();
//! println!("{}", hash_to_hex(&digest));
//! ```

use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::Digest;

use super::HashError;

/// Number of leading bytes covered by a prehash.
pub const PREHASH_SIZE: usize = 4096;

/// Read block size for full-content hashing.
pub const BLOCK_SIZE: usize = 64 * 1024;

/// A 32-byte content digest.
pub type Hash = [u8; 32];

/// Digest algorithm used for prefix and full hashes.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    /// SHA-256
    #[default]
    Sha256,
    /// BLAKE3
    Blake3,
}

impl std::fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sha256 => write!(f, "sha256"),
            Self::Blake3 => write!(f, "blake3"),
        }
    }
}

/// In-progress digest state for either algorithm.
enum DigestState {
    Sha256(sha2::Sha256),
    Blake3(Box<blake3::Hasher>),
}

impl DigestState {
    fn new(algorithm: HashAlgorithm) -> Self {
        match algorithm {
            HashAlgorithm::Sha256 => Self::Sha256(sha2::Sha256::new()),
            HashAlgorithm::Blake3 => Self::Blake3(Box::new(blake3::Hasher::new())),
        }
    }

    fn update(&mut self, data: &[u8]) {
        match self {
            Self::Sha256(h) => h.update(data),
            Self::Blake3(h) => {
                h.update(data);
            }
        }
    }

    fn finalize(self) -> Hash {
        match self {
            Self::Sha256(h) => h.finalize().into(),
            Self::Blake3(h) => *h.finalize().as_bytes(),
        }
    }
}

/// File hasher for the prehash and full hash phases.
///
/// Stateless apart from its settings, so a single instance can be shared
/// between worker threads behind an `Arc` or a plain reference.
#[derive(Debug, Clone, Default)]
pub struct Hasher {
    algorithm: HashAlgorithm,
    retry_reads: bool,
}

impl Hasher {
    /// Create a SHA-256 hasher without read retries.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a hasher for the given algorithm.
    #[must_use]
    pub fn with_algorithm(algorithm: HashAlgorithm) -> Self {
        Self {
            algorithm,
            retry_reads: false,
        }
    }

    /// Retry a failed read once when the failure looks transient.
    ///
    /// Missing files and permission errors are never retried.
    #[must_use]
    pub fn with_retry_reads(mut self, enabled: bool) -> Self {
        self.retry_reads = enabled;
        self
    }

    /// The digest algorithm in use.
    #[must_use]
    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// Hash the first [`PREHASH_SIZE`] bytes of a file.
    ///
    /// Files shorter than the prefix are hashed in full, so for them the
    /// prehash equals the full hash.
    ///
    /// # Errors
    ///
    /// Returns a [`HashError`] if the file cannot be opened or read.
    pub fn prehash(&self, path: &Path) -> Result<Hash, HashError> {
        self.with_retry(path, |p| self.read_prefix(p))
    }

    /// Hash the entire content of a file.
    ///
    /// # Errors
    ///
    /// Returns a [`HashError`] if the file cannot be opened or any block
    /// fails to read. A partially computed digest is discarded.
    pub fn full_hash(&self, path: &Path) -> Result<Hash, HashError> {
        self.with_retry(path, |p| self.read_full(p))
    }

    /// Hash an in-memory buffer with this hasher's algorithm.
    #[must_use]
    pub fn hash_bytes(&self, data: &[u8]) -> Hash {
        let mut state = DigestState::new(self.algorithm);
        state.update(data);
        state.finalize()
    }

    fn with_retry<F>(&self, path: &Path, op: F) -> Result<Hash, HashError>
    where
        F: Fn(&Path) -> Result<Hash, HashError>,
    {
        match op(path) {
            Err(e) if self.retry_reads && e.is_transient() => {
                log::debug!("Retrying read of {} after error: {}", path.display(), e);
                op(path)
            }
            other => other,
        }
    }

    fn read_prefix(&self, path: &Path) -> Result<Hash, HashError> {
        let file = File::open(path).map_err(|e| HashError::from_io(path, e))?;
        let mut buffer = Vec::with_capacity(PREHASH_SIZE);
        file.take(PREHASH_SIZE as u64)
            .read_to_end(&mut buffer)
            .map_err(|e| HashError::from_io(path, e))?;
        Ok(self.hash_bytes(&buffer))
    }

    fn read_full(&self, path: &Path) -> Result<Hash, HashError> {
        let mut file = File::open(path).map_err(|e| HashError::from_io(path, e))?;
        let mut state = DigestState::new(self.algorithm);
        let mut buffer = vec![0u8; BLOCK_SIZE];
        loop {
            match file.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => state.update(&buffer[..n]),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(HashError::from_io(path, e)),
            }
        }
        Ok(state.finalize())
    }
}

/// Render a digest as lowercase hexadecimal.
#[must_use]
pub fn hash_to_hex(hash: &Hash) -> String {
    use std::fmt::Write;
    hash.iter().fold(String::with_capacity(64), |mut out, b| {
        let _ = write!(out, "{b:02x}");
        out
    })
}
