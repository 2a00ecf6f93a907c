//! MD5 file hasher with streaming support.
//!
//! # Overview
//!
//! This module provides the [`Hasher`] struct for computing MD5 digests
//! of file contents in fixed-size chunks, so memory use is independent
//! of file size. MD5 is used for equality detection only, not for
//! tamper detection.
//!
//! Failures do not propagate: [`Hasher::hash`] folds any I/O error into
//! [`ContentHash::Error`], whose textual form is [`ERROR_HASH`].
//!
//! # Example
//!
//! ```no_run
//! use dupefind::scanner::Hasher;
//! use std::path::Path;
//!
//! let hasher = Hasher::new();
//! let hash = hasher.hash(Path::new("Cargo.toml"));
//! println!("{}", hash);
//! ```

use std::fmt;
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;

use super::HashError;

/// Read buffer size used when streaming file contents (8 KiB).
pub const CHUNK_SIZE: usize = 8 * 1024;

/// Textual value shared by every failed hash.
pub const ERROR_HASH: &str = "ERROR";

/// Outcome of hashing one file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ContentHash {
    /// Lowercase hex MD5 digest of the file bytes.
    Digest(String),
    /// The file could not be read.
    Error,
}

impl ContentHash {
    /// String form used as the grouping key.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Digest(hex) => hex,
            Self::Error => ERROR_HASH,
        }
    }

    /// Whether hashing failed.
    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error)
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Streaming MD5 hasher.
#[derive(Debug, Clone)]
pub struct Hasher {
    buffer_size: usize,
}

impl Default for Hasher {
    fn default() -> Self {
        Self::new()
    }
}

impl Hasher {
    /// Create a hasher reading [`CHUNK_SIZE`] bytes at a time.
    #[must_use]
    pub fn new() -> Self {
        Self {
            buffer_size: CHUNK_SIZE,
        }
    }

    /// Use a custom read buffer size (at least one byte).
    #[must_use]
    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size.max(1);
        self
    }

    /// Current read buffer size.
    #[must_use]
    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    /// Hash the file at `path`, folding failures into [`ContentHash::Error`].
    pub fn hash(&self, path: &Path) -> ContentHash {
        match self.try_hash(path) {
            Ok(hex) => ContentHash::Digest(hex),
            Err(e) => {
                log::warn!("Failed to hash {}: {}", path.display(), e);
                ContentHash::Error
            }
        }
    }

    /// Hash the file at `path`, returning the lowercase hex digest.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] if the file cannot be opened or read.
    pub fn try_hash(&self, path: &Path) -> Result<String, HashError> {
        let mut file = File::open(path).map_err(|e| HashError::from_io(path, e))?;
        let mut context = md5::Context::new();
        let mut buffer = vec![0u8; self.buffer_size];

        loop {
            let read = match file.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(HashError::from_io(path, e)),
            };
            context.consume(&buffer[..read]);
        }

        Ok(format!("{:x}", context.compute()))
    }

    /// Hash an in-memory buffer. Matches [`Self::try_hash`] for a file with
    /// the same bytes.
    #[must_use]
    pub fn hash_bytes(data: &[u8]) -> String {
        format!("{:x}", md5::compute(data))
    }
}
