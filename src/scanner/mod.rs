//! Scanner module for directory traversal, filtering, and file hashing.
//!
//! This module provides functionality for:
//! - Iterative directory walking over several roots
//! - Predicate-based filtering on size, extension, name, and dates
//! - Content hashing with MD5 (streaming)
//!
//! # Architecture
//!
//! The scanner is divided into submodules:
//! - [`walker`]: Directory traversal and file discovery
//! - [`filter`]: The [`FilterConfig`] predicate
//! - [`hasher`]: MD5 file hashing (streaming)
//!
//! # Example
//!
//! ```no_run
//! use dupefind::scanner::{FileRecord, FilterConfig, Walker};
//! use std::path::PathBuf;
//!
//! let config = FilterConfig::default()
//!     .with_extensions(["pdf"])
//!     .with_include_subfolders(true);
//!
//! let walker = Walker::new(vec![PathBuf::from(".")], config.include_subfolders);
//! for path in walker.walk() {
//!     if let Ok(record) = FileRecord::from_path(&path) {
//!         if config.matches(&record) {
//!             println!("{}: {} bytes", record.path().display(), record.size());
//!         }
//!     }
//! }
//! ```

pub mod filter;
pub mod hasher;
pub mod walker;

use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::SystemTime;

use chrono::{DateTime, Local, NaiveDate};

// Re-export main types
pub use filter::{matches, DateFilter, DateOperator, FilterConfig, SizeUnit};
pub use hasher::{ContentHash, Hasher, CHUNK_SIZE, ERROR_HASH};
pub use walker::{Walk, WalkStats, Walker};

/// Read-only snapshot of one file taken at scan time.
///
/// Every field is fixed at construction except the content hash, which is
/// computed on first request and then cached on the record.
#[derive(Debug, Clone)]
pub struct FileRecord {
    path: PathBuf,
    name: String,
    parent: PathBuf,
    size: u64,
    extension: String,
    created: Option<SystemTime>,
    modified: Option<SystemTime>,
    content_hash: OnceLock<ContentHash>,
}

impl FileRecord {
    /// Build a record from already-known attributes.
    ///
    /// # Arguments
    ///
    /// * `path` - Absolute path to the file
    /// * `size` - File size in bytes
    /// * `created` - Creation time, `None` if the platform cannot report it
    /// * `modified` - Last modification time, `None` if unreadable
    #[must_use]
    pub fn from_parts(
        path: PathBuf,
        size: u64,
        created: Option<SystemTime>,
        modified: Option<SystemTime>,
    ) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let parent = path.parent().map(Path::to_path_buf).unwrap_or_default();
        let extension = extension_of(&path);

        Self {
            path,
            name,
            parent,
            size,
            extension,
            created,
            modified,
            content_hash: OnceLock::new(),
        }
    }

    /// Read the metadata of `path` and build a record from it.
    ///
    /// Symbolic links are followed, matching normal directory-listing
    /// semantics.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError`] if the metadata cannot be read or the path
    /// does not name a regular file.
    pub fn from_path(path: &Path) -> Result<Self, ScanError> {
        let metadata = std::fs::metadata(path).map_err(|e| ScanError::from_io(path, e))?;
        if !metadata.is_file() {
            return Err(ScanError::NotAFile(path.to_path_buf()));
        }

        Ok(Self::from_parts(
            path.to_path_buf(),
            metadata.len(),
            metadata.created().ok(),
            metadata.modified().ok(),
        ))
    }

    /// Absolute path, the identity of the record within a scan.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name without its parent directories.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Directory containing the file.
    #[must_use]
    pub fn parent(&self) -> &Path {
        &self.parent
    }

    /// File size in bytes.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.size
    }

    /// File size in mebibytes (bytes / 1,048,576).
    #[must_use]
    pub fn size_mb(&self) -> f64 {
        self.size as f64 / BYTES_PER_MB
    }

    /// Lower-cased extension without the dot, empty if there is none.
    #[must_use]
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Creation date in the local time zone.
    #[must_use]
    pub fn creation_date(&self) -> Option<NaiveDate> {
        self.created.map(local_date)
    }

    /// Modification date in the local time zone.
    #[must_use]
    pub fn modification_date(&self) -> Option<NaiveDate> {
        self.modified.map(local_date)
    }

    /// Raw modification time, if known.
    #[must_use]
    pub fn modified(&self) -> Option<SystemTime> {
        self.modified
    }

    /// Content hash, computing it with `hasher` on first call.
    ///
    /// Later calls return the cached value without touching the file,
    /// even when a different hasher is passed.
    pub fn content_hash(&self, hasher: &Hasher) -> &ContentHash {
        self.content_hash.get_or_init(|| hasher.hash(&self.path))
    }

    /// The cached content hash, `None` until [`Self::content_hash`] ran.
    #[must_use]
    pub fn cached_hash(&self) -> Option<&ContentHash> {
        self.content_hash.get()
    }
}

/// Number of bytes in one MB as used by the size filters.
pub const BYTES_PER_MB: f64 = 1_048_576.0;

fn extension_of(path: &Path) -> String {
    path.extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

fn local_date(time: SystemTime) -> NaiveDate {
    DateTime::<Local>::from(time).date_naive()
}

/// Errors that can occur while reading a file's attributes.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// Permission was denied when accessing a file or directory.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The specified path was not found.
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// The path exists but is not a regular file.
    #[error("Not a regular file: {0}")]
    NotAFile(PathBuf),

    /// An I/O error occurred while accessing a file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl ScanError {
    /// Classify an I/O error raised for `path`.
    #[must_use]
    pub fn from_io(path: &Path, error: std::io::Error) -> Self {
        use std::io::ErrorKind;

        match error.kind() {
            ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: error,
            },
        }
    }
}

/// Errors that can occur during file hashing.
#[derive(thiserror::Error, Debug)]
pub enum HashError {
    /// The specified file was not found.
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    /// Permission was denied when reading the file.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// An I/O error occurred while reading the file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl HashError {
    /// Classify an I/O error raised while hashing `path`.
    #[must_use]
    pub fn from_io(path: &Path, error: std::io::Error) -> Self {
        use std::io::ErrorKind;

        match error.kind() {
            ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: error,
            },
        }
    }
}
