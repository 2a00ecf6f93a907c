//! Size and hash bucketing, and duplicate group types.
//!
//! # Overview
//!
//! Duplicate detection runs in two bucketing passes:
//!
//! 1. **Size**: files are grouped by exact byte size. A size shared by a
//!    single file cannot hold a duplicate, so that file is never hashed.
//! 2. **Hash**: inside each size bucket of two or more files, files are
//!    grouped by content hash. Only hash buckets with two or more files
//!    become a [`DuplicateGroup`].
//!
//! Both passes preserve first-seen order: buckets appear in the order their
//! first member was seen, and members keep their input order.
//!
//! # Example
//!
//! ```
//! use dupefind::scanner::FileRecord;
//! use dupefind::duplicates::group_by_size;
//! use std::path::PathBuf;
//!
//! let files = vec![
//!     FileRecord::from_parts(PathBuf::from("/a.txt"), 100, None, None),
//!     FileRecord::from_parts(PathBuf::from("/b.txt"), 100, None, None),
//!     FileRecord::from_parts(PathBuf::from("/c.txt"), 200, None, None),
//! ];
//!
//! let (groups, stats) = group_by_size(files);
//!
//! assert_eq!(groups.len(), 1);
//! assert_eq!(groups[0].size, 100);
//! assert_eq!(stats.total_files, 3);
//! assert_eq!(stats.eliminated_unique, 1);
//! ```

use std::collections::HashMap;
use std::hash::Hash;
use std::path::PathBuf;

use crate::scanner::{ContentHash, FileRecord};

/// Group `items` by key, preserving first-seen order.
///
/// Items for which `key` returns `None` are dropped.
pub fn bucket_ordered<T, K, F>(items: impl IntoIterator<Item = T>, mut key: F) -> Vec<(K, Vec<T>)>
where
    K: Hash + Eq + Clone,
    F: FnMut(&T) -> Option<K>,
{
    let mut index: HashMap<K, usize> = HashMap::new();
    let mut buckets: Vec<(K, Vec<T>)> = Vec::new();

    for item in items {
        let Some(k) = key(&item) else {
            continue;
        };
        match index.get(&k) {
            Some(&slot) => buckets[slot].1.push(item),
            None => {
                index.insert(k.clone(), buckets.len());
                buckets.push((k, vec![item]));
            }
        }
    }

    buckets
}

/// Files sharing one exact size.
#[derive(Debug, Clone)]
pub struct SizeGroup {
    /// File size in bytes (shared by all files in this group)
    pub size: u64,
    /// Files with this exact size, in discovery order
    pub files: Vec<FileRecord>,
}

impl SizeGroup {
    /// Create a size group with initial files.
    #[must_use]
    pub fn with_files(size: u64, files: Vec<FileRecord>) -> Self {
        Self { size, files }
    }

    /// Check if this group has potential duplicates (2+ files).
    #[must_use]
    pub fn has_duplicates(&self) -> bool {
        self.files.len() > 1
    }

    /// Total size of all files in this group.
    #[must_use]
    pub fn total_size(&self) -> u64 {
        self.size * self.files.len() as u64
    }
}

/// Confirmed group of files with identical size and content hash.
///
/// Always holds at least two files.
#[derive(Debug, Clone)]
pub struct DuplicateGroup {
    /// Identifier, unique and increasing within one scan, starting at 1
    pub id: usize,
    /// Shared content hash
    pub hash: ContentHash,
    /// Shared file size in bytes
    pub size: u64,
    /// Members in discovery order
    pub files: Vec<FileRecord>,
}

impl DuplicateGroup {
    /// Number of files in this group.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Check if this group is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Total size of all files in this group.
    #[must_use]
    pub fn total_size(&self) -> u64 {
        self.size * self.files.len() as u64
    }

    /// Space taken by all copies but one.
    #[must_use]
    pub fn wasted_space(&self) -> u64 {
        self.size * self.duplicate_count() as u64
    }

    /// Number of duplicate copies (total - 1 original).
    #[must_use]
    pub fn duplicate_count(&self) -> usize {
        self.files.len().saturating_sub(1)
    }

    /// Whether the members only share the unreadable-file sentinel.
    #[must_use]
    pub fn is_unreadable(&self) -> bool {
        self.hash.is_error()
    }

    /// Get just the paths of files in this group.
    #[must_use]
    pub fn paths(&self) -> Vec<PathBuf> {
        self.files.iter().map(|f| f.path().to_path_buf()).collect()
    }
}

/// Statistics from the size grouping phase.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupingStats {
    /// Total number of files processed
    pub total_files: usize,
    /// Total size of all files in bytes
    pub total_size: u64,
    /// Number of unique file sizes
    pub unique_sizes: usize,
    /// Number of files that could be duplicates (in groups of 2+)
    pub potential_duplicates: usize,
    /// Number of files eliminated as unique (singleton groups)
    pub eliminated_unique: usize,
    /// Number of size groups with 2+ files
    pub duplicate_groups: usize,
}

impl GroupingStats {
    /// Percentage of files eliminated by size grouping.
    #[must_use]
    pub fn elimination_rate(&self) -> f64 {
        if self.total_files == 0 {
            0.0
        } else {
            (self.eliminated_unique as f64 / self.total_files as f64) * 100.0
        }
    }
}

/// Bucket every file by size, singletons included, in first-seen order.
#[must_use]
pub fn bucket_by_size(files: impl IntoIterator<Item = FileRecord>) -> Vec<SizeGroup> {
    bucket_ordered(files, |f| Some(f.size()))
        .into_iter()
        .map(|(size, files)| SizeGroup::with_files(size, files))
        .collect()
}

/// Group files by size, keeping only sizes shared by two or more files.
///
/// # Returns
///
/// The surviving size groups in first-seen order, plus statistics.
///
/// # Performance
///
/// O(n) and metadata only; no file is read.
#[must_use]
pub fn group_by_size(
    files: impl IntoIterator<Item = FileRecord>,
) -> (Vec<SizeGroup>, GroupingStats) {
    let buckets = bucket_by_size(files);
    let mut stats = GroupingStats {
        unique_sizes: buckets.len(),
        ..GroupingStats::default()
    };

    let groups = buckets
        .into_iter()
        .filter(|group| {
            stats.total_files += group.files.len();
            stats.total_size += group.total_size();
            if group.has_duplicates() {
                stats.potential_duplicates += group.files.len();
                stats.duplicate_groups += 1;
                log::debug!(
                    "Size group {} bytes: {} potential duplicates",
                    group.size,
                    group.files.len()
                );
                true
            } else {
                stats.eliminated_unique += 1;
                false
            }
        })
        .collect();

    log::debug!(
        "Size grouping: {} files → {} potential duplicates ({:.1}% eliminated)",
        stats.total_files,
        stats.potential_duplicates,
        stats.elimination_rate()
    );

    (groups, stats)
}

/// Split `files` into hash buckets using the hashes already cached on them.
///
/// Records without a cached hash, and records whose hash failed when
/// `include_errors` is false, are left out. Buckets of one file are kept;
/// callers decide what a singleton means.
#[must_use]
pub fn bucket_by_hash(
    files: Vec<FileRecord>,
    include_errors: bool,
) -> Vec<(ContentHash, Vec<FileRecord>)> {
    bucket_ordered(files, |f| {
        f.cached_hash()
            .filter(|h| include_errors || !h.is_error())
            .cloned()
    })
}
