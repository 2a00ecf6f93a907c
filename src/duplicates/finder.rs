//! Two-phase duplicate grouper.
//!
//! # Overview
//!
//! [`DuplicateGrouper`] turns a list of already-filtered files into a
//! stream of [`DuplicateGroup`] values:
//!
//! 1. **Size**: bucket by exact size; singleton sizes are dropped unhashed.
//! 2. **Hash**: hash every member of each remaining bucket, then bucket by
//!    hash; hash buckets with two or more members are emitted.
//!
//! Groups are emitted as soon as their size bucket is fully hashed, in the
//! order the size bucket was first populated. Ids start at 1 and increase
//! by one per emitted group.
//!
//! With `hash_threads > 1` the members of one size bucket are hashed on a
//! rayon pool. Grouping still happens sequentially once the whole bucket is
//! hashed, so emission order is unchanged.
//!
//! # Example
//!
//! ```no_run
//! use dupefind::duplicates::{DuplicateGrouper, GrouperConfig};
//! use dupefind::scanner::{FileRecord, Walker};
//!
//! let files: Vec<FileRecord> = Walker::new(["."], true)
//!     .walk()
//!     .filter_map(|p| FileRecord::from_path(&p).ok())
//!     .collect();
//!
//! let mut grouper = DuplicateGrouper::new(GrouperConfig::default());
//! let (groups, stats) = grouper.find_groups(files);
//! println!("{} groups, {} bytes reclaimable", groups.len(), stats.reclaimable_bytes);
//! ```

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::groups::{bucket_by_hash, group_by_size, DuplicateGroup};
use crate::scanner::{FileRecord, Hasher};
use crate::signal::CancelToken;

/// What to do with files whose content could not be hashed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnreadablePolicy {
    /// Same-size unreadable files share the error hash and may form a group.
    #[default]
    GroupTogether,
    /// Unreadable files never join a group.
    Exclude,
}

/// Configuration for [`DuplicateGrouper`].
#[derive(Debug, Clone)]
pub struct GrouperConfig {
    /// Threads used to hash one size bucket. 1 hashes on the calling thread.
    pub hash_threads: usize,
    /// Handling of files whose hash failed.
    pub unreadable: UnreadablePolicy,
    /// Optional cancellation token, checked before every hash.
    pub cancel: Option<CancelToken>,
    /// Content hasher.
    pub hasher: Hasher,
}

impl Default for GrouperConfig {
    fn default() -> Self {
        Self {
            hash_threads: 1,
            unreadable: UnreadablePolicy::default(),
            cancel: None,
            hasher: Hasher::new(),
        }
    }
}

impl GrouperConfig {
    /// Set the number of hashing threads (minimum 1).
    #[must_use]
    pub fn with_hash_threads(mut self, threads: usize) -> Self {
        self.hash_threads = threads.max(1);
        self
    }

    /// Set the unreadable-file policy.
    #[must_use]
    pub fn with_unreadable(mut self, policy: UnreadablePolicy) -> Self {
        self.unreadable = policy;
        self
    }

    /// Set the cancellation token.
    #[must_use]
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Use a custom hasher.
    #[must_use]
    pub fn with_hasher(mut self, hasher: Hasher) -> Self {
        self.hasher = hasher;
        self
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancelToken::is_cancelled)
    }
}

/// Counters from one grouping run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GrouperStats {
    /// Files given to the grouper
    pub input_files: usize,
    /// Files dropped because no other file had their size
    pub eliminated_by_size: usize,
    /// Files whose content hash was computed or reused
    pub hashed_files: usize,
    /// Hashes that failed
    pub hash_failures: usize,
    /// Unreadable files left out under [`UnreadablePolicy::Exclude`]
    pub excluded_unreadable: usize,
    /// Groups emitted
    pub groups: usize,
    /// Files in emitted groups, one per group not counted
    pub duplicate_files: usize,
    /// Bytes taken by those extra copies
    pub reclaimable_bytes: u64,
    /// Whether cancellation stopped the run early
    pub cancelled: bool,
}

/// Streaming two-phase grouper. One instance serves one scan.
#[derive(Debug)]
pub struct DuplicateGrouper {
    config: GrouperConfig,
    next_id: usize,
    pool: Option<rayon::ThreadPool>,
}

impl DuplicateGrouper {
    /// Create a grouper. Builds a hashing pool when `hash_threads > 1`.
    #[must_use]
    pub fn new(config: GrouperConfig) -> Self {
        let pool = if config.hash_threads > 1 {
            match rayon::ThreadPoolBuilder::new()
                .num_threads(config.hash_threads)
                .thread_name(|i| format!("dupefind-hash-{i}"))
                .build()
            {
                Ok(pool) => Some(pool),
                Err(e) => {
                    log::warn!("Failed to create hashing pool, hashing sequentially: {}", e);
                    None
                }
            }
        } else {
            None
        };

        Self {
            config,
            next_id: 1,
            pool,
        }
    }

    /// Id the next emitted group will receive.
    #[must_use]
    pub fn next_id(&self) -> usize {
        self.next_id
    }

    /// Group `files`, handing each group to `emit` as soon as it is known.
    ///
    /// `on_processed(n)` is called as files leave the pipeline: once up front
    /// for every file with a unique size, then once per hashed file (or once
    /// per bucket when hashing in parallel). Across a full run the counts sum to
    /// `files.len()`.
    pub fn run<P, E>(&mut self, files: Vec<FileRecord>, mut on_processed: P, mut emit: E) -> GrouperStats
    where
        P: FnMut(usize),
        E: FnMut(DuplicateGroup),
    {
        let mut stats = GrouperStats {
            input_files: files.len(),
            ..GrouperStats::default()
        };
        let include_errors = self.config.unreadable == UnreadablePolicy::GroupTogether;

        let (buckets, size_stats) = group_by_size(files);
        stats.eliminated_by_size = size_stats.eliminated_unique;
        if size_stats.eliminated_unique > 0 {
            on_processed(size_stats.eliminated_unique);
        }

        for bucket in buckets {
            if self.config.is_cancelled() {
                stats.cancelled = true;
                break;
            }

            log::trace!("Hashing {} files of {} bytes", bucket.files.len(), bucket.size);
            if !self.hash_bucket(&bucket.files, &mut on_processed) {
                stats.cancelled = true;
                break;
            }

            for file in &bucket.files {
                if let Some(hash) = file.cached_hash() {
                    stats.hashed_files += 1;
                    if hash.is_error() {
                        stats.hash_failures += 1;
                        if !include_errors {
                            stats.excluded_unreadable += 1;
                        }
                    }
                }
            }

            for (hash, members) in bucket_by_hash(bucket.files, include_errors) {
                if members.len() < 2 {
                    continue;
                }

                let group = DuplicateGroup {
                    id: self.next_id,
                    hash,
                    size: bucket.size,
                    files: members,
                };
                self.next_id += 1;

                stats.groups += 1;
                stats.duplicate_files += group.duplicate_count();
                stats.reclaimable_bytes += group.wasted_space();
                if group.is_unreadable() {
                    log::debug!(
                        "Group {} holds {} unreadable files of {} bytes",
                        group.id,
                        group.len(),
                        group.size
                    );
                }
                emit(group);
            }
        }

        log::info!(
            "Grouping: {} files → {} groups, {} duplicate files{}",
            stats.input_files,
            stats.groups,
            stats.duplicate_files,
            if stats.cancelled { " (cancelled)" } else { "" }
        );

        stats
    }

    /// Collect every group. Convenience wrapper around [`Self::run`].
    pub fn find_groups(&mut self, files: Vec<FileRecord>) -> (Vec<DuplicateGroup>, GrouperStats) {
        let mut groups = Vec::new();
        let stats = self.run(files, |_| {}, |g| groups.push(g));
        (groups, stats)
    }

    /// Hash every file of one bucket. Returns `false` if cancelled first.
    fn hash_bucket<P: FnMut(usize)>(&self, files: &[FileRecord], on_processed: &mut P) -> bool {
        let config = &self.config;

        if let Some(pool) = self.pool.as_ref() {
            pool.install(|| {
                files.par_iter().for_each(|file| {
                    if !config.is_cancelled() {
                        file.content_hash(&config.hasher);
                    }
                });
            });
            if config.is_cancelled() {
                return false;
            }
            on_processed(files.len());
            return true;
        }

        for file in files {
            if config.is_cancelled() {
                return false;
            }
            file.content_hash(&config.hasher);
            on_processed(1);
        }
        true
    }
}
