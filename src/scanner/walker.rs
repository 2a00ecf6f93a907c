//! Directory walker built on `walkdir`.
//!
//! # Overview
//!
//! [`Walker`] enumerates the regular files reachable from a list of root
//! directories. Each root gets its own `walkdir` traversal; a [`CancelToken`]
//! is checked before every entry is pulled.
//!
//! # Behavior
//!
//! - Roots are resolved to absolute paths; a root that does not exist or is
//!   not a directory is skipped.
//! - A directory whose listing fails is skipped along with its subtree.
//! - Symbolic links are followed. A link back to one of its own ancestors is
//!   reported as a loop and skipped.
//! - Inside each directory, files sort ahead of subdirectories, so a
//!   directory's own files are yielded before anything below it. Order among
//!   files is whatever the filesystem returns.
//!
//! # Example
//!
//! ```no_run
//! use dupefind::scanner::Walker;
//!
//! let walker = Walker::new(["/home/user/Documents"], true);
//! let mut walk = walker.walk();
//! for path in &mut walk {
//!     println!("{}", path.display());
//! }
//! println!("{} directories could not be read", walk.stats().unreadable_dirs);
//! ```

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::signal::CancelToken;

/// Counters collected while walking.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WalkStats {
    /// Directories successfully listed.
    pub dirs_visited: usize,
    /// Directories whose listing failed.
    pub unreadable_dirs: usize,
    /// Entries that could not be resolved (dangling links, link loops).
    pub unreadable_entries: usize,
    /// Roots skipped because they are missing or not directories.
    pub skipped_roots: usize,
    /// Files yielded.
    pub files: usize,
}

/// File discovery over one or more root directories.
#[derive(Debug, Clone)]
pub struct Walker {
    roots: Vec<PathBuf>,
    include_subfolders: bool,
    cancel: Option<CancelToken>,
}

impl Walker {
    /// Create a walker over `roots`.
    ///
    /// # Arguments
    ///
    /// * `roots` - Directories to enumerate
    /// * `include_subfolders` - Descend into subdirectories when `true`
    #[must_use]
    pub fn new<I, P>(roots: I, include_subfolders: bool) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            roots: roots.into_iter().map(Into::into).collect(),
            include_subfolders,
            cancel: None,
        }
    }

    /// Stop the walk as soon as `token` is cancelled.
    #[must_use]
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Start a lazy traversal.
    #[must_use]
    pub fn walk(&self) -> Walk {
        Walk {
            roots: self.roots.iter().cloned().collect(),
            current: None,
            pending_dir: None,
            max_depth: if self.include_subfolders { usize::MAX } else { 1 },
            cancel: self.cancel.clone(),
            stats: WalkStats::default(),
            finished: false,
        }
    }

    /// Count the files a full walk would yield.
    ///
    /// Stops early, returning the partial count, if cancelled.
    #[must_use]
    pub fn count(&self) -> usize {
        let mut walk = self.walk();
        walk.by_ref().for_each(drop);
        log::debug!(
            "Pre-count found {} files in {} directories",
            walk.stats.files,
            walk.stats.dirs_visited
        );
        walk.stats.files
    }
}

/// Iterator over absolute file paths, created by [`Walker::walk`].
#[derive(Debug)]
pub struct Walk {
    roots: VecDeque<PathBuf>,
    current: Option<walkdir::IntoIter>,
    /// Directory just handed to `walkdir` for listing; a listing failure is
    /// reported for this path before any of its entries.
    pending_dir: Option<PathBuf>,
    max_depth: usize,
    cancel: Option<CancelToken>,
    stats: WalkStats,
    finished: bool,
}

impl Walk {
    /// Counters accumulated so far.
    #[must_use]
    pub fn stats(&self) -> &WalkStats {
        &self.stats
    }

    /// Whether the walk was stopped by its cancel token.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancelToken::is_cancelled)
    }

    fn open_root(&mut self, root: &Path) {
        let absolute = match std::path::absolute(root) {
            Ok(path) => path,
            Err(e) => {
                log::debug!("Skipping root {}: {}", root.display(), e);
                self.stats.skipped_roots += 1;
                return;
            }
        };

        if !absolute.is_dir() {
            log::debug!("Skipping root {}: not a directory", absolute.display());
            self.stats.skipped_roots += 1;
            return;
        }

        log::debug!("Walking root {}", absolute.display());
        let walker = WalkDir::new(&absolute)
            .follow_links(true)
            .min_depth(1)
            .max_depth(self.max_depth)
            .sort_by(|a, b| a.file_type().is_dir().cmp(&b.file_type().is_dir()));
        self.stats.dirs_visited += 1;
        self.pending_dir = Some(absolute);
        self.current = Some(walker.into_iter());
    }

    /// Classify one entry, returning its path if it is a regular file.
    fn visit(&mut self, entry: walkdir::DirEntry) -> Option<PathBuf> {
        let file_type = entry.file_type();
        if file_type.is_file() {
            log::trace!("Found file {}", entry.path().display());
            self.stats.files += 1;
            return Some(entry.into_path());
        }
        if file_type.is_dir() && entry.depth() < self.max_depth {
            self.stats.dirs_visited += 1;
            self.pending_dir = Some(entry.into_path());
        }
        None
    }

    fn record_error(&mut self, err: &walkdir::Error) {
        if let Some(ancestor) = err.loop_ancestor() {
            log::debug!(
                "Skipping link loop {} -> {}",
                err.path().unwrap_or(ancestor).display(),
                ancestor.display()
            );
            self.stats.unreadable_entries += 1;
            return;
        }

        let reason = err
            .io_error()
            .map_or_else(|| err.to_string(), ToString::to_string);
        match (err.path(), self.pending_dir.take()) {
            (Some(path), Some(dir)) if path == dir => {
                log::warn!("Cannot read directory {}: {}", dir.display(), reason);
                self.stats.dirs_visited -= 1;
                self.stats.unreadable_dirs += 1;
            }
            (path, _) => {
                log::debug!(
                    "Skipping unreadable entry {}: {}",
                    path.map_or_else(|| "?".into(), Path::to_string_lossy),
                    reason
                );
                self.stats.unreadable_entries += 1;
            }
        }
    }
}

impl Iterator for Walk {
    type Item = PathBuf;

    fn next(&mut self) -> Option<PathBuf> {
        if self.finished {
            return None;
        }

        loop {
            if self.is_cancelled() {
                log::debug!("Walk cancelled after {} files", self.stats.files);
                self.finished = true;
                self.current = None;
                self.roots.clear();
                return None;
            }

            if let Some(entries) = self.current.as_mut() {
                match entries.next() {
                    Some(Ok(entry)) => {
                        self.pending_dir = None;
                        if let Some(path) = self.visit(entry) {
                            return Some(path);
                        }
                    }
                    Some(Err(e)) => self.record_error(&e),
                    None => {
                        self.current = None;
                        self.pending_dir = None;
                    }
                }
            } else if let Some(root) = self.roots.pop_front() {
                self.open_root(&root);
            } else {
                self.finished = true;
                return None;
            }
        }
    }
}
