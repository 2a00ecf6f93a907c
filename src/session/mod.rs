//! Scan orchestration.
//!
//! A [`ScanSession`] drives walker → filter → (grouper) and reports results
//! through caller-supplied callbacks as they are found. It owns the
//! session's [`CancelToken`] and the `Idle → Running → Completed|Cancelled`
//! state machine. At most one scan runs on a session at a time.
//!
//! # Architecture
//!
//! * This module: [`ScanSession`], [`SessionConfig`], the blocking
//!   [`ScanSession::search`] and [`ScanSession::search_duplicates`].
//! * [`handle`]: background variants returning a [`ScanHandle`] that streams
//!   [`ScanEvent`]s over a bounded channel.
//! * [`summary`]: [`ScanState`] and [`ScanSummary`].
//!
//! # Example
//!
//! ```no_run
//! use dupefind::scanner::FilterConfig;
//! use dupefind::session::{ScanSession, SessionConfig};
//!
//! let session = ScanSession::new(SessionConfig::default());
//! let filter = FilterConfig::default().with_include_subfolders(true);
//!
//! let summary = session
//!     .search_duplicates(
//!         ["/home/user/Pictures"],
//!         &filter,
//!         |record, group_id| println!("[{group_id}] {}", record.path().display()),
//!         |pct| eprintln!("{pct}%"),
//!     )
//!     .expect("session busy");
//! println!("{} groups", summary.duplicate_groups);
//! ```

pub mod handle;
pub mod summary;

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::duplicates::{DuplicateGrouper, GrouperConfig, UnreadablePolicy};
use crate::progress::{ProgressTracker, DEFAULT_PROGRESS_INTERVAL};
use crate::scanner::{FileRecord, FilterConfig, Hasher, Walker};
use crate::signal::CancelToken;

pub use handle::{ScanEvent, ScanHandle};
pub use summary::{ScanMode, ScanState, ScanSummary};

/// Default capacity of the event channel used by background scans.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

/// Errors that prevent a scan from starting or finishing.
///
/// Per-file problems are never reported here; see [`ScanSummary`].
#[derive(thiserror::Error, Debug)]
pub enum SessionError {
    /// A scan is already running on this session.
    #[error("A scan is already running on this session")]
    AlreadyRunning,

    /// The background worker thread could not be started.
    #[error("Failed to start scan worker: {0}")]
    Spawn(#[source] std::io::Error),

    /// The background worker thread panicked.
    #[error("Scan worker panicked")]
    WorkerPanicked,
}

/// Engine settings for a session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Minimum delay between throttled progress callbacks.
    pub progress_interval: Duration,
    /// Threads used to hash one size bucket.
    pub hash_threads: usize,
    /// Handling of files whose content cannot be hashed.
    pub unreadable: UnreadablePolicy,
    /// Capacity of the event channel for background scans.
    pub channel_capacity: usize,
    /// Content hasher.
    pub hasher: Hasher,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            hash_threads: 1,
            unreadable: UnreadablePolicy::default(),
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            hasher: Hasher::new(),
        }
    }
}

impl SessionConfig {
    /// Set the progress throttle interval.
    #[must_use]
    pub fn with_progress_interval(mut self, interval: Duration) -> Self {
        self.progress_interval = interval;
        self
    }

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

    /// Set the background event channel capacity.
    #[must_use]
    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity;
        self
    }

    /// Use a custom hasher.
    #[must_use]
    pub fn with_hasher(mut self, hasher: Hasher) -> Self {
        self.hasher = hasher;
        self
    }
}

#[derive(Debug)]
struct Shared {
    config: SessionConfig,
    cancel: CancelToken,
    running: AtomicBool,
    state: AtomicU8,
}

/// Handle to a scan engine instance.
///
/// Cloning yields another handle to the same session, so [`Self::cancel`]
/// can be called from any thread while a scan runs elsewhere.
#[derive(Debug, Clone)]
pub struct ScanSession {
    shared: Arc<Shared>,
}

/// Marks the session busy for the lifetime of one scan.
#[derive(Debug)]
pub(crate) struct RunGuard {
    shared: Arc<Shared>,
    started: bool,
}

impl RunGuard {
    /// Hold the session busy without counting as a started scan yet.
    ///
    /// Dropped before [`Self::start`], the session returns to `Idle`.
    pub(crate) fn deferred(mut self) -> Self {
        self.started = false;
        self
    }

    pub(crate) fn start(&mut self) {
        self.started = true;
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        // A panicking scan must not leave the state at Running
        let abandoned = if self.started {
            ScanState::Cancelled
        } else {
            ScanState::Idle
        };
        let _ = self.shared.state.compare_exchange(
            ScanState::Running.to_u8(),
            abandoned.to_u8(),
            Ordering::SeqCst,
            Ordering::SeqCst,
        );
        self.shared.running.store(false, Ordering::SeqCst);
    }
}

impl ScanSession {
    /// Create a session with its own cancellation token.
    #[must_use]
    pub fn new(config: SessionConfig) -> Self {
        Self::with_cancel_token(config, CancelToken::new())
    }

    /// Create a session observing an existing token, e.g. one hooked to
    /// Ctrl+C.
    #[must_use]
    pub fn with_cancel_token(config: SessionConfig, cancel: CancelToken) -> Self {
        Self {
            shared: Arc::new(Shared {
                config,
                cancel,
                running: AtomicBool::new(false),
                state: AtomicU8::new(ScanState::Idle.to_u8()),
            }),
        }
    }

    /// Engine settings.
    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.shared.config
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> ScanState {
        ScanState::from_u8(self.shared.state.load(Ordering::SeqCst))
    }

    /// The session's cancellation token.
    #[must_use]
    pub fn cancel_token(&self) -> CancelToken {
        self.shared.cancel.clone()
    }

    /// Request cooperative cancellation of the running scan.
    ///
    /// Work on the current entry completes first; no result callback is
    /// made once the flag has been observed.
    pub fn cancel(&self) {
        log::debug!("Cancellation requested");
        self.shared.cancel.cancel();
    }

    /// Enter `Running`, clearing any earlier cancellation.
    pub(crate) fn begin(&self) -> Result<RunGuard, SessionError> {
        if self
            .shared
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(SessionError::AlreadyRunning);
        }

        self.shared.cancel.reset();
        self.shared
            .state
            .store(ScanState::Running.to_u8(), Ordering::SeqCst);
        Ok(RunGuard {
            shared: Arc::clone(&self.shared),
            started: true,
        })
    }

    fn is_cancelled(&self) -> bool {
        self.shared.cancel.is_cancelled()
    }

    fn finish(&self, mut summary: ScanSummary, started: Instant) -> ScanSummary {
        summary.state = if self.is_cancelled() {
            ScanState::Cancelled
        } else {
            ScanState::Completed
        };
        summary.duration = started.elapsed();
        self.shared
            .state
            .store(summary.state.to_u8(), Ordering::SeqCst);

        log::info!(
            "Scan {}: {} candidates, {} matched, {} groups in {:.2?}",
            summary.state,
            summary.candidates,
            summary.matched,
            summary.duplicate_groups,
            summary.duration
        );
        summary
    }

    /// Plain search: stream every file matching `filter`.
    ///
    /// Blocks until the scan completes or is cancelled. Progress is measured
    /// against a pre-count of the files under `roots`.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::AlreadyRunning`] if a scan is active.
    pub fn search<I, P, R, G>(
        &self,
        roots: I,
        filter: &FilterConfig,
        on_result: R,
        on_progress: G,
    ) -> Result<ScanSummary, SessionError>
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
        R: FnMut(FileRecord),
        G: FnMut(u8),
    {
        let _guard = self.begin()?;
        let roots = roots.into_iter().map(Into::into).collect();
        Ok(self.run_search(roots, filter, on_result, on_progress))
    }

    /// Duplicate search: stream `(record, group_id)` for every member of
    /// every duplicate group.
    ///
    /// Members of one group are reported consecutively. Progress is measured
    /// against the number of walked files.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::AlreadyRunning`] if a scan is active.
    pub fn search_duplicates<I, P, R, G>(
        &self,
        roots: I,
        filter: &FilterConfig,
        on_result: R,
        on_progress: G,
    ) -> Result<ScanSummary, SessionError>
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
        R: FnMut(FileRecord, usize),
        G: FnMut(u8),
    {
        let _guard = self.begin()?;
        let roots = roots.into_iter().map(Into::into).collect();
        Ok(self.run_duplicates(roots, filter, on_result, on_progress))
    }

    fn walker(&self, roots: Vec<PathBuf>, filter: &FilterConfig) -> Walker {
        Walker::new(roots, filter.include_subfolders).with_cancel_token(self.cancel_token())
    }

    /// Build a record for `path` and test it, counting unreadable files.
    fn evaluate(path: &std::path::Path, filter: &FilterConfig, summary: &mut ScanSummary) -> Option<FileRecord> {
        summary.candidates += 1;
        match FileRecord::from_path(path) {
            Ok(record) if filter.matches(&record) => {
                summary.matched += 1;
                Some(record)
            }
            Ok(_) => None,
            Err(e) => {
                log::debug!("Skipping {}: {}", path.display(), e);
                summary.unreadable_files += 1;
                None
            }
        }
    }

    pub(crate) fn run_search<R, G>(
        &self,
        roots: Vec<PathBuf>,
        filter: &FilterConfig,
        mut on_result: R,
        mut on_progress: G,
    ) -> ScanSummary
    where
        R: FnMut(FileRecord),
        G: FnMut(u8),
    {
        let started = Instant::now();
        let mut summary = ScanSummary::new(ScanMode::Search);
        log::info!("Searching {} root(s)", roots.len());

        let walker = self.walker(roots, filter);
        let total = walker.count();

        let cancel = self.cancel_token();
        let mut tracker = ProgressTracker::new(total, self.shared.config.progress_interval, |pct| {
            if !cancel.is_cancelled() {
                on_progress(pct);
            }
        });
        tracker.start();

        let mut walk = walker.walk();
        for path in &mut walk {
            if let Some(record) = Self::evaluate(&path, filter, &mut summary) {
                if self.is_cancelled() {
                    break;
                }
                summary.reported += 1;
                on_result(record);
            }
            tracker.advance(1);
        }
        summary.unreadable_dirs = walk.stats().unreadable_dirs;

        if !self.is_cancelled() {
            tracker.finish();
        }
        self.finish(summary, started)
    }

    pub(crate) fn run_duplicates<R, G>(
        &self,
        roots: Vec<PathBuf>,
        filter: &FilterConfig,
        mut on_result: R,
        mut on_progress: G,
    ) -> ScanSummary
    where
        R: FnMut(FileRecord, usize),
        G: FnMut(u8),
    {
        let started = Instant::now();
        let mut summary = ScanSummary::new(ScanMode::Duplicates);
        log::info!("Searching {} root(s) for duplicates", roots.len());

        let mut walk = self.walker(roots, filter).walk();
        let paths: Vec<PathBuf> = walk.by_ref().collect();
        summary.unreadable_dirs = walk.stats().unreadable_dirs;
        if self.is_cancelled() {
            return self.finish(summary, started);
        }

        let cancel = self.cancel_token();
        let mut tracker =
            ProgressTracker::new(paths.len(), self.shared.config.progress_interval, |pct| {
                if !cancel.is_cancelled() {
                    on_progress(pct);
                }
            });
        tracker.start();

        let mut records = Vec::new();
        for path in &paths {
            if self.is_cancelled() {
                break;
            }
            match Self::evaluate(path, filter, &mut summary) {
                Some(record) => records.push(record),
                None => tracker.advance(1),
            }
        }
        if self.is_cancelled() {
            return self.finish(summary, started);
        }

        let config = &self.shared.config;
        let mut grouper = DuplicateGrouper::new(
            GrouperConfig::default()
                .with_hash_threads(config.hash_threads)
                .with_unreadable(config.unreadable)
                .with_hasher(config.hasher.clone())
                .with_cancel_token(self.cancel_token()),
        );

        let mut reported = 0;
        let stats = grouper.run(
            records,
            |n| tracker.advance(n),
            |group| {
                for record in group.files {
                    if self.is_cancelled() {
                        return;
                    }
                    reported += 1;
                    on_result(record, group.id);
                }
            },
        );

        summary.reported = reported;
        summary.duplicate_groups = stats.groups;
        summary.duplicate_files = stats.duplicate_files;
        summary.reclaimable_bytes = stats.reclaimable_bytes;
        summary.hash_failures = stats.hash_failures;

        if !self.is_cancelled() {
            tracker.finish();
        }
        self.finish(summary, started)
    }
}
