//! Session states and end-of-scan summary.

use std::time::Duration;

use bytesize::ByteSize;
use serde::Serialize;

/// Lifecycle of a [`ScanSession`](super::ScanSession).
///
/// `Idle → Running → {Completed | Cancelled}`. A finished session may start
/// another scan, which moves it back to `Running`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanState {
    /// No scan has run yet.
    #[default]
    Idle,
    /// A scan is in progress.
    Running,
    /// The last scan ran to the end.
    Completed,
    /// The last scan was stopped by cancellation.
    Cancelled,
}

impl ScanState {
    pub(crate) fn to_u8(self) -> u8 {
        match self {
            Self::Idle => 0,
            Self::Running => 1,
            Self::Completed => 2,
            Self::Cancelled => 3,
        }
    }

    pub(crate) fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Running,
            2 => Self::Completed,
            3 => Self::Cancelled,
            _ => Self::Idle,
        }
    }

    /// Whether this is a terminal state.
    #[must_use]
    pub fn is_finished(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

impl std::fmt::Display for ScanState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Running => write!(f, "running"),
            Self::Completed => write!(f, "completed"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Which operation produced a summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanMode {
    /// Plain search.
    #[default]
    Search,
    /// Duplicate search.
    Duplicates,
}

/// Summary statistics from one scan.
///
/// Per-entry failures never reach the result callback; they are counted
/// here instead.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanSummary {
    /// Operation that ran
    pub mode: ScanMode,
    /// Terminal state of the scan
    pub state: ScanState,
    /// Files yielded by the walker and given to the filter
    pub candidates: usize,
    /// Files that passed the filter
    pub matched: usize,
    /// Records handed to the result callback
    pub reported: usize,
    /// Duplicate groups found
    pub duplicate_groups: usize,
    /// Files in duplicate groups, one per group not counted
    pub duplicate_files: usize,
    /// Bytes held by those extra copies
    pub reclaimable_bytes: u64,
    /// Directories whose listing failed
    pub unreadable_dirs: usize,
    /// Files whose attributes could not be read
    pub unreadable_files: usize,
    /// Files whose content could not be hashed
    pub hash_failures: usize,
    /// Wall-clock duration of the scan
    pub duration: Duration,
}

impl ScanSummary {
    pub(crate) fn new(mode: ScanMode) -> Self {
        Self {
            mode,
            state: ScanState::Running,
            ..Self::default()
        }
    }

    /// Whether the scan was cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.state == ScanState::Cancelled
    }

    /// Whether the scan produced any result.
    #[must_use]
    pub fn has_results(&self) -> bool {
        match self.mode {
            ScanMode::Search => self.matched > 0,
            ScanMode::Duplicates => self.duplicate_groups > 0,
        }
    }

    /// Count of per-entry failures of any kind.
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.unreadable_dirs + self.unreadable_files + self.hash_failures
    }

    /// Reclaimable space as a human-readable string.
    #[must_use]
    pub fn reclaimable_display(&self) -> String {
        ByteSize::b(self.reclaimable_bytes).to_string()
    }
}
