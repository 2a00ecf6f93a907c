//! Background scans streaming events over a channel.
//!
//! [`ScanSession::spawn_search`] and [`ScanSession::spawn_duplicates`] run
//! the same pipeline as their blocking counterparts on one dedicated worker
//! thread. Results and progress arrive as [`ScanEvent`]s on a bounded
//! channel; the last event is always [`ScanEvent::Finished`].
//!
//! Dropping the receiving side (the [`ScanHandle`]) cancels the scan the
//! next time the worker tries to send.
//!
//! # Example
//!
//! ```no_run
//! use dupefind::scanner::FilterConfig;
//! use dupefind::session::{ScanEvent, ScanSession, SessionConfig};
//!
//! let session = ScanSession::new(SessionConfig::default());
//! let handle = session
//!     .spawn_search(vec!["/tmp".into()], FilterConfig::default())
//!     .expect("failed to start scan");
//!
//! for event in handle.events() {
//!     match event {
//!         ScanEvent::File(record) => println!("{}", record.path().display()),
//!         ScanEvent::Progress(pct) => eprintln!("{pct}%"),
//!         ScanEvent::Finished(summary) => println!("{} matches", summary.matched),
//!         ScanEvent::Duplicate { .. } => {}
//!     }
//! }
//! ```

use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, SyncSender};
use std::thread::{self, JoinHandle};

use super::{ScanSession, ScanSummary, SessionError};
use crate::scanner::{FileRecord, FilterConfig};
use crate::signal::CancelToken;

/// Name given to background scan threads.
pub const WORKER_THREAD_NAME: &str = "dupefind-scan";

/// One message from a background scan.
#[derive(Debug, Clone)]
pub enum ScanEvent {
    /// A plain-search match.
    File(FileRecord),
    /// A member of a duplicate group.
    Duplicate {
        /// The file
        record: FileRecord,
        /// Group it belongs to
        group_id: usize,
    },
    /// Progress percentage.
    Progress(u8),
    /// The scan ended; no further events follow.
    Finished(ScanSummary),
}

/// Handle to a running background scan.
#[derive(Debug)]
pub struct ScanHandle {
    events: Receiver<ScanEvent>,
    cancel: CancelToken,
    worker: JoinHandle<ScanSummary>,
}

impl ScanHandle {
    /// Event receiver. Iterating it blocks until the next event and ends
    /// after [`ScanEvent::Finished`].
    #[must_use]
    pub fn events(&self) -> &Receiver<ScanEvent> {
        &self.events
    }

    /// Request cooperative cancellation.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Whether the worker thread has exited.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.worker.is_finished()
    }

    /// Wait for the scan to end, discarding events not yet received.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::WorkerPanicked`] if the worker panicked.
    pub fn join(self) -> Result<ScanSummary, SessionError> {
        // Keep draining so a full channel cannot block the worker
        for _ in self.events.iter() {}
        self.worker.join().map_err(|_| SessionError::WorkerPanicked)
    }
}

/// Send `event`, cancelling the scan if nobody is listening any more.
fn forward(tx: &SyncSender<ScanEvent>, cancel: &CancelToken, event: ScanEvent) {
    if tx.send(event).is_err() && !cancel.is_cancelled() {
        log::debug!("Event receiver dropped, cancelling scan");
        cancel.cancel();
    }
}

impl ScanSession {
    /// Start a plain search on a background thread.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::AlreadyRunning`] if a scan is active, or
    /// [`SessionError::Spawn`] if the worker could not be started. Either
    /// way no event is sent.
    pub fn spawn_search(
        &self,
        roots: Vec<PathBuf>,
        filter: FilterConfig,
    ) -> Result<ScanHandle, SessionError> {
        self.spawn(move |session, tx, cancel| {
            session.run_search(
                roots,
                &filter,
                |record| forward(tx, cancel, ScanEvent::File(record)),
                |pct| forward(tx, cancel, ScanEvent::Progress(pct)),
            )
        })
    }

    /// Start a duplicate search on a background thread.
    ///
    /// # Errors
    ///
    /// Same as [`Self::spawn_search`].
    pub fn spawn_duplicates(
        &self,
        roots: Vec<PathBuf>,
        filter: FilterConfig,
    ) -> Result<ScanHandle, SessionError> {
        self.spawn(move |session, tx, cancel| {
            session.run_duplicates(
                roots,
                &filter,
                |record, group_id| forward(tx, cancel, ScanEvent::Duplicate { record, group_id }),
                |pct| forward(tx, cancel, ScanEvent::Progress(pct)),
            )
        })
    }

    fn spawn<F>(&self, job: F) -> Result<ScanHandle, SessionError>
    where
        F: FnOnce(&ScanSession, &SyncSender<ScanEvent>, &CancelToken) -> ScanSummary
            + Send
            + 'static,
    {
        // Enter Running before the thread exists so an immediate cancel()
        // is not wiped by the reset at start. If the thread never starts,
        // dropping the deferred guard puts the session back to Idle.
        let mut guard = self.begin()?.deferred();
        let (tx, rx) = mpsc::sync_channel(self.config().channel_capacity);
        let session = self.clone();
        let cancel = self.cancel_token();

        let worker = thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || {
                guard.start();
                let summary = job(&session, &tx, &session.cancel_token());
                drop(guard);
                let _ = tx.send(ScanEvent::Finished(summary.clone()));
                summary
            })
            .map_err(SessionError::Spawn)?;

        Ok(ScanHandle {
            events: rx,
            cancel,
            worker,
        })
    }
}
