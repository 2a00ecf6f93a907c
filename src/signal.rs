//! Cooperative cancellation and Ctrl+C handling.
//!
//! A [`CancelToken`] wraps an `AtomicBool` that is shared between the party
//! requesting cancellation and the scan observing it. Each
//! [`ScanSession`](crate::session::ScanSession) owns its own token, so
//! independent sessions never share a flag by accident.
//!
//! # Usage
//!
//! ```rust,no_run
//! use dupefind::signal::{install_handler, CancelToken};
//!
//! let token = CancelToken::new();
//! install_handler(&token).expect("Failed to install signal handler");
//!
//! // Pass clones of the token to the walker or session
//! let worker_token = token.clone();
//! if worker_token.is_cancelled() {
//!     return;
//! }
//! ```
//!
//! # Exit Codes
//!
//! When Ctrl+C is received the token is cancelled, a short notice is printed
//! to stderr and the CLI exits with code 130 (128 + SIGINT).

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Exit code for SIGINT (Ctrl+C) interruption.
pub const EXIT_CODE_INTERRUPTED: i32 = 130;

/// Shared, thread-safe cancellation flag.
///
/// Cloning a token yields a handle to the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// Create a token in the not-cancelled state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Wrap an existing flag, e.g. one owned by an embedding application.
    #[must_use]
    pub fn from_flag(flag: Arc<AtomicBool>) -> Self {
        Self { flag }
    }

    /// Request cancellation. Safe to call from any thread, any number of times.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Clear the flag so the token can drive another scan.
    pub fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }

    /// Whether two tokens share the same flag.
    #[must_use]
    pub fn same_as(&self, other: &CancelToken) -> bool {
        Arc::ptr_eq(&self.flag, &other.flag)
    }
}

/// Error type for signal handler installation.
#[derive(Debug, thiserror::Error)]
pub enum SignalError {
    /// Failed to install the Ctrl+C handler.
    #[error("Failed to install signal handler: {0}")]
    InstallFailed(#[from] ctrlc::Error),
}

/// Install a Ctrl+C handler that cancels `token` on interrupt.
///
/// The process-wide handler can only be registered once; later calls fail
/// with [`SignalError::InstallFailed`] and leave `token` usable for manual
/// cancellation.
///
/// # Errors
///
/// Returns an error if the platform refuses the handler or one is already
/// registered.
pub fn install_handler(token: &CancelToken) -> Result<(), SignalError> {
    let token = token.clone();

    ctrlc::set_handler(move || {
        token.cancel();

        let _ = writeln!(std::io::stderr(), "\nInterrupted. Stopping scan...");
        let _ = std::io::stderr().flush();

        log::info!("Cancellation signal received");
    })?;

    Ok(())
}
