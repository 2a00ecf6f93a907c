//! Structured error handling and exit codes.

use serde::Serialize;

/// Exit codes for the dupefind binary.
///
/// - 0: Success (completed normally, something was found)
/// - 1: General error (unexpected failure)
/// - 2: No matches (completed normally, nothing found)
/// - 130: Interrupted (Ctrl+C or other cancellation)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// Success: the scan completed and reported results.
    Success = 0,
    /// General error: an unexpected error occurred.
    GeneralError = 1,
    /// No matches: the scan completed without results.
    NoMatches = 2,
    /// Interrupted: the scan was cancelled.
    Interrupted = 130,
}

impl ExitCode {
    /// Get the numeric exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Get the machine-readable code prefix.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "DF000",
            Self::GeneralError => "DF001",
            Self::NoMatches => "DF002",
            Self::Interrupted => "DF130",
        }
    }
}

/// Structured error information for `--json-errors`.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// The error code (e.g., "DF001")
    pub code: String,
    /// The exit code number
    pub exit_code: i32,
    /// Human-readable error message, including its causes
    pub message: String,
    /// Whether the operation was interrupted
    pub interrupted: bool,
}

impl StructuredError {
    /// Create a new structured error from an anyhow error and an exit code.
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            message: format!("{err:#}"),
            interrupted: exit_code == ExitCode::Interrupted,
        }
    }
}
