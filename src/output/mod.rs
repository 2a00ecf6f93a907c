//! Result writers for scan output.
//!
//! This module provides streaming formats for scan results:
//! - Text for terminals (one path per line, grouped for duplicates)
//! - JSON Lines for automation and scripting
//! - CSV for spreadsheet import
//!
//! Every format consumes the same [`ResultRow`], written one at a time as
//! the scan reports results.
//!
//! # Example
//!
//! ```no_run
//! use dupefind::output::{writer_for, OutputFormat, ResultRow};
//! use dupefind::scanner::FilterConfig;
//! use dupefind::session::{ScanSession, SessionConfig};
//!
//! let mut writer = writer_for(OutputFormat::Json, Box::new(std::io::stdout()));
//! let session = ScanSession::new(SessionConfig::default());
//! session
//!     .search(["."], &FilterConfig::default(), |record| {
//!         let _ = writer.write_row(&ResultRow::from_record(&record, None));
//!     }, |_| {})
//!     .unwrap();
//! writer.finish().unwrap();
//! ```

pub mod csv;
pub mod json;
pub mod text;

use std::io;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::scanner::FileRecord;

// Re-export main types
pub use self::csv::CsvWriter;
pub use self::json::JsonLinesWriter;
pub use self::text::TextWriter;

/// Output format for scan results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    /// JSON Lines, one object per file
    Json,
    /// CSV with a header row
    Csv,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Csv => write!(f, "csv"),
        }
    }
}

/// Errors that can occur while writing results.
#[derive(Debug, Error)]
pub enum OutputError {
    /// I/O error during writing.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Error during JSON serialization.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Error during CSV serialization.
    #[error("CSV error: {0}")]
    Csv(#[from] ::csv::Error),
}

/// One reported file, flattened for output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultRow {
    /// Duplicate group id; empty for plain search
    pub group_id: Option<usize>,
    /// Absolute path
    pub path: String,
    /// File name
    pub name: String,
    /// Containing directory
    pub parent: String,
    /// Size in bytes
    pub size_bytes: u64,
    /// Lower-cased extension
    pub extension: String,
    /// Creation date (YYYY-MM-DD), if known
    pub created: Option<NaiveDate>,
    /// Modification date (YYYY-MM-DD), if known
    pub modified: Option<NaiveDate>,
    /// Content hash, if computed
    pub hash: Option<String>,
}

impl ResultRow {
    /// Flatten `record`, tagging it with `group_id` for duplicate results.
    #[must_use]
    pub fn from_record(record: &FileRecord, group_id: Option<usize>) -> Self {
        Self {
            group_id,
            path: record.path().to_string_lossy().into_owned(),
            name: record.name().to_string(),
            parent: record.parent().to_string_lossy().into_owned(),
            size_bytes: record.size(),
            extension: record.extension().to_string(),
            created: record.creation_date(),
            modified: record.modification_date(),
            hash: record.cached_hash().map(ToString::to_string),
        }
    }
}

/// Sink for reported results.
pub trait ResultWriter {
    /// Write one row.
    ///
    /// # Errors
    ///
    /// Returns [`OutputError`] if serialization or the underlying write fails.
    fn write_row(&mut self, row: &ResultRow) -> Result<(), OutputError>;

    /// Flush buffered output.
    ///
    /// # Errors
    ///
    /// Returns [`OutputError`] if the flush fails.
    fn finish(&mut self) -> Result<(), OutputError>;
}

/// Build the writer for `format` over `out`.
#[must_use]
pub fn writer_for(format: OutputFormat, out: Box<dyn io::Write + Send>) -> Box<dyn ResultWriter + Send> {
    match format {
        OutputFormat::Text => Box::new(TextWriter::new(out)),
        OutputFormat::Json => Box::new(JsonLinesWriter::new(out)),
        OutputFormat::Csv => Box::new(CsvWriter::new(out)),
    }
}
