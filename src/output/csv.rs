//! CSV output.
//!
//! A header row followed by one row per reported file.
//!
//! # Columns
//!
//! - `group_id`: Duplicate group id, empty for plain search
//! - `path`: Absolute path to the file
//! - `name`: File name
//! - `parent`: Containing directory
//! - `size_bytes`: File size in bytes
//! - `extension`: Lower-cased extension
//! - `created`, `modified`: Dates as YYYY-MM-DD, empty if unknown
//! - `hash`: MD5 content hash, empty if not computed

use std::io::Write;

use super::{OutputError, ResultRow, ResultWriter};

/// CSV writer.
pub struct CsvWriter<W: Write> {
    inner: ::csv::Writer<W>,
}

impl<W: Write> CsvWriter<W> {
    /// Create a CSV writer over `out`. The header is written with the first row.
    pub fn new(out: W) -> Self {
        Self {
            inner: ::csv::Writer::from_writer(out),
        }
    }

    /// Flush and recover the underlying writer.
    ///
    /// # Errors
    ///
    /// Returns [`OutputError`] if the final flush fails.
    pub fn into_inner(self) -> Result<W, OutputError> {
        self.inner
            .into_inner()
            .map_err(|e| OutputError::Io(e.into_error()))
    }
}

impl<W: Write> std::fmt::Debug for CsvWriter<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CsvWriter").finish_non_exhaustive()
    }
}

impl<W: Write> ResultWriter for CsvWriter<W> {
    fn write_row(&mut self, row: &ResultRow) -> Result<(), OutputError> {
        self.inner.serialize(row)?;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), OutputError> {
        self.inner.flush()?;
        Ok(())
    }
}
