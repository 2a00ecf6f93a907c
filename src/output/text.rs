//! Plain text output.
//!
//! Plain search results are printed one path per line. Duplicate results
//! get a header line per group followed by its indented member paths:
//!
//! ```text
//! Group 1 (5 B, 5d41402abc4b2a76b9719d911017c592)
//!   /data/a.txt
//!   /data/b.txt
//! ```

use std::io::Write;

use bytesize::ByteSize;

use super::{OutputError, ResultRow, ResultWriter};

/// Human-readable writer.
#[derive(Debug)]
pub struct TextWriter<W: Write> {
    out: W,
    current_group: Option<usize>,
}

impl<W: Write> TextWriter<W> {
    /// Create a text writer over `out`.
    pub fn new(out: W) -> Self {
        Self {
            out,
            current_group: None,
        }
    }

    /// Recover the underlying writer.
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> ResultWriter for TextWriter<W> {
    fn write_row(&mut self, row: &ResultRow) -> Result<(), OutputError> {
        let Some(id) = row.group_id else {
            writeln!(self.out, "{}", row.path)?;
            return Ok(());
        };

        if self.current_group != Some(id) {
            if self.current_group.is_some() {
                writeln!(self.out)?;
            }
            writeln!(
                self.out,
                "Group {} ({}, {})",
                id,
                ByteSize::b(row.size_bytes),
                row.hash.as_deref().unwrap_or("-")
            )?;
            self.current_group = Some(id);
        }
        writeln!(self.out, "  {}", row.path)?;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), OutputError> {
        self.out.flush()?;
        Ok(())
    }
}
