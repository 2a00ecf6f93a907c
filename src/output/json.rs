//! JSON Lines output.
//!
//! One JSON object per reported file, one file per line, so results can be
//! consumed while the scan is still running:
//!
//! ```json
//! {"group_id":1,"path":"/data/a.txt","name":"a.txt","parent":"/data","size_bytes":5,"extension":"txt","created":null,"modified":"2024-01-01","hash":"5d41..."}
//! ```

use std::io::Write;

use super::{OutputError, ResultRow, ResultWriter};

/// JSON Lines writer.
#[derive(Debug)]
pub struct JsonLinesWriter<W: Write> {
    out: W,
}

impl<W: Write> JsonLinesWriter<W> {
    /// Create a JSON Lines writer over `out`.
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Recover the underlying writer.
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> ResultWriter for JsonLinesWriter<W> {
    fn write_row(&mut self, row: &ResultRow) -> Result<(), OutputError> {
        serde_json::to_writer(&mut self.out, row)?;
        self.out.write_all(b"\n")?;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), OutputError> {
        self.out.flush()?;
        Ok(())
    }
}
