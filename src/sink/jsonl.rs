//! JSON Lines sink: one message tree per line.
//!
//! Unlike the SQLite sink this one takes records as they come, missing
//! dates included; `date` serializes as `null` and `date_raw` keeps the
//! original text.

use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::{Result, TriageError};
use crate::sink::record::MessageRecord;
use crate::sink::MessageSink;

pub struct JsonlSink<W: Write> {
    writer: W,
}

impl JsonlSink<BufWriter<std::fs::File>> {
    /// Creates or truncates a file sink at `path`.
    pub fn create(path: &Path) -> Result<Self> {
        let file = std::fs::File::create(path).map_err(|e| TriageError::io(path, e))?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> JsonlSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Consumes the sink, handing back the writer. Flush first when the
    /// writer buffers.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> MessageSink for JsonlSink<W> {
    fn store(&mut self, record: &MessageRecord) -> Result<()> {
        serde_json::to_writer(&mut self.writer, record)
            .map_err(|e| TriageError::Sink(e.to_string()))?;
        self.writer
            .write_all(b"\n")
            .map_err(|e| TriageError::Sink(e.to_string()))?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.writer
            .flush()
            .map_err(|e| TriageError::Sink(e.to_string()))
    }
}
