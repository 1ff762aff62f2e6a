//! Persistence sinks for extracted message trees.

pub mod jsonl;
pub mod record;
pub mod sqlite;

pub use jsonl::JsonlSink;
pub use record::{AttachmentRecord, MessageRecord};
pub use sqlite::SqliteSink;

use crate::error::Result;

/// A destination for flattened message records.
pub trait MessageSink {
    /// Persists one message tree. Implementations decide what atomicity a
    /// call has and which records they refuse.
    fn store(&mut self, record: &MessageRecord) -> Result<()>;

    /// Flushes buffered output once a batch is done. Default does nothing.
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}
