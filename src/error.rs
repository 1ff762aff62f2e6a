//! Centralized error types for msgtriage.

use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the msgtriage library.
///
/// Absent streams are *not* errors: every field backed by a container
/// stream surfaces absence as `None` and extraction carries on.
#[derive(Error, Debug)]
pub enum TriageError {
    /// The container file cannot be opened or is not an OLE compound file.
    /// Fatal for that one input; a batch skips it and continues.
    #[error("cannot open container '{path}': {source}")]
    ContainerOpen {
        path: PathBuf,
        source: std::io::Error,
    },

    /// An enumerated stream failed mid-read (truncated container, I/O fault).
    #[error("failed reading stream '{stream}': {source}")]
    Stream {
        stream: String,
        source: std::io::Error,
    },

    /// The header `Date` field is missing or does not follow RFC 2822.
    /// The affected message cannot be persisted with a timestamp; siblings
    /// and already-discovered children are unaffected.
    #[error("unparseable Date header: '{raw}'")]
    UnparseableDate { raw: String },

    /// A SQLite sink operation failed.
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// A non-SQLite sink failure (serialization, output file).
    #[error("sink error: {0}")]
    Sink(String),

    /// I/O error with the associated file path.
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Convenience alias for `Result<T, TriageError>`.
pub type Result<T> = std::result::Result<T, TriageError>;

impl TriageError {
    /// Create an `Io` variant from a path and an `io::Error`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a `Stream` variant from a slash-joined stream path.
    pub fn stream(stream: impl Into<String>, source: std::io::Error) -> Self {
        Self::Stream {
            stream: stream.into(),
            source,
        }
    }
}

/// Allow `?` on `std::io::Error` inside functions returning `TriageError`
/// when no path context is available. Prefer `TriageError::io` elsewhere.
impl From<std::io::Error> for TriageError {
    fn from(source: std::io::Error) -> Self {
        Self::Io {
            path: PathBuf::from("<unknown>"),
            source,
        }
    }
}
