//! Container access.
//!
//! A `.msg` file is an OLE compound file: a tree of named storages holding
//! named byte streams. Everything above this module addresses streams by
//! their segment path (no leading separator, e.g.
//! `["__attach_version1.0_#00000000", "__substg1.0_3707001F"]`) and treats
//! a missing stream as an absent value, never as an error.

mod cfb;
mod memory;
mod strings;

pub use cfb::CfbContainer;
pub use memory::MemoryContainer;
pub use strings::{decode_8bit, decode_utf16le, resolve_string, TAIL_8BIT, TAIL_UTF16};

/// Read access to an opened container.
///
/// Implementations must keep enumeration order stable across calls: the
/// extraction model derives attachment ordering from it.
pub trait ContainerRead {
    /// Every stream path strictly below `prefix`, in container enumeration
    /// order. An empty prefix lists the whole container.
    fn list_streams(&self, prefix: &[String]) -> Vec<Vec<String>>;

    /// Raw bytes of the stream at `path`, or `None` when no such stream
    /// exists.
    fn read_stream(&mut self, path: &[String]) -> std::io::Result<Option<Vec<u8>>>;
}

/// Slash-join path segments for display and backend addressing.
pub fn join_path(segments: &[String]) -> String {
    segments.join("/")
}

/// Split a slash-separated path into segments.
pub fn split_path(path: &str) -> Vec<String> {
    path.split('/').map(str::to_string).collect()
}
