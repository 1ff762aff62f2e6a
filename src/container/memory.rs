//! In-memory container backend.
//!
//! Used by tests and by callers that already hold container content as
//! bytes. Enumeration order is insertion order.

use crate::container::{split_path, ContainerRead};

/// Ordered in-memory stream set.
#[derive(Debug, Default, Clone)]
pub struct MemoryContainer {
    streams: Vec<(Vec<String>, Vec<u8>)>,
}

impl MemoryContainer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a stream at a slash-separated path, replacing any previous bytes
    /// at that path without disturbing its position.
    pub fn insert(&mut self, path: &str, data: impl Into<Vec<u8>>) {
        let segments = split_path(path);
        if let Some(existing) = self.streams.iter_mut().find(|(p, _)| *p == segments) {
            existing.1 = data.into();
        } else {
            self.streams.push((segments, data.into()));
        }
    }

    /// Add a UTF-16LE string stream, the container's Unicode convention.
    pub fn insert_utf16(&mut self, path: &str, text: &str) {
        let bytes: Vec<u8> = text.encode_utf16().flat_map(u16::to_le_bytes).collect();
        self.insert(path, bytes);
    }

    pub fn len(&self) -> usize {
        self.streams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }
}

impl ContainerRead for MemoryContainer {
    fn list_streams(&self, prefix: &[String]) -> Vec<Vec<String>> {
        self.streams
            .iter()
            .filter(|(path, _)| path.len() > prefix.len() && path[..prefix.len()] == *prefix)
            .map(|(path, _)| path.clone())
            .collect()
    }

    fn read_stream(&mut self, path: &[String]) -> std::io::Result<Option<Vec<u8>>> {
        Ok(self
            .streams
            .iter()
            .find(|(p, _)| p == path)
            .map(|(_, data)| data.clone()))
    }
}
