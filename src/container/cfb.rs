//! Compound-file backend.

use std::fs::File;
use std::io::Read;
use std::path::{Component, Path, PathBuf};

use crate::container::{join_path, ContainerRead};
use crate::error::{Result, TriageError};

/// Container backend over an on-disk OLE compound file.
pub struct CfbContainer {
    inner: ::cfb::CompoundFile<File>,
    path: PathBuf,
}

impl CfbContainer {
    /// Open a compound file. Failure here is fatal for this one input.
    pub fn open(path: &Path) -> Result<Self> {
        let inner = ::cfb::open(path).map_err(|source| TriageError::ContainerOpen {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "Opened compound file");
        Ok(Self {
            inner,
            path: path.to_path_buf(),
        })
    }

    /// Path the container was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ContainerRead for CfbContainer {
    fn list_streams(&self, prefix: &[String]) -> Vec<Vec<String>> {
        let mut paths = Vec::new();
        for entry in self.inner.walk() {
            if !entry.is_stream() {
                continue;
            }
            let segments: Vec<String> = entry
                .path()
                .components()
                .filter_map(|component| match component {
                    Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
                    _ => None,
                })
                .collect();
            if segments.len() > prefix.len() && segments[..prefix.len()] == *prefix {
                paths.push(segments);
            }
        }
        paths
    }

    fn read_stream(&mut self, path: &[String]) -> std::io::Result<Option<Vec<u8>>> {
        let name = format!("/{}", join_path(path));
        if !self.inner.is_stream(&name) {
            return Ok(None);
        }
        let mut stream = self.inner.open_stream(&name)?;
        let mut data = Vec::with_capacity(stream.len() as usize);
        stream.read_to_end(&mut data)?;
        Ok(Some(data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn build_fixture(path: &Path) {
        let mut compound = ::cfb::create(path).expect("create compound file");
        {
            let mut stream = compound
                .create_stream("/__substg1.0_0037001E")
                .expect("create stream");
            stream.write_all(b"Test subject").expect("write stream");
        }
        compound
            .create_storage("/__attach_version1.0_#00000000")
            .expect("create storage");
        {
            let mut stream = compound
                .create_stream("/__attach_version1.0_#00000000/__substg1.0_37010102")
                .expect("create stream");
            stream.write_all(&[0xDE, 0xAD, 0xBE, 0xEF]).expect("write stream");
        }
        compound.flush().expect("flush compound file");
    }

    #[test]
    fn test_open_missing_file_is_container_open_error() {
        let err = CfbContainer::open(Path::new("/nonexistent/file.msg"))
            .err()
            .expect("open should fail");
        assert!(matches!(err, TriageError::ContainerOpen { .. }));
    }

    #[test]
    fn test_open_garbage_file_is_container_open_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("garbage.msg");
        std::fs::write(&path, b"not an ole compound file").expect("write garbage");
        let err = CfbContainer::open(&path).err().expect("open should fail");
        assert!(matches!(err, TriageError::ContainerOpen { .. }));
    }

    #[test]
    fn test_list_and_read_streams() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("fixture.msg");
        build_fixture(&path);

        let mut container = CfbContainer::open(&path).expect("open fixture");
        let all = container.list_streams(&[]);
        assert_eq!(all.len(), 2);
        assert!(all.iter().any(|p| p == &["__substg1.0_0037001E".to_string()]));

        let attach_prefix = vec!["__attach_version1.0_#00000000".to_string()];
        let under = container.list_streams(&attach_prefix);
        assert_eq!(under.len(), 1);
        assert_eq!(under[0].len(), 2);

        let data = container
            .read_stream(&under[0])
            .expect("read stream")
            .expect("stream exists");
        assert_eq!(data, vec![0xDE, 0xAD, 0xBE, 0xEF]);

        let missing = container
            .read_stream(&["__substg1.0_0037001F".to_string()])
            .expect("read missing");
        assert!(missing.is_none());
    }
}
