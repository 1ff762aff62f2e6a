//! Attachment node.

use std::path::{Path, PathBuf};

use once_cell::unsync::OnceCell;
use sha1::{Digest, Sha1};

use crate::analysis::risk::{extension_of, Risk, RiskCatalog};
use crate::error::{Result, TriageError};

/// One embedded binary file. Owned exclusively by its message node and
/// immutable after discovery.
pub struct Attachment {
    short_name: Option<String>,
    long_name: Option<String>,
    data: Vec<u8>,
    sha1: OnceCell<String>,
    risk: Risk,
}

impl Attachment {
    /// Risk is classified eagerly here, from the long filename when present
    /// and the short one otherwise.
    pub(crate) fn new(
        short_name: Option<String>,
        long_name: Option<String>,
        data: Vec<u8>,
        catalog: &RiskCatalog,
    ) -> Self {
        let risk = catalog.classify(long_name.as_deref().or(short_name.as_deref()));
        Self {
            short_name,
            long_name,
            data,
            sha1: OnceCell::new(),
            risk,
        }
    }

    /// Short (8.3) filename, when stored.
    pub fn short_name(&self) -> Option<&str> {
        self.short_name.as_deref()
    }

    /// Long filename, when stored.
    pub fn long_name(&self) -> Option<&str> {
        self.long_name.as_deref()
    }

    /// Raw payload bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn risk(&self) -> Risk {
        self.risk
    }

    /// Lowercase extension of the preferred filename, when one exists.
    pub fn extension(&self) -> Option<String> {
        extension_of(self.long_name.as_deref().or(self.short_name.as_deref())?)
    }

    /// Hex SHA-1 digest of the payload, computed once on first access.
    pub fn sha1(&self) -> &str {
        self.sha1.get_or_init(|| {
            let mut hasher = Sha1::new();
            hasher.update(&self.data);
            format!("{:x}", hasher.finalize())
        })
    }

    /// Filename used when writing to disk: long name, then short name, then
    /// a name derived from the content digest.
    pub fn save_name(&self) -> String {
        if let Some(name) = self.long_name.as_deref().or(self.short_name.as_deref()) {
            return sanitize_filename(name);
        }
        format!("attachment-{}.bin", &self.sha1()[..10])
    }

    /// Write the payload under `dir`, creating the directory if needed.
    /// Returns the destination path.
    pub fn save_to(&self, dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(dir).map_err(|e| TriageError::io(dir, e))?;
        let dest = dir.join(self.save_name());
        std::fs::write(&dest, &self.data).map_err(|e| TriageError::io(&dest, e))?;
        tracing::debug!(path = %dest.display(), bytes = self.data.len(), "Wrote attachment");
        Ok(dest)
    }
}

// Embedded filenames may carry path components; keep only the last one.
fn sanitize_filename(name: &str) -> String {
    let tail = name.rsplit(['/', '\\']).next().unwrap_or(name);
    if tail.is_empty() {
        "attachment.bin".to_string()
    } else {
        tail.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture(short: Option<&str>, long: Option<&str>, data: &[u8]) -> Attachment {
        Attachment::new(
            short.map(str::to_string),
            long.map(str::to_string),
            data.to_vec(),
            &RiskCatalog::default(),
        )
    }

    #[test]
    fn test_sha1_is_stable() {
        let attachment = fixture(None, Some("a.txt"), b"abc");
        let first = attachment.sha1().to_string();
        assert_eq!(first, "a9993e364706816aba3e25717850c26c9cd0d89d");
        assert_eq!(attachment.sha1(), first);
    }

    #[test]
    fn test_risk_prefers_long_name() {
        let attachment = fixture(Some("SAFE~1.TXT"), Some("payload.exe"), b"");
        assert_eq!(attachment.risk(), Risk::Risky);
        assert_eq!(attachment.extension(), Some("exe".to_string()));
    }

    #[test]
    fn test_risk_falls_back_to_short_name() {
        let attachment = fixture(Some("RUNME~1.BAT"), None, b"");
        assert_eq!(attachment.risk(), Risk::Risky);
    }

    #[test]
    fn test_nameless_attachment_is_unknown_risk() {
        let attachment = fixture(None, None, b"payload");
        assert_eq!(attachment.risk(), Risk::Unknown);
        assert_eq!(attachment.extension(), None);
    }

    #[test]
    fn test_save_name_preference_order() {
        assert_eq!(fixture(Some("S.TXT"), Some("long.txt"), b"").save_name(), "long.txt");
        assert_eq!(fixture(Some("S.TXT"), None, b"").save_name(), "S.TXT");
        let generated = fixture(None, None, b"abc").save_name();
        assert_eq!(generated, "attachment-a9993e3647.bin");
    }

    #[test]
    fn test_save_name_strips_path_components() {
        let attachment = fixture(None, Some("..\\..\\evil\\x.exe"), b"");
        assert_eq!(attachment.save_name(), "x.exe");
    }

    #[test]
    fn test_save_to_writes_payload() {
        let dir = tempfile::tempdir().expect("tempdir");
        let attachment = fixture(None, Some("note.txt"), b"hello");
        let dest = attachment.save_to(dir.path()).expect("save");
        assert_eq!(std::fs::read(dest).expect("read back"), b"hello");
    }
}
