//! Attachment risk classification by filename extension.

use std::collections::BTreeSet;
use std::fmt;

/// Tri-state risk classification.
///
/// `Unknown` covers attachments whose risk cannot be determined (no
/// filename, or a filename without an extension) and must never be
/// reported as `NotRisky`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Risk {
    Risky,
    NotRisky,
    Unknown,
}

impl Risk {
    /// Flag form for persistence: unknown maps to absent.
    pub fn as_flag(self) -> Option<bool> {
        match self {
            Risk::Risky => Some(true),
            Risk::NotRisky => Some(false),
            Risk::Unknown => None,
        }
    }
}

impl fmt::Display for Risk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Risk::Risky => write!(f, "risky"),
            Risk::NotRisky => write!(f, "not risky"),
            Risk::Unknown => write!(f, "unknown"),
        }
    }
}

/// Extensions of executable code, scripts, macro-capable office documents
/// and common archive formats.
pub const BUILTIN_RISKY_EXTENSIONS: &[&str] = &[
    "bat", "bin", "cmd", "com", "cpl", "dll", "doc", "docb", "docm", "docx", "dot", "dotm",
    "dotx", "exe", "hta", "htm", "html", "jar", "msc", "msi", "msp", "mst", "pdf", "pif", "pot",
    "potm", "potx", "ppam", "pps", "ppsm", "ppsx", "ppt", "pptm", "pptx", "ps1", "ps1xml", "ps2",
    "ps2xml", "psc1", "psc2", "reg", "rgs", "scr", "sct", "shb", "shs", "sldm", "sldx", "vb",
    "vba", "vbe", "vbs", "vbscript", "ws", "wsh", "xla", "xlam", "xll", "xlm", "xls", "xlsb",
    "xlsm", "xlsx", "xlt", "xltm", "xltx", "xlw", "zip",
];

/// The extension table driving classification, built once per process from
/// the built-in list plus configured extras.
#[derive(Debug, Clone)]
pub struct RiskCatalog {
    extensions: BTreeSet<String>,
}

impl RiskCatalog {
    /// Build the catalog. Extras may carry a leading dot and any case.
    pub fn new(extra: &[String]) -> Self {
        let mut extensions: BTreeSet<String> = BUILTIN_RISKY_EXTENSIONS
            .iter()
            .map(|ext| ext.to_string())
            .collect();
        for ext in extra {
            let ext = ext.trim_start_matches('.').to_ascii_lowercase();
            if !ext.is_empty() {
                extensions.insert(ext);
            }
        }
        Self { extensions }
    }

    /// Classify a filename by its lowercase extension after the final dot.
    /// A name without a dot, or no name at all, is `Unknown`.
    pub fn classify(&self, filename: Option<&str>) -> Risk {
        let Some(name) = filename else {
            return Risk::Unknown;
        };
        match extension_of(name) {
            Some(ext) if self.extensions.contains(&ext) => Risk::Risky,
            Some(_) => Risk::NotRisky,
            None => Risk::Unknown,
        }
    }
}

impl Default for RiskCatalog {
    fn default() -> Self {
        Self::new(&[])
    }
}

/// Lowercase substring after the final `.`, or `None` when there is no dot.
pub fn extension_of(name: &str) -> Option<String> {
    name.rfind('.').map(|dot| name[dot + 1..].to_ascii_lowercase())
}
