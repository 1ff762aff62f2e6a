//! Batch scanning: many files, one sink.
//!
//! Files are isolated from each other. One corrupt or dateless file is
//! recorded as a failure and the scan moves on; nothing of that file
//! reaches the sink.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::analysis::annotate;
use crate::analysis::risk::RiskCatalog;
use crate::config::Config;
use crate::error::{Result, TriageError};
use crate::model::Message;
use crate::sink::{MessageRecord, MessageSink};

/// Outcome of one batch run.
#[derive(Debug, Default, Serialize)]
pub struct ScanSummary {
    /// Files stored successfully.
    pub scanned: u64,
    /// Files that failed, in input order.
    pub failed: Vec<ScanFailure>,
    /// Message nodes stored, embedded ones included.
    pub messages: u64,
    /// Messages classified as internal traffic.
    pub internal_messages: u64,
    /// Messages whose header carried SPF annotations but no pass.
    pub spf_failures: u64,
    /// Messages whose visible sender is absent from the server headers.
    pub from_mismatches: u64,
    /// Messages whose headers declare more than one sender.
    pub multi_sender_headers: u64,
    /// Attachments stored.
    pub attachments: u64,
    /// Attachments with a risky verdict.
    pub risky_attachments: u64,
    /// Attachments whose risk could not be determined.
    pub unknown_risk_attachments: u64,
    /// Total attachment payload size.
    pub attachment_bytes: u64,
}

/// One file that could not be processed.
#[derive(Debug, Serialize)]
pub struct ScanFailure {
    pub path: PathBuf,
    pub error: String,
}

/// Expands CLI inputs. Files are taken as given; a directory contributes
/// its `.msg` files (case-insensitive extension, no recursion), sorted by
/// name so runs are reproducible.
pub fn discover_inputs(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut inputs = Vec::new();
    for path in paths {
        if path.is_dir() {
            let mut entries: Vec<PathBuf> = Vec::new();
            for entry in std::fs::read_dir(path).map_err(|e| TriageError::io(path, e))? {
                let entry = entry.map_err(|e| TriageError::io(path, e))?;
                let candidate = entry.path();
                let is_msg = candidate
                    .extension()
                    .map(|ext| ext.eq_ignore_ascii_case("msg"))
                    .unwrap_or(false);
                if is_msg && candidate.is_file() {
                    entries.push(candidate);
                }
            }
            entries.sort();
            inputs.extend(entries);
        } else {
            inputs.push(path.clone());
        }
    }
    Ok(inputs)
}

/// Opens, extracts, and annotates one file.
pub fn load_message(path: &Path, config: &Config) -> Result<Message> {
    let catalog = RiskCatalog::new(&config.attachments.extra_risky_extensions);
    let mut message = Message::open(path, catalog)?;
    annotate(&mut message, &config.scoring)?;
    Ok(message)
}

/// Scans every input into `sink`. `progress` is called after each file
/// with the number done and the total.
pub fn run_scan(
    inputs: &[PathBuf],
    config: &Config,
    sink: &mut dyn MessageSink,
    progress: Option<&dyn Fn(u64, u64)>,
) -> Result<ScanSummary> {
    let total = inputs.len() as u64;
    let mut summary = ScanSummary::default();

    for (index, path) in inputs.iter().enumerate() {
        match scan_one(path, config, sink) {
            Ok(record) => {
                summary.scanned += 1;
                tally(&mut summary, &record);
            }
            Err(error) => {
                tracing::error!(path = %path.display(), %error, "Skipping file");
                summary.failed.push(ScanFailure {
                    path: path.clone(),
                    error: error.to_string(),
                });
            }
        }
        if let Some(report) = progress {
            report(index as u64 + 1, total);
        }
    }
    Ok(summary)
}

fn scan_one(path: &Path, config: &Config, sink: &mut dyn MessageSink) -> Result<MessageRecord> {
    let message = load_message(path, config)?;
    let record = MessageRecord::from_message(&message)?;
    sink.store(&record)?;
    tracing::info!(
        path = %path.display(),
        attachments = record.attachments.len(),
        nested = record.nested_messages.len(),
        "Stored message"
    );
    Ok(record)
}

fn tally(summary: &mut ScanSummary, record: &MessageRecord) {
    summary.messages += 1;
    if record.internal_mail == Some(true) {
        summary.internal_messages += 1;
    }
    if record.spf_pass == Some(false) {
        summary.spf_failures += 1;
    }
    if record.from_mismatch_header == Some(true) {
        summary.from_mismatches += 1;
    }
    if record.distinct_senders_in_header.is_some() {
        summary.multi_sender_headers += 1;
    }
    summary.attachments += record.attachments.len() as u64;
    for attachment in &record.attachments {
        summary.attachment_bytes += attachment.size;
        match attachment.risky {
            Some(true) => summary.risky_attachments += 1,
            Some(false) => {}
            None => summary.unknown_risk_attachments += 1,
        }
    }
    for nested in &record.nested_messages {
        tally(summary, nested);
    }
}
