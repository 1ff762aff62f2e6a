//! Flattened records handed to sinks.
//!
//! A record is a plain snapshot of an extracted and annotated tree: no
//! container handle, no laziness. Building one forces every field of every
//! node exactly once.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{Result, TriageError};
use crate::model::{Attachment, Message};
use crate::parser::parse_date;

/// One message node, flattened. Nested messages keep their tree shape.
#[derive(Debug, Clone, Serialize)]
pub struct MessageRecord {
    pub sender: Option<String>,
    pub sender_email: Option<String>,
    pub to: Option<String>,
    pub cc: Option<String>,
    pub subject: Option<String>,
    pub header: Option<String>,
    pub urls: Option<Vec<String>>,
    /// Parsed date, normalized to UTC. `None` when the header carried none
    /// or the text failed to parse; `date_raw` keeps whatever was there.
    pub date: Option<DateTime<Utc>>,
    pub date_raw: String,
    pub body: Option<String>,
    pub spf_pass: Option<bool>,
    pub internal_mail: Option<bool>,
    pub distinct_senders_in_header: Option<u32>,
    pub from_mismatch_header: Option<bool>,
    pub attachments: Vec<AttachmentRecord>,
    pub nested_messages: Vec<MessageRecord>,
}

/// One attachment, flattened. The payload itself stays out of records;
/// its digest and size stand in for it.
#[derive(Debug, Clone, Serialize)]
pub struct AttachmentRecord {
    pub short_name: Option<String>,
    pub long_name: Option<String>,
    /// Lowercase extension of the preferred filename.
    pub extension: Option<String>,
    pub sha1: String,
    pub size: u64,
    /// `None` mirrors an unknown risk verdict.
    pub risky: Option<bool>,
}

impl MessageRecord {
    /// Flattens an extracted message tree.
    ///
    /// An absent or unparseable date surfaces as `date: None` here; sinks
    /// that require a timestamp call
    /// [`ensure_timestamps`](Self::ensure_timestamps) before writing.
    pub fn from_message(message: &Message) -> Result<Self> {
        let date_raw = message.date_raw()?.unwrap_or_default().to_string();
        let date = message
            .date_raw()?
            .and_then(|raw| parse_date(raw).ok())
            .map(|date| date.with_timezone(&Utc));

        let attachments = message
            .attachments()?
            .iter()
            .map(AttachmentRecord::from_attachment)
            .collect();
        let mut nested_messages = Vec::new();
        for child in message.messages()? {
            nested_messages.push(MessageRecord::from_message(child)?);
        }

        Ok(Self {
            sender: message.sender()?.map(str::to_string),
            sender_email: message.sender_email()?.map(str::to_string),
            to: message.to()?.map(str::to_string),
            cc: message.cc()?.map(str::to_string),
            subject: message.subject()?.map(str::to_string),
            header: message.header_raw()?.map(str::to_string),
            urls: message.urls()?.map(<[String]>::to_vec),
            date,
            date_raw,
            body: message.body()?.map(str::to_string),
            spf_pass: message.spf_pass(),
            internal_mail: message.internal_mail(),
            distinct_senders_in_header: message.distinct_senders_in_header(),
            from_mismatch_header: message.from_mismatch_header(),
            attachments,
            nested_messages,
        })
    }

    /// Enforces the strict date rule for sinks that need a timestamp: every
    /// node of the tree must carry a parsed date.
    pub fn ensure_timestamps(&self) -> Result<()> {
        if self.date.is_none() {
            return Err(TriageError::UnparseableDate {
                raw: self.date_raw.clone(),
            });
        }
        for nested in &self.nested_messages {
            nested.ensure_timestamps()?;
        }
        Ok(())
    }
}

impl AttachmentRecord {
    pub fn from_attachment(attachment: &Attachment) -> Self {
        Self {
            short_name: attachment.short_name().map(str::to_string),
            long_name: attachment.long_name().map(str::to_string),
            extension: attachment.extension(),
            sha1: attachment.sha1().to_string(),
            size: attachment.data().len() as u64,
            risky: attachment.risk().as_flag(),
        }
    }
}
