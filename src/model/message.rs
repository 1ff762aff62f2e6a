//! Message node: one storage subtree exposed as logical fields.
//!
//! Every field is resolved from the container on first access and cached,
//! so repeated reads hit each stream pair at most once. Child nodes are
//! discovered the same way; the tree is owned top down and nodes of one
//! tree share a single opened container.

use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

use chrono::{DateTime, FixedOffset};
use once_cell::unsync::OnceCell;

use crate::analysis::risk::RiskCatalog;
use crate::analysis::urls::extract_urls;
use crate::container::{join_path, resolve_string, CfbContainer, ContainerRead};
use crate::error::{Result, TriageError};
use crate::model::attachment::Attachment;
use crate::model::properties as props;
use crate::parser::header::{extract_address, parse_date, HeaderBlock};

/// State shared by every node of one message tree.
struct Source {
    container: RefCell<Box<dyn ContainerRead>>,
    risk: RiskCatalog,
}

/// Child nodes of one message, in container enumeration order.
#[derive(Default)]
pub struct Children {
    /// Plain binary attachments.
    pub attachments: Vec<Attachment>,
    /// Embedded messages.
    pub messages: Vec<Message>,
}

/// One message node of an opened `.msg` file.
pub struct Message {
    source: Rc<Source>,
    prefix: Vec<String>,
    header_raw: OnceCell<Option<String>>,
    header: OnceCell<Option<HeaderBlock>>,
    subject: OnceCell<Option<String>>,
    sender: OnceCell<Option<String>>,
    sender_email: OnceCell<Option<String>>,
    to: OnceCell<Option<String>>,
    cc: OnceCell<Option<String>>,
    body: OnceCell<Option<String>>,
    urls: OnceCell<Option<Vec<String>>>,
    parsed_date: OnceCell<Option<DateTime<FixedOffset>>>,
    children: OnceCell<Children>,
    spf_pass: Option<bool>,
    internal_mail: Option<bool>,
    distinct_senders_in_header: Option<u32>,
    from_mismatch_header: Option<bool>,
}

impl Message {
    /// Opens a `.msg` file and wraps its root storage.
    pub fn open(path: &Path, risk: RiskCatalog) -> Result<Self> {
        let container = CfbContainer::open(path)?;
        Ok(Self::from_container(Box::new(container), risk))
    }

    /// Wraps the root of an already opened container.
    pub fn from_container(container: Box<dyn ContainerRead>, risk: RiskCatalog) -> Self {
        let source = Rc::new(Source {
            container: RefCell::new(container),
            risk,
        });
        Self::new(source, Vec::new())
    }

    fn new(source: Rc<Source>, prefix: Vec<String>) -> Self {
        Self {
            source,
            prefix,
            header_raw: OnceCell::new(),
            header: OnceCell::new(),
            subject: OnceCell::new(),
            sender: OnceCell::new(),
            sender_email: OnceCell::new(),
            to: OnceCell::new(),
            cc: OnceCell::new(),
            body: OnceCell::new(),
            urls: OnceCell::new(),
            parsed_date: OnceCell::new(),
            children: OnceCell::new(),
            spf_pass: None,
            internal_mail: None,
            distinct_senders_in_header: None,
            from_mismatch_header: None,
        }
    }

    /// Segment path of this node's storage. Empty at the root; each level
    /// of embedding extends it by two segments.
    pub fn prefix(&self) -> &[String] {
        &self.prefix
    }

    // ─── Field access ───

    /// Subject line.
    pub fn subject(&self) -> Result<Option<&str>> {
        let value = self
            .subject
            .get_or_try_init(|| self.read_property(props::SUBJECT))?;
        Ok(value.as_deref())
    }

    /// Raw transport header block, exactly as stored.
    pub fn header_raw(&self) -> Result<Option<&str>> {
        let value = self
            .header_raw
            .get_or_try_init(|| self.read_property(props::HEADER))?;
        Ok(value.as_deref())
    }

    /// Parsed transport header, when the message carries one.
    pub fn header(&self) -> Result<Option<&HeaderBlock>> {
        let value = self
            .header
            .get_or_try_init(|| Ok::<_, TriageError>(self.header_raw()?.map(HeaderBlock::parse)))?;
        Ok(value.as_ref())
    }

    /// Sender display string: the header `From:` field when present,
    /// composed from the sender name and address properties otherwise.
    pub fn sender(&self) -> Result<Option<&str>> {
        let value = self.sender.get_or_try_init(|| {
            if let Some(header) = self.header()? {
                if let Some(from) = header.field("from") {
                    return Ok::<_, TriageError>(Some(from.to_string()));
                }
            }
            let name = self.read_property(props::SENDER_NAME)?;
            let address = self.read_property(props::SENDER_EMAIL)?;
            Ok(match (name, address) {
                (Some(name), Some(address)) => Some(format!("{name} <{address}>")),
                (Some(name), None) => Some(name),
                (None, address) => address,
            })
        })?;
        Ok(value.as_deref())
    }

    /// First mail address appearing in the sender string.
    pub fn sender_email(&self) -> Result<Option<&str>> {
        let value = self
            .sender_email
            .get_or_try_init(|| Ok::<_, TriageError>(self.sender()?.and_then(extract_address)))?;
        Ok(value.as_deref())
    }

    /// Recipient display string: the header `To:` field when present, the
    /// display-to property otherwise.
    pub fn to(&self) -> Result<Option<&str>> {
        let value = self
            .to
            .get_or_try_init(|| self.field_or_property("to", props::DISPLAY_TO))?;
        Ok(value.as_deref())
    }

    /// Carbon-copy display string, resolved like [`to`](Self::to).
    pub fn cc(&self) -> Result<Option<&str>> {
        let value = self
            .cc
            .get_or_try_init(|| self.field_or_property("cc", props::DISPLAY_CC))?;
        Ok(value.as_deref())
    }

    /// Plain-text body.
    pub fn body(&self) -> Result<Option<&str>> {
        let value = self
            .body
            .get_or_try_init(|| self.read_property(props::BODY))?;
        Ok(value.as_deref())
    }

    /// URLs found in the body, in order of appearance. `None` when the
    /// message has no body at all, an empty list when it has one without
    /// links.
    pub fn urls(&self) -> Result<Option<&[String]>> {
        let value = self
            .urls
            .get_or_try_init(|| Ok::<_, TriageError>(self.body()?.map(extract_urls)))?;
        Ok(value.as_deref())
    }

    /// Raw `Date:` header value.
    pub fn date_raw(&self) -> Result<Option<&str>> {
        Ok(self.header()?.and_then(|h| h.field("date")))
    }

    /// Parsed `Date:` header. A missing date is `Ok(None)`; present but
    /// nonconforming text is an error the caller decides how to surface.
    pub fn date(&self) -> Result<Option<DateTime<FixedOffset>>> {
        let value = self.parsed_date.get_or_try_init(|| match self.date_raw()? {
            Some(raw) => Ok::<_, TriageError>(Some(parse_date(raw)?)),
            None => Ok(None),
        })?;
        Ok(*value)
    }

    // ─── Authenticity verdicts ───

    /// SPF verdict. `None` until the tree has been annotated.
    pub fn spf_pass(&self) -> Option<bool> {
        self.spf_pass
    }

    /// Whether this message never crossed the mail boundary. `None` until
    /// the tree has been annotated.
    pub fn internal_mail(&self) -> Option<bool> {
        self.internal_mail
    }

    /// Number of distinct sender addresses the header declares, recorded
    /// only when more than one was seen.
    pub fn distinct_senders_in_header(&self) -> Option<u32> {
        self.distinct_senders_in_header
    }

    /// Whether the visible sender is absent from the server generated
    /// sender set. `None` for internal mail.
    pub fn from_mismatch_header(&self) -> Option<bool> {
        self.from_mismatch_header
    }

    pub(crate) fn set_authenticity(
        &mut self,
        spf_pass: bool,
        internal_mail: bool,
        distinct_senders: Option<u32>,
        from_mismatch: Option<bool>,
    ) {
        self.spf_pass = Some(spf_pass);
        self.internal_mail = Some(internal_mail);
        self.distinct_senders_in_header = distinct_senders;
        self.from_mismatch_header = from_mismatch;
    }

    // ─── Children ───

    /// Plain attachments of this node, discovering children on first call.
    pub fn attachments(&self) -> Result<&[Attachment]> {
        Ok(&self.ensure_children()?.attachments)
    }

    /// Embedded messages of this node.
    pub fn messages(&self) -> Result<&[Message]> {
        Ok(&self.ensure_children()?.messages)
    }

    fn ensure_children(&self) -> Result<&Children> {
        self.children.get_or_try_init(|| self.discover_children())
    }

    /// Detaches the materialized child collections for mutation.
    pub(crate) fn take_children(&mut self) -> Result<Children> {
        self.ensure_children()?;
        Ok(self.children.take().unwrap_or_default())
    }

    /// Reattaches children previously removed with
    /// [`take_children`](Self::take_children).
    pub(crate) fn restore_children(&mut self, children: Children) {
        self.children = OnceCell::with_value(children);
    }

    /// One attachment subtree per distinct first segment below this node
    /// that carries the attachment prefix, first occurrence deciding the
    /// order. A subtree with a raw data stream becomes an [`Attachment`];
    /// one holding an embedded message storage becomes a nested
    /// [`Message`]; anything else is skipped with a warning.
    fn discover_children(&self) -> Result<Children> {
        let streams = self.source.container.borrow().list_streams(&self.prefix);
        let depth = self.prefix.len();

        let mut dirs: Vec<String> = Vec::new();
        for path in &streams {
            if let Some(first) = path.get(depth) {
                if first.starts_with(props::ATTACH_DIR_PREFIX) && !dirs.contains(first) {
                    dirs.push(first.clone());
                }
            }
        }

        let mut children = Children::default();
        for dir in dirs {
            let has_data = streams.iter().any(|p| {
                p.len() == depth + 2 && p[depth] == dir && p[depth + 1] == props::ATTACH_DATA_STREAM
            });
            if has_data {
                children.attachments.push(self.load_attachment(&dir)?);
                continue;
            }

            let has_message = streams.iter().any(|p| {
                p.len() > depth + 2
                    && p[depth] == dir
                    && p[depth + 1] == props::ATTACH_MESSAGE_STORAGE
            });
            if has_message {
                let mut prefix = self.prefix.clone();
                prefix.push(dir);
                prefix.push(props::ATTACH_MESSAGE_STORAGE.to_string());
                children
                    .messages
                    .push(Message::new(Rc::clone(&self.source), prefix));
            } else {
                tracing::warn!(
                    storage = %dir,
                    "Attachment storage carries neither data nor an embedded message, skipping"
                );
            }
        }
        Ok(children)
    }

    fn load_attachment(&self, dir: &str) -> Result<Attachment> {
        let long_name = self.read_string_at(
            self.subtree_path(dir, props::string_stream(props::ATTACH_LONG_NAME)),
        )?;
        let short_name = self.read_string_at(
            self.subtree_path(dir, props::string_stream(props::ATTACH_SHORT_NAME)),
        )?;

        let data_path = self.subtree_path(dir, props::ATTACH_DATA_STREAM.to_string());
        let data = {
            let mut container = self.source.container.borrow_mut();
            container
                .read_stream(&data_path)
                .map_err(|e| TriageError::stream(join_path(&data_path), e))?
        };
        let data = match data {
            Some(bytes) => bytes,
            None => {
                tracing::warn!(
                    stream = %join_path(&data_path),
                    "Listed attachment data stream could not be read back, treating as empty"
                );
                Vec::new()
            }
        };

        Ok(Attachment::new(
            short_name,
            long_name,
            data,
            &self.source.risk,
        ))
    }

    // ─── Stream plumbing ───

    /// Resolved string property directly under this node.
    fn read_property(&self, code: &str) -> Result<Option<String>> {
        let mut base = self.prefix.clone();
        base.push(props::string_stream(code));
        self.read_string_at(base)
    }

    /// Header field when the header has it, property stream otherwise.
    fn field_or_property(&self, field: &str, code: &str) -> Result<Option<String>> {
        if let Some(header) = self.header()? {
            if let Some(value) = header.field(field) {
                return Ok(Some(value.to_string()));
            }
        }
        self.read_property(code)
    }

    fn subtree_path(&self, dir: &str, leaf: String) -> Vec<String> {
        let mut path = self.prefix.clone();
        path.push(dir.to_string());
        path.push(leaf);
        path
    }

    fn read_string_at(&self, base: Vec<String>) -> Result<Option<String>> {
        let name = join_path(&base);
        let mut container = self.source.container.borrow_mut();
        resolve_string(&mut **container, &base).map_err(|e| TriageError::stream(name, e))
    }
}
