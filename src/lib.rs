//! Triage for Outlook `.msg` files.
//!
//! Opens OLE compound files, extracts the message tree (fields,
//! attachments, embedded messages at any depth), scores transport header
//! authenticity against the visible sender, and persists flattened
//! records to SQLite or JSON Lines.
//!
//! The typical flow is [`batch::run_scan`] over a set of files; for one
//! file, [`model::Message::open`] followed by [`analysis::annotate`] gives
//! the full annotated tree.

pub mod analysis;
pub mod batch;
pub mod config;
pub mod container;
pub mod error;
pub mod model;
pub mod parser;
pub mod sink;

pub use config::Config;
pub use error::{Result, TriageError};
pub use model::{Attachment, Message};
