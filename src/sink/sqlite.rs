//! SQLite sink.
//!
//! The schema mirrors the record shape: one `message` row per tree node
//! with a self-referencing `parent_id`, one `attachments` row per
//! attachment. A whole message tree lands in a single transaction, so a
//! failing file leaves no partial rows behind.

use std::path::Path;

use rusqlite::{params, Connection, Transaction};

use crate::error::{Result, TriageError};
use crate::sink::record::MessageRecord;
use crate::sink::MessageSink;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS message (
    id INTEGER PRIMARY KEY,
    sender TEXT,
    sender_email TEXT,
    \"to\" TEXT,
    cc TEXT,
    subject TEXT,
    header TEXT,
    urls TEXT,
    date TEXT NOT NULL,
    body TEXT,
    spf_pass INTEGER,
    distinct_senders_in_header INTEGER,
    from_mismatch_header INTEGER,
    internal_mail INTEGER,
    parent_id INTEGER REFERENCES message(id)
);
CREATE TABLE IF NOT EXISTS attachments (
    id INTEGER PRIMARY KEY,
    short_name TEXT,
    long_name TEXT,
    extension TEXT,
    sha1 TEXT NOT NULL,
    size INTEGER NOT NULL,
    risky INTEGER,
    message_id INTEGER NOT NULL REFERENCES message(id)
);
";

/// Message store backed by a SQLite database file.
pub struct SqliteSink {
    conn: Connection,
}

impl SqliteSink {
    /// Opens or creates the database at `path` and ensures the schema.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        tracing::debug!(path = %path.display(), "Opened message database");
        Self::init(conn)
    }

    /// Fully in-memory database, for tests and dry runs.
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    /// Borrow of the underlying connection, for ad hoc queries.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    fn insert_tree(
        tx: &Transaction<'_>,
        record: &MessageRecord,
        parent_id: Option<i64>,
    ) -> Result<i64> {
        let urls = match &record.urls {
            Some(urls) => {
                Some(serde_json::to_string(urls).map_err(|e| TriageError::Sink(e.to_string()))?)
            }
            None => None,
        };
        tx.execute(
            "INSERT INTO message (sender, sender_email, \"to\", cc, subject, header, urls, \
             date, body, spf_pass, distinct_senders_in_header, from_mismatch_header, \
             internal_mail, parent_id) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
            params![
                record.sender,
                record.sender_email,
                record.to,
                record.cc,
                record.subject,
                record.header,
                urls,
                record.date.map(|d| d.to_rfc3339()),
                record.body,
                record.spf_pass,
                record.distinct_senders_in_header,
                record.from_mismatch_header,
                record.internal_mail,
                parent_id,
            ],
        )?;
        let id = tx.last_insert_rowid();

        for attachment in &record.attachments {
            tx.execute(
                "INSERT INTO attachments (short_name, long_name, extension, sha1, size, risky, \
                 message_id) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    attachment.short_name,
                    attachment.long_name,
                    attachment.extension,
                    attachment.sha1,
                    attachment.size as i64,
                    attachment.risky,
                    id,
                ],
            )?;
        }
        for nested in &record.nested_messages {
            Self::insert_tree(tx, nested, Some(id))?;
        }
        Ok(id)
    }
}

impl MessageSink for SqliteSink {
    fn store(&mut self, record: &MessageRecord) -> Result<()> {
        record.ensure_timestamps()?;
        let tx = self.conn.transaction()?;
        Self::insert_tree(&tx, record, None)?;
        tx.commit()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn record(subject: &str, date: Option<chrono::DateTime<Utc>>) -> MessageRecord {
        MessageRecord {
            sender: Some("a@x.example".to_string()),
            sender_email: Some("a@x.example".to_string()),
            to: None,
            cc: None,
            subject: Some(subject.to_string()),
            header: None,
            urls: Some(vec!["http://one.example/".to_string()]),
            date,
            date_raw: "Tue, 1 Jul 2003 10:52:37 +0200".to_string(),
            body: None,
            spf_pass: Some(true),
            internal_mail: Some(true),
            distinct_senders_in_header: None,
            from_mismatch_header: None,
            attachments: Vec::new(),
            nested_messages: Vec::new(),
        }
    }

    fn sample_date() -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2003, 7, 1, 8, 52, 37).unwrap()
    }

    #[test]
    fn test_stores_a_flat_record() {
        let mut sink = SqliteSink::open_in_memory().expect("open");
        sink.store(&record("hello", Some(sample_date()))).expect("store");

        let (subject, date, urls): (String, String, String) = sink
            .connection()
            .query_row("SELECT subject, date, urls FROM message", [], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?))
            })
            .expect("row");
        assert_eq!(subject, "hello");
        assert_eq!(date, "2003-07-01T08:52:37+00:00");
        assert_eq!(urls, "[\"http://one.example/\"]");
    }

    #[test]
    fn test_nested_messages_get_parent_ids() {
        let mut outer = record("outer", Some(sample_date()));
        outer.nested_messages.push(record("inner", Some(sample_date())));
        let mut sink = SqliteSink::open_in_memory().expect("open");
        sink.store(&outer).expect("store");

        let parent: Option<i64> = sink
            .connection()
            .query_row(
                "SELECT parent_id FROM message WHERE subject = 'inner'",
                [],
                |row| row.get(0),
            )
            .expect("row");
        let outer_id: i64 = sink
            .connection()
            .query_row(
                "SELECT id FROM message WHERE subject = 'outer'",
                [],
                |row| row.get(0),
            )
            .expect("row");
        assert_eq!(parent, Some(outer_id));
    }

    #[test]
    fn test_record_without_date_stores_nothing() {
        let mut sink = SqliteSink::open_in_memory().expect("open");
        let result = sink.store(&record("dateless", None));
        assert!(matches!(result, Err(TriageError::UnparseableDate { .. })));

        let rows: i64 = sink
            .connection()
            .query_row("SELECT COUNT(*) FROM message", [], |row| row.get(0))
            .expect("count");
        assert_eq!(rows, 0);
    }

    #[test]
    fn test_nested_dateless_message_rolls_back_whole_tree() {
        let mut outer = record("outer", Some(sample_date()));
        outer.nested_messages.push(record("inner", None));
        let mut sink = SqliteSink::open_in_memory().expect("open");
        assert!(sink.store(&outer).is_err());

        let rows: i64 = sink
            .connection()
            .query_row("SELECT COUNT(*) FROM message", [], |row| row.get(0))
            .expect("count");
        assert_eq!(rows, 0);
    }
}
