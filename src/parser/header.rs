//! RFC 2822 transport header parsing.
//!
//! Header text arrives as one decoded string stream, folded and possibly
//! carrying RFC 2047 encoded words. [`HeaderBlock::parse`] unfolds the block
//! into ordered name/value pairs; lookup is case-insensitive, first match
//! wins. Dates are parsed under the strict RFC 2822 grammar only.

use std::sync::LazyLock;

use base64::{engine::general_purpose, Engine as _};
use chrono::{DateTime, FixedOffset};
use regex::Regex;

use crate::error::{Result, TriageError};

/// First plausible mail address inside a piece of display text.
static ADDRESS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[a-zA-Z0-9_.+-]+@[a-zA-Z0-9-]+\.[a-zA-Z0-9-.]+")
        .unwrap_or_else(|e| panic!("address regex: {e}"))
});

/// A parsed transport header block: ordered `(name, value)` fields with
/// case-insensitive lookup.
#[derive(Debug, Clone, Default)]
pub struct HeaderBlock {
    fields: Vec<(String, String)>,
}

impl HeaderBlock {
    /// Unfolds a raw header block and splits it into fields.
    ///
    /// Continuation lines (leading space or tab) join the previous field with
    /// a single space. Parsing stops at the first blank line, where a message
    /// body would begin. Lines without a colon that are not continuations are
    /// skipped.
    pub fn parse(raw: &str) -> Self {
        let mut fields: Vec<(String, String)> = Vec::new();

        for line in raw.lines() {
            if line.is_empty() {
                break;
            }
            if line.starts_with(' ') || line.starts_with('\t') {
                if let Some(last) = fields.last_mut() {
                    last.1.push(' ');
                    last.1.push_str(line.trim());
                }
            } else if let Some(colon) = line.find(':') {
                let name = line[..colon].trim().to_lowercase();
                let value = line[colon + 1..].trim().to_string();
                fields.push((name, value));
            }
        }

        Self { fields }
    }

    /// Raw value of the first field with the given name, if present.
    pub fn field(&self, name: &str) -> Option<&str> {
        let name = name.to_lowercase();
        self.fields
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Like [`field`](Self::field), with RFC 2047 encoded words decoded.
    pub fn display_field(&self, name: &str) -> Option<String> {
        self.field(name).map(decode_encoded_words)
    }

    /// Every parsed field in original order, names lowercased.
    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }

    /// Whether the block parsed to nothing.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Parses a `Date:` value under the strict RFC 2822 grammar.
///
/// There are no fallback formats. Nonconforming text is a distinct error so
/// callers can surface the failure per message instead of inventing a
/// timestamp.
pub fn parse_date(raw: &str) -> Result<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc2822(raw.trim()).map_err(|_| TriageError::UnparseableDate {
        raw: raw.trim().to_string(),
    })
}

/// Extracts the first mail address found in a display string such as
/// `"Ada Lovelace <ada@example.com>"`.
pub fn extract_address(text: &str) -> Option<String> {
    ADDRESS_RE.find(text).map(|m| m.as_str().to_string())
}

// ─── RFC 2047 encoded words ───

/// Decodes RFC 2047 encoded words (`=?charset?B|Q?payload?=`) within a
/// header value.
///
/// Whitespace between two adjacent encoded words is dropped per RFC 2047
/// section 6.2. Anything that fails to decode stays in the output verbatim.
pub fn decode_encoded_words(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut remaining = input;
    let mut last_was_encoded = false;

    while let Some(start) = remaining.find("=?") {
        let before = &remaining[..start];
        // Plain text between two encoded words that is pure whitespace is
        // separator only and gets dropped.
        if !last_was_encoded || !before.trim().is_empty() {
            result.push_str(before);
        }

        let after = &remaining[start + 2..];
        match decode_one_word(after) {
            Some((text, consumed)) => {
                result.push_str(&text);
                remaining = &after[consumed..];
                last_was_encoded = true;
            }
            None => {
                result.push_str("=?");
                remaining = after;
                last_was_encoded = false;
            }
        }
    }

    result.push_str(remaining);
    result
}

/// Decodes one `charset?encoding?payload?=` tail (the leading `=?` already
/// consumed). Returns the decoded text and how many bytes were eaten.
fn decode_one_word(s: &str) -> Option<(String, usize)> {
    let charset_end = s.find('?')?;
    let charset = &s[..charset_end];
    let rest = &s[charset_end + 1..];

    let encoding_end = rest.find('?')?;
    let encoding = &rest[..encoding_end];
    let payload_part = &rest[encoding_end + 1..];

    let payload_end = payload_part.find("?=")?;
    let payload = &payload_part[..payload_end];
    let consumed = charset_end + 1 + encoding_end + 1 + payload_end + 2;

    let bytes = match encoding {
        "B" | "b" => general_purpose::STANDARD.decode(payload.trim()).ok()?,
        "Q" | "q" => decode_q(payload),
        _ => return None,
    };

    Some((decode_charset(&bytes, charset), consumed))
}

/// Q-encoding: `_` is a space, `=XX` a hex escape, everything else literal.
/// A malformed escape keeps its `=` as plain text.
fn decode_q(payload: &str) -> Vec<u8> {
    let bytes = payload.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'_' => {
                out.push(b' ');
                i += 1;
            }
            b'=' if i + 2 < bytes.len() => {
                let hex = std::str::from_utf8(&bytes[i + 1..i + 3]).unwrap_or("");
                match u8::from_str_radix(hex, 16) {
                    Ok(byte) => {
                        out.push(byte);
                        i += 3;
                    }
                    Err(_) => {
                        out.push(b'=');
                        i += 1;
                    }
                }
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }

    out
}

/// Decodes bytes under a named charset, falling back to lossy UTF-8 when the
/// label is unknown.
fn decode_charset(bytes: &[u8], charset: &str) -> String {
    match encoding_rs::Encoding::for_label(charset.as_bytes()) {
        Some(encoding) => {
            let (decoded, _, _) = encoding.decode(bytes);
            decoded.into_owned()
        }
        None => {
            tracing::warn!(charset, "Unknown charset in encoded word, decoding as UTF-8");
            String::from_utf8_lossy(bytes).into_owned()
        }
    }
}
