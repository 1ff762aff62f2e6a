//! Header authenticity scoring.
//!
//! Works on raw transport header text alone. The server generated
//! annotations inspected here (`Received-SPF` results, `envelope-from` and
//! `x-sender` parameters) are compared against the visible sender address
//! to spot forged mail.

use std::sync::LazyLock;

use regex::Regex;

use crate::config::ScoringConfig;

/// `Received-SPF` annotation: verdict plus the parenthesized detail text.
static SPF_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)Received-SPF: (Pass|None) \((.*?)\)")
        .unwrap_or_else(|e| panic!("spf regex: {e}"))
});

/// Address-shaped token inside SPF detail text.
static SPF_TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\S*?@[^) ]*").unwrap_or_else(|e| panic!("spf token regex: {e}")));

/// `envelope-from="…"` parameter of a Received line.
static ENVELOPE_FROM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)envelope-from="(.*?)""#).unwrap_or_else(|e| panic!("envelope regex: {e}"))
});

/// `x-sender="…"` parameter of a Received line.
static X_SENDER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)x-sender="(.*?)""#).unwrap_or_else(|e| panic!("x-sender regex: {e}"))
});

/// One `Received-SPF` annotation found in a header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpfAnnotation {
    /// Whether the verdict was `Pass` (the only other recognized verdict
    /// is `None`).
    pub pass: bool,
    /// Detail text between the parentheses, newlines preserved.
    pub details: String,
}

/// Authenticity verdict for one message header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreOutcome {
    pub spf_pass: bool,
    pub internal_mail: bool,
    /// Set only when the header declares more than one distinct sender.
    pub distinct_senders: Option<u32>,
    /// `None` for internal mail, otherwise whether the visible sender is
    /// absent from the server generated sender set.
    pub from_mismatch: Option<bool>,
}

/// Every SPF annotation in `header`, in order. When `internal_domain` is
/// set, only annotations whose details mention a host under that domain
/// count; the rest were added by infrastructure we do not trust to speak
/// for this message.
pub fn spf_annotations(header: &str, internal_domain: Option<&str>) -> Vec<SpfAnnotation> {
    let marker = internal_domain.map(|domain| format!(".{domain}: "));
    SPF_RE
        .captures_iter(header)
        .filter_map(|caps| {
            let details = caps.get(2)?.as_str();
            if let Some(marker) = &marker {
                if !details.contains(marker.as_str()) {
                    return None;
                }
            }
            Some(SpfAnnotation {
                pass: caps.get(1).map(|m| m.as_str()) == Some("Pass"),
                details: details.to_string(),
            })
        })
        .collect()
}

/// Address-shaped tokens inside SPF detail text, in order of appearance.
pub fn spf_sender_tokens(details: &str) -> Vec<String> {
    SPF_TOKEN_RE
        .find_iter(details)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// `envelope-from="…"` values, deduplicated preserving first appearance.
pub fn envelope_from_senders(header: &str) -> Vec<String> {
    dedup_captures(&ENVELOPE_FROM_RE, header)
}

/// `x-sender="…"` values, deduplicated preserving first appearance.
pub fn x_sender_senders(header: &str) -> Vec<String> {
    dedup_captures(&X_SENDER_RE, header)
}

/// Scores a raw header block against the visible sender address.
///
/// A header with no `Received-SPF` annotation at all never left the local
/// infrastructure: it is internal and passes, and the sender comparison
/// does not apply. Everything else is checked against the union of the
/// sender addresses the servers recorded.
pub fn score_header(
    header: &str,
    sender_email: Option<&str>,
    config: &ScoringConfig,
) -> ScoreOutcome {
    let annotations = spf_annotations(header, config.internal_domain.as_deref());

    let mut spf_pass = false;
    let mut all_senders: Vec<String> = Vec::new();
    for annotation in &annotations {
        tracing::debug!(pass = annotation.pass, details = %annotation.details, "SPF annotation");
        if annotation.pass {
            spf_pass = true;
        }
        for token in spf_sender_tokens(&annotation.details) {
            push_unique(&mut all_senders, &token);
        }
    }

    if !header.contains("Received-SPF") {
        return ScoreOutcome {
            spf_pass: true,
            internal_mail: true,
            distinct_senders: None,
            from_mismatch: None,
        };
    }

    for value in envelope_from_senders(header) {
        push_unique(&mut all_senders, &value);
    }
    for value in x_sender_senders(header) {
        push_unique(&mut all_senders, &value);
    }

    let distinct_senders = if all_senders.len() > 1 {
        tracing::warn!(senders = ?all_senders, "Multiple distinct senders declared in header");
        Some(all_senders.len() as u32)
    } else {
        None
    };

    let mismatch = match sender_email {
        Some(email) => !all_senders.iter().any(|s| s == email),
        None => true,
    };
    if mismatch {
        tracing::warn!(
            sender = sender_email.unwrap_or("<none>"),
            declared = ?all_senders,
            "Visible sender not present in server generated headers"
        );
    }

    ScoreOutcome {
        spf_pass,
        internal_mail: false,
        distinct_senders,
        from_mismatch: Some(mismatch),
    }
}

fn dedup_captures(re: &Regex, header: &str) -> Vec<String> {
    let mut values = Vec::new();
    for caps in re.captures_iter(header) {
        if let Some(m) = caps.get(1) {
            push_unique(&mut values, m.as_str());
        }
    }
    values
}

fn push_unique(values: &mut Vec<String>, candidate: &str) {
    if !values.iter().any(|v| v == candidate) {
        values.push(candidate.to_string());
    }
}
