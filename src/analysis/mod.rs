//! Message analysis: authenticity scoring, URL extraction, attachment risk.

pub mod authenticity;
pub mod risk;
pub mod urls;

pub use authenticity::{score_header, ScoreOutcome};

use crate::config::ScoringConfig;
use crate::error::Result;
use crate::model::Message;

/// Scores `message` and every embedded message below it.
///
/// Child discovery happens here if it has not happened yet, since the
/// annotation covers the whole tree. Scoring is deterministic: annotating
/// an already annotated tree leaves it unchanged.
pub fn annotate(message: &mut Message, config: &ScoringConfig) -> Result<()> {
    score_node(message, config)?;
    let mut children = message.take_children()?;
    for child in &mut children.messages {
        annotate(child, config)?;
    }
    message.restore_children(children);
    Ok(())
}

fn score_node(message: &mut Message, config: &ScoringConfig) -> Result<()> {
    let header = message.header_raw()?.unwrap_or_default().to_string();
    let sender_email = message.sender_email()?.map(str::to_string);
    let outcome = score_header(&header, sender_email.as_deref(), config);
    message.set_authenticity(
        outcome.spf_pass,
        outcome.internal_mail,
        outcome.distinct_senders,
        outcome.from_mismatch,
    );
    Ok(())
}
