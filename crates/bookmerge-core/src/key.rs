//! Candidate-key generation
//!
//! ISBN-13 keys are trimmed but otherwise used verbatim: `978-1-491-95766-0`
//! and `9781491957660` are different keys. Cleaning them here would change
//! which records get grouped.

use crate::record::RawRecord;
use once_cell::sync::Lazy;
use regex::Regex;

static WHITESPACE_RUN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Derive the provisional match key of a record
pub fn candidate_key(record: &RawRecord) -> String {
    if let Some(isbn13) = record.isbn13.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        return isbn13.to_string();
    }

    let composite = format!(
        "{}_{}_{}",
        record.title.as_deref().unwrap_or_default(),
        record.author_principal.as_deref().unwrap_or_default(),
        record.publisher.as_deref().unwrap_or_default(),
    );
    WHITESPACE_RUN_RE
        .replace_all(&composite.to_lowercase(), "_")
        .into_owned()
}
