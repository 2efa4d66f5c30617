//! Normalized source records

use crate::unique::UniqueList;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Format used for every run timestamp written to an output
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Render a run timestamp the way the output tables expect it
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// Serde adapter for [`TIMESTAMP_FORMAT`]
pub mod run_timestamp {
    use super::TIMESTAMP_FORMAT;
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_timestamp(ts))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let s = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&s, TIMESTAMP_FORMAT)
            .map(|naive| naive.and_utc())
            .map_err(serde::de::Error::custom)
    }
}

/// Catalog a record was harvested from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    /// Web-scraped catalog
    Goodreads,
    /// API-enriched catalog
    GoogleBooks,
}

impl Source {
    /// Stable tag used in tables and reports
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Goodreads => "goodreads",
            Source::GoogleBooks => "googlebooks",
        }
    }

    /// All sources in unification order
    pub fn all() -> [Source; 2] {
        [Source::Goodreads, Source::GoogleBooks]
    }
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Points back at one input row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecordRef {
    pub source: Source,
    pub row_id: usize,
}

impl std::fmt::Display for RecordRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.source, self.row_id)
    }
}

/// One input row after field normalization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    pub source: Source,
    /// 1-based position within its source
    pub row_id: usize,
    pub title: Option<String>,
    pub author_principal: Option<String>,
    pub authors: UniqueList,
    pub categories: UniqueList,
    pub publisher: Option<String>,
    /// `YYYY-MM-DD`
    pub pub_date: Option<String>,
    pub language: Option<String>,
    pub price_amount: Option<f64>,
    pub price_currency: Option<String>,
    /// Raw, uncleaned
    pub isbn10: Option<String>,
    /// Raw, uncleaned
    pub isbn13: Option<String>,
    pub candidate_key: String,
    /// Input fields with no dedicated attribute, in input order
    #[serde(default)]
    pub passthrough: Map<String, Value>,
}

impl RawRecord {
    /// An all-null record; mostly useful as a base for struct update syntax
    pub fn empty(source: Source, row_id: usize) -> Self {
        Self {
            source,
            row_id,
            title: None,
            author_principal: None,
            authors: UniqueList::new(),
            categories: UniqueList::new(),
            publisher: None,
            pub_date: None,
            language: None,
            price_amount: None,
            price_currency: None,
            isbn10: None,
            isbn13: None,
            candidate_key: String::new(),
            passthrough: Map::new(),
        }
    }

    pub fn reference(&self) -> RecordRef {
        RecordRef {
            source: self.source,
            row_id: self.row_id,
        }
    }
}

/// A record as retained in the detail table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailRecord {
    #[serde(flatten)]
    pub record: RawRecord,
    #[serde(with = "run_timestamp")]
    pub timestamp_ingesta: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_source_tags() {
        assert_eq!(Source::Goodreads.as_str(), "goodreads");
        assert_eq!(Source::GoogleBooks.to_string(), "googlebooks");
        assert_eq!(
            serde_json::to_string(&Source::GoogleBooks).unwrap(),
            "\"googlebooks\""
        );
    }

    #[test]
    fn test_format_timestamp() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
        assert_eq!(format_timestamp(&ts), "2024-03-09T07:05:01Z");
    }

    #[test]
    fn test_record_ref_display() {
        let record = RawRecord::empty(Source::Goodreads, 4);
        assert_eq!(record.reference().to_string(), "goodreads#4");
    }
}
