//! Field normalizers and the per-row `normalize` step
//!
//! Every function here is total. A value that does not have the expected
//! shape becomes `None` (or an empty list) instead of an error.

use crate::key::candidate_key;
use crate::record::{RawRecord, Source};
use crate::unique::UniqueList;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

/// One input row as delivered by an ingestion collaborator
pub type InputRow = Map<String, Value>;

static FULL_DATE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}$").unwrap());
static YEAR_MONTH_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]{4}-[0-9]{2}$").unwrap());
static YEAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]{4}$").unwrap());
static LIST_SEPARATOR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[|,]").unwrap());

/// Fields consumed by [`normalize`]; anything else is passed through
const MAPPED_FIELDS: &[&str] = &[
    "title",
    "author",
    "author_principal",
    "authors",
    "categories",
    "publisher",
    "pub_date",
    "pub_date_normalized",
    "language",
    "price_amount",
    "price_currency",
    "isbn10",
    "isbn13",
];

/// Coerce `YYYY`, `YYYY-MM` or `YYYY-MM-DD` to `YYYY-MM-DD`
pub fn normalize_date(value: &Value) -> Option<String> {
    let s = value.as_str()?;
    if FULL_DATE_RE.is_match(s) {
        Some(s.to_string())
    } else if YEAR_MONTH_RE.is_match(s) {
        Some(format!("{}-01", s))
    } else if YEAR_RE.is_match(s) {
        Some(format!("{}-01-01", s))
    } else {
        None
    }
}

pub fn normalize_language(value: &Value) -> Option<String> {
    value.as_str().map(|s| s.trim().to_lowercase())
}

pub fn normalize_currency(value: &Value) -> Option<String> {
    value.as_str().map(|s| s.trim().to_uppercase())
}

/// Split a `|`- or `,`-delimited string into trimmed, unique tokens
///
/// A JSON array of strings is taken as already split.
pub fn normalize_list_field(value: &Value) -> UniqueList {
    match value {
        Value::String(s) => LIST_SEPARATOR_RE
            .split(s)
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .collect(),
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .collect(),
        _ => UniqueList::new(),
    }
}

/// Verbatim text; empty strings count as missing
pub fn normalize_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub fn normalize_price(value: &Value) -> Option<f64> {
    let amount = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    amount.is_finite().then_some(amount)
}

fn field<'a>(input: &'a InputRow, name: &str) -> &'a Value {
    input.get(name).unwrap_or(&Value::Null)
}

/// Turn one input row into a [`RawRecord`] with its candidate key
pub fn normalize(source: Source, row_id: usize, input: &InputRow) -> RawRecord {
    let author_principal =
        normalize_text(field(input, "author_principal")).or_else(|| normalize_text(field(input, "author")));

    let mut authors = normalize_list_field(field(input, "authors"));
    if authors.is_empty() {
        if let Some(author) = &author_principal {
            authors.push(author.clone());
        }
    }

    let pub_date =
        normalize_date(field(input, "pub_date_normalized")).or_else(|| normalize_date(field(input, "pub_date")));

    let passthrough: Map<String, Value> = input
        .iter()
        .filter(|(name, _)| !MAPPED_FIELDS.contains(&name.as_str()))
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect();

    let mut record = RawRecord {
        source,
        row_id,
        title: normalize_text(field(input, "title")),
        author_principal,
        authors,
        categories: normalize_list_field(field(input, "categories")),
        publisher: normalize_text(field(input, "publisher")),
        pub_date,
        language: normalize_language(field(input, "language")),
        price_amount: normalize_price(field(input, "price_amount")),
        price_currency: normalize_currency(field(input, "price_currency")),
        isbn10: normalize_text(field(input, "isbn10")),
        isbn13: normalize_text(field(input, "isbn13")),
        candidate_key: String::new(),
        passthrough,
    };
    record.candidate_key = candidate_key(&record);
    record
}
