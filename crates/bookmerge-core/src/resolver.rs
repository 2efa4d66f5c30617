//! Survivorship resolution: one canonical book per group, with provenance
//!
//! Each output field follows a fixed rule over the group's members in
//! group order:
//!
//! - `title`: longest non-null title, first one wins ties
//! - `author_principal`, `language`, `pub_date`, `editorial`: first non-null
//! - `price_amount`, `price_currency`: last non-null
//! - `authors`, `categories`: ordered union
//! - `isbn10`, `isbn13`, `winning_source`: taken from the base record only

use crate::error::{Error, Result};
use crate::grouping::{Group, Groups};
use crate::isbn::validate_isbn;
use crate::record::{run_timestamp, RawRecord, RecordRef, Source};
use crate::unique::UniqueList;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

/// A merged book entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalBook {
    /// The candidate key of the group this book came from
    pub book_id: String,
    #[serde(rename = "titulo")]
    pub title: Option<String>,
    #[serde(rename = "titulo_normalizado")]
    pub title_normalized: Option<String>,
    #[serde(rename = "autor_principal")]
    pub author_principal: Option<String>,
    #[serde(rename = "autores")]
    pub authors: UniqueList,
    pub editorial: Option<String>,
    #[serde(rename = "anio_publicacion")]
    pub year: Option<i32>,
    #[serde(rename = "fecha_publicacion")]
    pub pub_date: Option<String>,
    #[serde(rename = "idioma")]
    pub language: Option<String>,
    pub isbn10: Option<String>,
    pub isbn13: Option<String>,
    #[serde(rename = "isbn13_valido")]
    pub isbn13_valid: bool,
    /// Reserved for a future enrichment pass
    #[serde(rename = "paginas")]
    pub pages: Option<u32>,
    /// Reserved for a future enrichment pass
    #[serde(rename = "formato")]
    pub format: Option<String>,
    #[serde(rename = "categorias")]
    pub categories: UniqueList,
    #[serde(rename = "precio")]
    pub price_amount: Option<f64>,
    #[serde(rename = "moneda")]
    pub price_currency: Option<String>,
    #[serde(rename = "fuente_ganadora")]
    pub winning_source: Source,
    #[serde(rename = "ts_ultima_actualizacion", with = "run_timestamp")]
    pub last_updated: DateTime<Utc>,
}

/// Which input rows supplied each canonical field
///
/// Scalar fields map to a single record, list fields to every record that
/// added at least one value. Fields that resolved to null are absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Provenance {
    pub fields: BTreeMap<String, Vec<RecordRef>>,
}

impl Provenance {
    fn set(&mut self, field: &str, refs: Vec<RecordRef>) {
        if !refs.is_empty() {
            self.fields.insert(field.to_string(), refs);
        }
    }

    fn set_one(&mut self, field: &str, source: Option<RecordRef>) {
        self.set(field, source.into_iter().collect());
    }

    /// Records behind a field, empty if the field is null
    pub fn sources_of(&self, field: &str) -> &[RecordRef] {
        self.fields.get(field).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// A canonical book together with its field provenance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedBook {
    pub book: CanonicalBook,
    pub provenance: Provenance,
    /// Every record of the group, in group order
    pub members: Vec<RecordRef>,
}

fn first_non_null<'a, T: ?Sized>(
    members: &[&'a RawRecord],
    get: impl Fn(&'a RawRecord) -> Option<&'a T>,
) -> Option<(&'a T, RecordRef)> {
    members
        .iter()
        .find_map(|&record| get(record).map(|value| (value, record.reference())))
}

fn last_non_null<'a, T: ?Sized>(
    members: &[&'a RawRecord],
    get: impl Fn(&'a RawRecord) -> Option<&'a T>,
) -> Option<(&'a T, RecordRef)> {
    members
        .iter()
        .rev()
        .find_map(|&record| get(record).map(|value| (value, record.reference())))
}

/// Longest non-null title; the earliest one wins ties
fn longest_title<'a>(members: &[&'a RawRecord]) -> Option<(&'a str, RecordRef)> {
    let mut best: Option<(&'a str, usize, RecordRef)> = None;
    for &record in members {
        if let Some(title) = record.title.as_deref() {
            let len = title.chars().count();
            if best.map_or(true, |(_, best_len, _)| len > best_len) {
                best = Some((title, len, record.reference()));
            }
        }
    }
    best.map(|(title, _, source)| (title, source))
}

fn union_lists<'a>(
    members: &[&'a RawRecord],
    get: impl Fn(&'a RawRecord) -> &'a UniqueList,
) -> (UniqueList, Vec<RecordRef>) {
    let mut merged = UniqueList::new();
    let mut contributors = Vec::new();
    for &record in members {
        let mut added = false;
        for value in get(record).iter() {
            added |= merged.push(value);
        }
        if added {
            contributors.push(record.reference());
        }
    }
    (merged, contributors)
}

/// Reduce one group to its canonical book
pub fn resolve_group(group: &Group<'_>, run_at: DateTime<Utc>) -> Result<ResolvedBook> {
    let members = group.members.as_slice();
    let base = group
        .base()
        .ok_or_else(|| Error::EmptyGroup(group.key.clone()))?;
    let base_ref = base.reference();

    let mut provenance = Provenance::default();

    let title = longest_title(members);
    provenance.set_one("titulo", title.map(|(_, r)| r));
    provenance.set_one("titulo_normalizado", title.map(|(_, r)| r));

    let author_principal = first_non_null(members, |r| r.author_principal.as_deref());
    provenance.set_one("autor_principal", author_principal.map(|(_, r)| r));

    let (authors, author_sources) = union_lists(members, |r| &r.authors);
    provenance.set("autores", author_sources);

    let (categories, category_sources) = union_lists(members, |r| &r.categories);
    provenance.set("categorias", category_sources);

    let price_amount = last_non_null(members, |r| r.price_amount.as_ref());
    provenance.set_one("precio", price_amount.map(|(_, r)| r));

    let price_currency = last_non_null(members, |r| r.price_currency.as_deref());
    provenance.set_one("moneda", price_currency.map(|(_, r)| r));

    let language = first_non_null(members, |r| r.language.as_deref());
    provenance.set_one("idioma", language.map(|(_, r)| r));

    let pub_date = first_non_null(members, |r| r.pub_date.as_deref());
    provenance.set_one("fecha_publicacion", pub_date.map(|(_, r)| r));

    let year = pub_date.and_then(|(date, _)| date.get(..4)?.parse::<i32>().ok());
    if year.is_some() {
        provenance.set_one("anio_publicacion", pub_date.map(|(_, r)| r));
    }

    let editorial = first_non_null(members, |r| r.publisher.as_deref());
    provenance.set_one("editorial", editorial.map(|(_, r)| r));

    // Identity fields stay anchored to the base record.
    if base.isbn10.is_some() {
        provenance.set_one("isbn10", Some(base_ref));
    }
    if base.isbn13.is_some() {
        provenance.set_one("isbn13", Some(base_ref));
    }
    provenance.set_one("isbn13_valido", Some(base_ref));
    provenance.set_one("fuente_ganadora", Some(base_ref));

    let book = CanonicalBook {
        book_id: group.key.clone(),
        title: title.map(|(t, _)| t.to_string()),
        title_normalized: title.map(|(t, _)| t.trim().to_lowercase()),
        author_principal: author_principal.map(|(v, _)| v.to_string()),
        authors,
        editorial: editorial.map(|(v, _)| v.to_string()),
        year,
        pub_date: pub_date.map(|(v, _)| v.to_string()),
        language: language.map(|(v, _)| v.to_string()),
        isbn10: base.isbn10.clone(),
        isbn13: base.isbn13.clone(),
        isbn13_valid: validate_isbn(base.isbn13.as_deref()),
        pages: None,
        format: None,
        categories,
        price_amount: price_amount.map(|(v, _)| *v),
        price_currency: price_currency.map(|(v, _)| v.to_string()),
        winning_source: base.source,
        last_updated: run_at,
    };

    Ok(ResolvedBook {
        book,
        provenance,
        members: members.iter().map(|r| r.reference()).collect(),
    })
}

/// Resolve every group, checking that book ids stay unique
pub fn resolve_groups(groups: &Groups<'_>, run_at: DateTime<Utc>) -> Result<Vec<ResolvedBook>> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut resolved = Vec::with_capacity(groups.groups.len());

    for group in groups.iter() {
        if !seen.insert(group.key.as_str()) {
            return Err(Error::DuplicateBookId(group.key.clone()));
        }
        resolved.push(resolve_group(group, run_at)?);
    }

    debug!(books = resolved.len(), "resolved canonical books");
    Ok(resolved)
}
