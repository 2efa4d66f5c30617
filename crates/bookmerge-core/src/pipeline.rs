//! End-to-end integration run
//!
//! [`run`] is the pure engine: given both inputs and a timestamp it always
//! produces the same output. [`integrate`] adds file I/O around it and is
//! the only place that reads the clock.

use crate::config::PipelineConfig;
use crate::error::{Error, Result};
use crate::export::write_outputs;
use crate::grouping::group_records;
use crate::ingest::{read_goodreads_json, read_googlebooks_csv};
use crate::normalize::{normalize, InputRow};
use crate::quality::{QualityConfig, QualityReport};
use crate::record::{DetailRecord, RawRecord, Source};
use crate::resolver::{resolve_groups, CanonicalBook, ResolvedBook};
use crate::table::Table;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{info, warn};

/// Raw rows of both catalogs, before normalization
#[derive(Debug, Clone, Default)]
pub struct SourceInputs {
    pub goodreads: Vec<InputRow>,
    pub googlebooks: Vec<InputRow>,
}

impl SourceInputs {
    /// Read both source files; a missing file aborts the run
    pub fn load(config: &PipelineConfig) -> Result<Self> {
        Ok(Self {
            goodreads: read_goodreads_json(&config.goodreads_path)?,
            googlebooks: read_googlebooks_csv(&config.googlebooks_path, config.delimiter_byte()?)?,
        })
    }
}

/// Everything one run produces
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegrationOutput {
    pub run_at: DateTime<Utc>,
    /// One entry per canonical book, with provenance
    pub resolved: Vec<ResolvedBook>,
    /// One entry per input row, pre-merge
    pub detail: Vec<DetailRecord>,
    pub quality: QualityReport,
}

impl IntegrationOutput {
    pub fn canonical(&self) -> impl Iterator<Item = &CanonicalBook> {
        self.resolved.iter().map(|r| &r.book)
    }

    pub fn find_book(&self, book_id: &str) -> Option<&ResolvedBook> {
        self.resolved.iter().find(|r| r.book.book_id == book_id)
    }

    /// Like [`find_book`](Self::find_book), but an unknown id is an error
    pub fn require_book(&self, book_id: &str) -> Result<&ResolvedBook> {
        self.find_book(book_id)
            .ok_or_else(|| Error::UnknownBook(book_id.to_string()))
    }

    pub fn canonical_table(&self) -> Table {
        let books: Vec<CanonicalBook> = self.canonical().cloned().collect();
        Table::from_canonical(&books)
    }

    pub fn detail_table(&self) -> Table {
        Table::from_detail(&self.detail)
    }
}

/// Normalize both sources into the unified record list
///
/// Goodreads rows come first, then Google Books; row ids are 1-based per
/// source.
pub fn unify(inputs: &SourceInputs) -> Vec<RawRecord> {
    let sources = [
        (Source::Goodreads, &inputs.goodreads),
        (Source::GoogleBooks, &inputs.googlebooks),
    ];
    sources
        .into_iter()
        .flat_map(|(source, rows)| {
            rows.iter()
                .enumerate()
                .map(move |(i, row)| normalize(source, i + 1, row))
        })
        .collect()
}

/// Run the merge engine over in-memory inputs
pub fn run(inputs: &SourceInputs, quality: &QualityConfig, run_at: DateTime<Utc>) -> Result<IntegrationOutput> {
    let records = unify(inputs);
    let groups = group_records(&records);
    let resolved = resolve_groups(&groups, run_at)?;

    let detail: Vec<DetailRecord> = records
        .iter()
        .map(|record| DetailRecord {
            record: record.clone(),
            timestamp_ingesta: run_at,
        })
        .collect();

    let books: Vec<CanonicalBook> = resolved.iter().map(|r| r.book.clone()).collect();
    let canonical_table = Table::from_canonical(&books);
    let detail_table = Table::from_detail(&detail);
    let quality = QualityReport::compute(&records, &detail_table, &canonical_table, quality);

    // Both counts come from the same candidate keys and must agree.
    if groups.duplicate_count() != quality.duplicate_candidates {
        warn!(
            grouped = groups.duplicate_count(),
            reported = quality.duplicate_candidates,
            "duplicate counts disagree"
        );
    }

    info!(
        records = records.len(),
        books = resolved.len(),
        duplicates = quality.duplicate_candidates,
        "integration complete"
    );

    Ok(IntegrationOutput {
        run_at,
        resolved,
        detail,
        quality,
    })
}

/// Load inputs, run the engine once and write every output
pub fn integrate(config: &PipelineConfig) -> Result<(IntegrationOutput, Vec<PathBuf>)> {
    info!(
        goodreads = %config.goodreads_path.display(),
        googlebooks = %config.googlebooks_path.display(),
        "starting integration"
    );
    let inputs = SourceInputs::load(config)?;
    let output = run(&inputs, &config.quality, Utc::now())?;
    let written = write_outputs(&output, config)?;
    Ok((output, written))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::{parse_csv_str, parse_json_str};
    use chrono::TimeZone;
    use std::collections::HashSet;
    use std::fs;
    use tempfile::tempdir;

    const GOODREADS: &str = r#"[
        {"title": "Python for Data Analysis", "author": "Wes McKinney", "isbn13": "9781491957660", "isbn10": "1491957662", "rating": 4.1},
        {"title": "Deep Learning", "author": "Ian Goodfellow", "isbn13": null, "publisher": "MIT Press"},
        {"title": "Storytelling", "author": "Cole Knaflic", "isbn13": "978-1-119-00225-3"}
    ]"#;

    const GOOGLEBOOKS: &str = "\
title;author_principal;authors;publisher;pub_date;language;categories;isbn13;isbn10;price_amount;price_currency
Python for Data Analysis: Data Wrangling;Wes McKinney;Wes McKinney;O'Reilly;2017-10;EN;Computers|Data;9781491957660 ;;39.99;usd
Deep  Learning;Ian  Goodfellow;Ian Goodfellow, Yoshua Bengio;MIT Press;2016;en;Computers;;;;
Storytelling with Data;Cole Knaflic;Cole Knaflic;Wiley;2015-11-02;en;Business;9781119002253;;25;EUR
";

    fn inputs() -> SourceInputs {
        SourceInputs {
            goodreads: parse_json_str(GOODREADS, "goodreads.json").unwrap(),
            googlebooks: parse_csv_str(GOOGLEBOOKS, b';', "googlebooks.csv").unwrap(),
        }
    }

    fn run_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 8, 30, 0).unwrap()
    }

    #[test]
    fn test_unify_orders_sources_and_row_ids() {
        let records = unify(&inputs());
        let refs: Vec<_> = records.iter().map(|r| (r.source, r.row_id)).collect();
        assert_eq!(
            refs,
            vec![
                (Source::Goodreads, 1),
                (Source::Goodreads, 2),
                (Source::Goodreads, 3),
                (Source::GoogleBooks, 1),
                (Source::GoogleBooks, 2),
                (Source::GoogleBooks, 3),
            ]
        );
    }

    #[test]
    fn test_run_merges_matching_records() {
        let output = run(&inputs(), &QualityConfig::default(), run_at()).unwrap();

        // Python (isbn, trimmed) and Deep Learning (composite key) merge;
        // the hyphenated Storytelling isbn stays apart from the plain one.
        assert_eq!(output.resolved.len(), 4);
        assert_eq!(output.detail.len(), 6);

        let python = output.find_book("9781491957660").unwrap();
        assert_eq!(python.book.title.as_deref(), Some("Python for Data Analysis: Data Wrangling"));
        assert_eq!(python.book.author_principal.as_deref(), Some("Wes McKinney"));
        assert_eq!(python.book.editorial.as_deref(), Some("O'Reilly"));
        assert_eq!(python.book.year, Some(2017));
        assert_eq!(python.book.language.as_deref(), Some("en"));
        assert_eq!(python.book.price_amount, Some(39.99));
        assert_eq!(python.book.price_currency.as_deref(), Some("USD"));
        assert_eq!(python.book.isbn10.as_deref(), Some("1491957662"));
        assert!(python.book.isbn13_valid);
        assert_eq!(python.book.winning_source, Source::Goodreads);
        assert_eq!(python.members.len(), 2);

        let deep = output
            .find_book("deep_learning_ian_goodfellow_mit_press")
            .unwrap();
        assert_eq!(deep.book.authors.clone().into_vec(), vec!["Ian Goodfellow", "Yoshua Bengio"]);
        assert_eq!(deep.book.title.as_deref(), Some("Deep  Learning"));
        assert_eq!(deep.book.pub_date.as_deref(), Some("2016-01-01"));

        assert!(output.find_book("978-1-119-00225-3").is_some());
        assert!(output.find_book("9781119002253").is_some());
    }

    #[test]
    fn test_require_book_rejects_unknown_id() {
        let output = run(&inputs(), &QualityConfig::default(), run_at()).unwrap();
        assert!(output.require_book("9781491957660").is_ok());

        let err = output.require_book("no-such-book").unwrap_err();
        assert!(matches!(err, Error::UnknownBook(ref id) if id == "no-such-book"));
    }

    #[test]
    fn test_book_ids_unique_and_match_group_keys() {
        let output = run(&inputs(), &QualityConfig::default(), run_at()).unwrap();
        let ids: HashSet<_> = output.canonical().map(|b| b.book_id.as_str()).collect();
        assert_eq!(ids.len(), output.resolved.len());

        for resolved in &output.resolved {
            for member in &resolved.members {
                let detail = output
                    .detail
                    .iter()
                    .find(|d| d.record.reference() == *member)
                    .unwrap();
                assert_eq!(detail.record.candidate_key, resolved.book.book_id);
            }
        }
    }

    #[test]
    fn test_run_is_deterministic_apart_from_timestamp() {
        let first = run(&inputs(), &QualityConfig::default(), run_at()).unwrap();
        let later = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let mut second = run(&inputs(), &QualityConfig::default(), later).unwrap();

        assert!(second.canonical().all(|b| b.last_updated == later));
        assert!(second.detail.iter().all(|d| d.timestamp_ingesta == later));

        second.run_at = first.run_at;
        for resolved in &mut second.resolved {
            resolved.book.last_updated = first.run_at;
        }
        for detail in &mut second.detail {
            detail.timestamp_ingesta = first.run_at;
        }
        assert_eq!(first, second);
    }

    #[test]
    fn test_quality_report() {
        let output = run(&inputs(), &QualityConfig::default(), run_at()).unwrap();
        let quality = &output.quality;

        assert_eq!(quality.goodreads_rows, 3);
        assert_eq!(quality.googlebooks_rows, 3);
        assert_eq!(quality.canonical_rows, 4);
        assert_eq!(quality.duplicate_candidates, 2);
        assert_eq!(group_records(&unify(&inputs())).duplicate_count(), 2);
        assert!(quality.price_in_range);
        assert_eq!(quality.null_percentage_of("titulo"), Some(0.0));
        assert_eq!(quality.null_percentage_of("isbn13"), Some(0.25));
        assert_eq!(quality.rows_per_source.get("googlebooks"), Some(&3));
    }

    #[test]
    fn test_detail_table_keeps_passthrough() {
        let output = run(&inputs(), &QualityConfig::default(), run_at()).unwrap();
        let table = output.detail_table();
        assert_eq!(table.row_count(), 6);
        assert!(table.find_column("rating").is_some());
        assert!(table.find_column("book_id_candidato").is_some());
    }

    #[test]
    fn test_empty_inputs() {
        let output = run(&SourceInputs::default(), &QualityConfig::default(), run_at()).unwrap();
        assert!(output.resolved.is_empty());
        assert_eq!(output.quality.canonical_rows, 0);
        assert!(output.quality.price_in_range);
    }

    #[test]
    fn test_integrate_writes_every_output() {
        let dir = tempdir().unwrap();
        let config = PipelineConfig {
            goodreads_path: dir.path().join("goodreads_books.json"),
            googlebooks_path: dir.path().join("googlebooks_books.csv"),
            output_dir: dir.path().join("out"),
            ..PipelineConfig::default()
        };
        fs::write(&config.goodreads_path, GOODREADS).unwrap();
        fs::write(&config.googlebooks_path, GOOGLEBOOKS).unwrap();

        let (output, written) = integrate(&config).unwrap();
        assert_eq!(written.len(), 5);
        assert!(config.schema_md_path().exists());

        let quality: serde_json::Value =
            serde_json::from_slice(&fs::read(config.quality_json_path()).unwrap()).unwrap();
        assert_eq!(quality["libros_finales_dim"], output.resolved.len());
    }

    #[test]
    fn test_integrate_missing_input_writes_nothing() {
        let dir = tempdir().unwrap();
        let config = PipelineConfig {
            goodreads_path: dir.path().join("missing.json"),
            googlebooks_path: dir.path().join("missing.csv"),
            output_dir: dir.path().join("out"),
            ..PipelineConfig::default()
        };

        let err = integrate(&config).unwrap_err();
        assert!(matches!(err, Error::MissingInput { .. }));
        assert!(!config.output_dir.exists());
    }
}
