//! Data-quality metrics over the unified and canonical tables
//!
//! Metrics address columns by name. A missing column is never an error;
//! it shows up in the metric value instead.

use crate::record::{RawRecord, Source};
use crate::table::{CellValue, Table};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use tracing::warn;

/// Which metrics to compute and with which bounds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityConfig {
    /// Canonical columns reported as `pct_nulos_<column>`
    pub null_columns: Vec<String>,
    /// Inclusive lower bound for `precio`
    pub price_min: Option<f64>,
    /// Inclusive upper bound for `precio`
    pub price_max: Option<f64>,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            null_columns: vec!["titulo".to_string(), "isbn13".to_string(), "precio".to_string()],
            price_min: Some(0.0),
            price_max: None,
        }
    }
}

/// Metrics computed once per run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityReport {
    #[serde(rename = "registros_goodreads")]
    pub goodreads_rows: usize,
    #[serde(rename = "registros_googlebooks")]
    pub googlebooks_rows: usize,
    #[serde(rename = "libros_finales_dim")]
    pub canonical_rows: usize,
    /// `pct_nulos_<column>` -> fraction in [0, 1]
    #[serde(flatten)]
    pub null_percentages: BTreeMap<String, f64>,
    #[serde(rename = "duplicados_por_book_id_candidato")]
    pub duplicate_candidates: usize,
    #[serde(rename = "precio_valido_rango")]
    pub price_in_range: bool,
    #[serde(rename = "filas_por_fuente")]
    pub rows_per_source: BTreeMap<String, usize>,
}

impl QualityReport {
    /// Compute the report for one run
    pub fn compute(
        records: &[RawRecord],
        detail: &Table,
        canonical: &Table,
        config: &QualityConfig,
    ) -> Self {
        let rows_per_source = rows_per_source(records);
        let count = |source: Source| rows_per_source.get(source.as_str()).copied().unwrap_or(0);

        let null_percentages = config
            .null_columns
            .iter()
            .map(|column| (format!("pct_nulos_{}", column), null_percentage(canonical, column)))
            .collect();

        Self {
            goodreads_rows: count(Source::Goodreads),
            googlebooks_rows: count(Source::GoogleBooks),
            canonical_rows: canonical.row_count(),
            null_percentages,
            duplicate_candidates: duplicate_count(detail, &["book_id_candidato"]),
            price_in_range: check_numeric_range(canonical, "precio", config.price_min, config.price_max),
            rows_per_source,
        }
    }

    /// Null fraction of a canonical column, if it was configured
    pub fn null_percentage_of(&self, column: &str) -> Option<f64> {
        self.null_percentages.get(&format!("pct_nulos_{}", column)).copied()
    }
}

/// Fraction of rows whose cell in `column` is null
///
/// An absent column counts as entirely null. A zero-row table reports 0.
pub fn null_percentage(table: &Table, column: &str) -> f64 {
    let Some(values) = table.column_values(column) else {
        return 1.0;
    };
    if table.row_count() == 0 {
        return 0.0;
    }
    let nulls = values.filter(|v| v.is_empty()).count();
    nulls as f64 / table.row_count() as f64
}

/// Number of distinct non-null values in a column (0 if absent)
pub fn unique_values(table: &Table, column: &str) -> usize {
    let Some(values) = table.column_values(column) else {
        return 0;
    };
    values
        .filter(|v| !v.is_empty())
        .map(cell_key)
        .collect::<HashSet<_>>()
        .len()
}

/// Rows beyond the first that repeat the same values over `columns`
///
/// Nulls compare equal to each other.
pub fn duplicate_count(table: &Table, columns: &[&str]) -> usize {
    let mut indexes = Vec::with_capacity(columns.len());
    for name in columns {
        match table.find_column(name) {
            Some(column) => indexes.push(column.index),
            None => {
                warn!(table = %table.name, column = %name, "duplicate check on missing column");
                return 0;
            }
        }
    }

    let mut seen: HashSet<Vec<Option<String>>> = HashSet::new();
    table
        .rows
        .iter()
        .filter(|row| {
            let key: Vec<Option<String>> = indexes
                .iter()
                .map(|&i| row.get(i).filter(|v| !v.is_empty()).map(cell_key))
                .collect();
            !seen.insert(key)
        })
        .count()
}

/// True iff every non-null value lies within the inclusive bounds
///
/// Vacuously true for a column with no values, false for an absent column
/// and for non-numeric values.
pub fn check_numeric_range(table: &Table, column: &str, min: Option<f64>, max: Option<f64>) -> bool {
    let Some(values) = table.column_values(column) else {
        return false;
    };
    values.filter(|v| !v.is_empty()).all(|v| match v.as_f64() {
        Some(n) => min.map_or(true, |lo| n >= lo) && max.map_or(true, |hi| n <= hi),
        None => false,
    })
}

/// Whether each required column exists
pub fn required_columns(table: &Table, columns: &[&str]) -> BTreeMap<String, bool> {
    columns
        .iter()
        .map(|name| (name.to_string(), table.find_column(name).is_some()))
        .collect()
}

/// Row count per source tag; every source is listed, even when empty
pub fn rows_per_source(records: &[RawRecord]) -> BTreeMap<String, usize> {
    let mut counts: BTreeMap<String, usize> = Source::all().iter().map(|s| (s.to_string(), 0)).collect();
    for record in records {
        *counts.entry(record.source.to_string()).or_insert(0) += 1;
    }
    counts
}

fn cell_key(value: &CellValue) -> String {
    match value {
        CellValue::List(items) => format!("{:?}", items),
        other => other.to_string(),
    }
}
