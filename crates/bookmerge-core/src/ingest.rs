//! Readers for the two source files
//!
//! Goodreads arrives as a JSON array of objects, Google Books as a
//! delimited CSV with a header row. Both become lists of [`InputRow`].

use crate::error::{Error, Result};
use crate::normalize::InputRow;
use serde_json::Value;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::warn;

fn open_required(path: &Path) -> Result<File> {
    if !path.exists() {
        return Err(Error::MissingInput {
            path: path.to_path_buf(),
        });
    }
    File::open(path).map_err(|e| Error::FileRead {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Read the Goodreads JSON export
pub fn read_goodreads_json<P: AsRef<Path>>(path: P) -> Result<Vec<InputRow>> {
    let path = path.as_ref();
    let reader = BufReader::new(open_required(path)?);
    let value: Value = serde_json::from_reader(reader)?;
    rows_from_json(value, path)
}

/// Parse Goodreads JSON from a string (useful for testing)
pub fn parse_json_str(content: &str, source_name: &str) -> Result<Vec<InputRow>> {
    let value: Value = serde_json::from_str(content)?;
    rows_from_json(value, Path::new(source_name))
}

fn rows_from_json(value: Value, path: &Path) -> Result<Vec<InputRow>> {
    let Value::Array(items) = value else {
        return Err(Error::InvalidInput {
            path: path.to_path_buf(),
            message: "expected a JSON array of records".to_string(),
        });
    };

    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| match item {
            Value::Object(map) => Ok(map),
            _ => Err(Error::InvalidInput {
                path: path.to_path_buf(),
                message: format!("record {} is not a JSON object", i + 1),
            }),
        })
        .collect()
}

/// Read the Google Books CSV export
pub fn read_googlebooks_csv<P: AsRef<Path>>(path: P, delimiter: u8) -> Result<Vec<InputRow>> {
    let path = path.as_ref();
    let reader = BufReader::new(open_required(path)?);
    rows_from_csv(reader, delimiter, path)
}

/// Parse Google Books CSV from a string (useful for testing)
pub fn parse_csv_str(content: &str, delimiter: u8, source_name: &str) -> Result<Vec<InputRow>> {
    rows_from_csv(content.as_bytes(), delimiter, Path::new(source_name))
}

fn rows_from_csv<R: std::io::Read>(reader: R, delimiter: u8, path: &Path) -> Result<Vec<InputRow>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .delimiter(delimiter)
        .flexible(true) // Allow varying number of fields
        .from_reader(reader);

    let headers = csv_reader
        .headers()
        .map_err(|e| Error::Csv {
            path: path.to_path_buf(),
            source: e,
        })?
        .clone();

    if headers.iter().all(|h| h.trim().is_empty()) {
        return Err(Error::InvalidInput {
            path: path.to_path_buf(),
            message: "no columns found in CSV".to_string(),
        });
    }

    let mut rows = Vec::new();
    for (row_idx, result) in csv_reader.records().enumerate() {
        let record = result.map_err(|e| Error::Csv {
            path: path.to_path_buf(),
            source: e,
        })?;

        if record.len() > headers.len() {
            warn!(
                row = row_idx + 1,
                path = %path.display(),
                "row has more cells than columns, truncating"
            );
        }

        // Short rows leave their trailing columns null.
        let row: InputRow = headers
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let value = match record.get(i) {
                    Some(cell) if !cell.is_empty() => Value::String(cell.to_string()),
                    _ => Value::Null,
                };
                (name.to_string(), value)
            })
            .collect();
        rows.push(row);
    }

    Ok(rows)
}
