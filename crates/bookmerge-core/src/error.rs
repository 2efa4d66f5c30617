//! Error types for bookmerge-core

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in bookmerge-core
///
/// Malformed field values never show up here: normalizers absorb them as
/// nulls. Only missing inputs, unreadable files and broken internal
/// invariants abort a run.
#[derive(Debug, Error)]
pub enum Error {
    /// A required source file does not exist
    #[error("required input '{path}' not found")]
    MissingInput { path: PathBuf },

    /// Failed to read a file
    #[error("failed to read file '{path}': {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Input file has an unusable shape
    #[error("invalid input '{path}': {message}")]
    InvalidInput { path: PathBuf, message: String },

    /// CSV parsing error from the csv crate
    #[error("CSV error in '{path}': {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// A group reached the resolver without members
    #[error("group '{0}' has no records")]
    EmptyGroup(String),

    /// Two canonical books ended up with the same identifier
    #[error("duplicate book_id '{0}' in canonical table")]
    DuplicateBookId(String),

    /// No canonical book carries the requested identifier
    #[error("no canonical book with book_id '{0}'")]
    UnknownBook(String),

    /// Failed to write an output file
    #[error("failed to write '{path}': {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
