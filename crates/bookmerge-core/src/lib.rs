//! bookmerge-core: Core library for merging bibliographic records from two catalogs
//!
//! This library provides functionality to:
//! - Read the Goodreads (JSON) and Google Books (CSV) exports
//! - Normalize heterogeneous fields into typed records
//! - Group records that describe the same book by candidate key
//! - Resolve each group into one canonical book with field provenance
//! - Validate ISBN checksums and compute data-quality metrics
//! - Write the canonical and detail tables without partial outputs

pub mod config;
pub mod error;
pub mod export;
pub mod grouping;
pub mod ingest;
pub mod isbn;
pub mod key;
pub mod normalize;
pub mod pipeline;
pub mod quality;
pub mod record;
pub mod resolver;
pub mod schema;
pub mod table;
pub mod unique;

pub use config::PipelineConfig;
pub use error::{Error, Result};
pub use export::write_outputs;
pub use grouping::{group_records, Group, Groups};
pub use isbn::{is_valid_isbn10, is_valid_isbn13, validate_isbn};
pub use key::candidate_key;
pub use normalize::{normalize, InputRow};
pub use pipeline::{integrate, run, IntegrationOutput, SourceInputs};
pub use quality::{QualityConfig, QualityReport};
pub use record::{DetailRecord, RawRecord, RecordRef, Source};
pub use resolver::{resolve_group, CanonicalBook, Provenance, ResolvedBook};
pub use schema::schema_markdown;
pub use table::{CellValue, Column, Row, Table};
pub use unique::UniqueList;
