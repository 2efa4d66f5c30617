//! Pipeline configuration
//!
//! Passed explicitly to [`crate::pipeline::integrate`]; nothing is read from
//! process-wide state.

use crate::error::{Error, Result};
use crate::quality::QualityConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Locations and settings for one integration run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// JSON array of scraped records
    pub goodreads_path: PathBuf,
    /// Delimited CSV of API-enriched records
    pub googlebooks_path: PathBuf,
    /// Field delimiter of the Google Books CSV
    pub googlebooks_delimiter: char,
    /// Root directory for `standard/` and `docs/` outputs
    pub output_dir: PathBuf,
    pub quality: QualityConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            goodreads_path: PathBuf::from("landing/goodreads_books.json"),
            googlebooks_path: PathBuf::from("landing/googlebooks_books.csv"),
            googlebooks_delimiter: ';',
            output_dir: PathBuf::from("."),
            quality: QualityConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Load a config file from JSON; missing keys take their defaults
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| Error::FileRead {
            path: path.as_ref().to_path_buf(),
            source: e,
        })?;
        serde_json::from_str(&content).map_err(Error::Json)
    }

    /// Save the config to JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// The Google Books delimiter as a CSV byte
    pub fn delimiter_byte(&self) -> Result<u8> {
        u8::try_from(self.googlebooks_delimiter)
            .ok()
            .filter(u8::is_ascii)
            .ok_or_else(|| Error::InvalidInput {
                path: self.googlebooks_path.clone(),
                message: format!("delimiter '{}' is not a single ASCII character", self.googlebooks_delimiter),
            })
    }

    pub fn dim_book_csv_path(&self) -> PathBuf {
        self.output_dir.join("standard").join("dim_book.csv")
    }

    pub fn dim_book_json_path(&self) -> PathBuf {
        self.output_dir.join("standard").join("dim_book.json")
    }

    pub fn detail_csv_path(&self) -> PathBuf {
        self.output_dir.join("standard").join("book_source_detail.csv")
    }

    pub fn quality_json_path(&self) -> PathBuf {
        self.output_dir.join("docs").join("quality_metrics.json")
    }

    pub fn schema_md_path(&self) -> PathBuf {
        self.output_dir.join("docs").join("schema.md")
    }
}
