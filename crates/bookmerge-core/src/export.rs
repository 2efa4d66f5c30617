//! All-or-nothing writing of run outputs
//!
//! Every file is rendered in memory first, then written next to its final
//! location under a temporary name, then renamed into place. If any write
//! fails the temporaries are removed and no final file is touched.

use crate::config::PipelineConfig;
use crate::error::{Error, Result};
use crate::pipeline::IntegrationOutput;
use crate::schema::schema_markdown;
use crate::table::{CellValue, Table};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// A fully rendered output file waiting to be written
#[derive(Debug, Clone)]
pub struct RenderedFile {
    pub path: PathBuf,
    pub contents: Vec<u8>,
}

/// Render a table as CSV; list cells are joined with ` | `
pub fn table_to_csv(table: &Table) -> Result<Vec<u8>> {
    let path = PathBuf::from(&table.name);
    let csv_err = |e: csv::Error| Error::Csv {
        path: path.clone(),
        source: e,
    };

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(table.columns.iter().map(|c| c.name.as_str()))
        .map_err(csv_err)?;
    for row in &table.rows {
        writer
            .write_record(row.cells.iter().map(CellValue::to_string_value))
            .map_err(csv_err)?;
    }
    writer
        .into_inner()
        .map_err(|e| Error::Io(e.into_error()))
}

/// Render a table as a JSON array of objects keyed by column name
pub fn table_to_json(table: &Table) -> Result<Vec<u8>> {
    let rows: Vec<serde_json::Map<String, serde_json::Value>> = table
        .rows
        .iter()
        .map(|row| {
            table
                .columns
                .iter()
                .map(|column| {
                    let value = row.get(column.index).map_or(serde_json::Value::Null, CellValue::to_json);
                    (column.name.clone(), value)
                })
                .collect()
        })
        .collect();
    Ok(serde_json::to_vec_pretty(&rows)?)
}

/// Render every output of a run to the paths named by `config`
pub fn render_outputs(output: &IntegrationOutput, config: &PipelineConfig) -> Result<Vec<RenderedFile>> {
    let canonical = output.canonical_table();
    let detail = output.detail_table();

    Ok(vec![
        RenderedFile {
            path: config.dim_book_csv_path(),
            contents: table_to_csv(&canonical)?,
        },
        RenderedFile {
            path: config.dim_book_json_path(),
            contents: table_to_json(&canonical)?,
        },
        RenderedFile {
            path: config.detail_csv_path(),
            contents: table_to_csv(&detail)?,
        },
        RenderedFile {
            path: config.quality_json_path(),
            contents: serde_json::to_vec_pretty(&output.quality)?,
        },
        RenderedFile {
            path: config.schema_md_path(),
            contents: schema_markdown().into_bytes(),
        },
    ])
}

fn sibling_with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(suffix);
    path.with_file_name(name)
}

fn staging_path(path: &Path) -> PathBuf {
    sibling_with_suffix(path, ".tmp")
}

fn backup_path(path: &Path) -> PathBuf {
    sibling_with_suffix(path, ".bak")
}

fn write_staged(file: &RenderedFile) -> Result<PathBuf> {
    let write_err = |e: std::io::Error| Error::FileWrite {
        path: file.path.clone(),
        source: e,
    };
    if let Some(parent) = file.path.parent() {
        fs::create_dir_all(parent).map_err(write_err)?;
    }
    let staged = staging_path(&file.path);
    fs::write(&staged, &file.contents).map_err(write_err)?;
    Ok(staged)
}

/// Move one staged file into place, keeping any earlier output as a backup
///
/// Returns the backup path when an earlier file was replaced. On failure the
/// earlier file is back in place.
fn commit_staged(file: &RenderedFile, staged: &Path) -> Result<Option<PathBuf>> {
    let write_err = |e: std::io::Error| Error::FileWrite {
        path: file.path.clone(),
        source: e,
    };

    let backup = match fs::symlink_metadata(&file.path) {
        Ok(meta) if meta.is_dir() => {
            return Err(write_err(std::io::Error::other("output path is a directory")));
        }
        Ok(_) => {
            let backup = backup_path(&file.path);
            fs::rename(&file.path, &backup).map_err(write_err)?;
            Some(backup)
        }
        Err(_) => None,
    };

    if let Err(e) = fs::rename(staged, &file.path) {
        if let Some(backup) = &backup {
            let _ = fs::rename(backup, &file.path);
        }
        return Err(write_err(e));
    }
    Ok(backup)
}

/// Undo committed outputs, newest first, restoring what they replaced
fn roll_back(committed: &[(&Path, Option<PathBuf>)]) {
    for (target, backup) in committed.iter().rev() {
        let _ = fs::remove_file(target);
        if let Some(backup) = backup {
            let _ = fs::rename(backup, target);
        }
    }
}

/// Write rendered files so that either all of them land or none do
///
/// Earlier outputs at the same paths survive a failed run unchanged.
pub fn write_all(files: &[RenderedFile]) -> Result<Vec<PathBuf>> {
    let mut staged = Vec::with_capacity(files.len());
    for file in files {
        match write_staged(file) {
            Ok(path) => staged.push(path),
            Err(e) => {
                for path in &staged {
                    let _ = fs::remove_file(path);
                }
                return Err(e);
            }
        }
    }

    let mut committed: Vec<(&Path, Option<PathBuf>)> = Vec::with_capacity(files.len());
    for (i, (file, tmp)) in files.iter().zip(&staged).enumerate() {
        debug!(path = %file.path.display(), "committing output");
        match commit_staged(file, tmp) {
            Ok(backup) => committed.push((file.path.as_path(), backup)),
            Err(e) => {
                warn!(path = %file.path.display(), "commit failed, rolling back outputs");
                roll_back(&committed);
                for path in &staged[i..] {
                    let _ = fs::remove_file(path);
                }
                return Err(e);
            }
        }
    }

    for backup in committed.iter().filter_map(|(_, backup)| backup.as_ref()) {
        let _ = fs::remove_file(backup);
    }

    Ok(files.iter().map(|f| f.path.clone()).collect())
}

/// Render and write every output of a run
pub fn write_outputs(output: &IntegrationOutput, config: &PipelineConfig) -> Result<Vec<PathBuf>> {
    let files = render_outputs(output, config)?;
    let written = write_all(&files)?;
    info!(files = written.len(), dir = %config.output_dir.display(), "wrote outputs");
    Ok(written)
}
