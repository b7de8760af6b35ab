//! Reading per-resource parts of a verified source.
//!
//! A directory source holds one file per resource (`patient.csv`,
//! `encounter.parquet`, ...). File and in-memory sources expose a single part
//! named after the source.

use std::fs::File;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use polars::prelude::{CsvReadOptions, DataFrame, ParquetReader, SerReader};
use shape_map::{ColumnMapping, map_sourced};
use shape_model::{DerivationStep, SourcedFrame};
use tracing::debug;

use crate::error::{Result, SourceError};
use crate::loader::{Source, SourceKind};

/// Recognized part file extensions, in lookup order.
pub const PART_EXTENSIONS: [&str; 2] = ["csv", "parquet"];

/// Rows sampled for CSV schema inference.
const INFER_SCHEMA_ROWS: usize = 100;

impl Source {
    /// Path of the file holding `resource`.
    pub fn part_path(&self, resource: &str) -> Result<PathBuf> {
        let missing = || SourceError::PartNotFound {
            path: self.path().map(Path::to_path_buf).unwrap_or_default(),
            part: resource.to_string(),
        };
        match self.kind() {
            SourceKind::Directory => {
                let dir = self.path().ok_or_else(missing)?;
                find_part(dir, resource).ok_or_else(missing)
            }
            SourceKind::File if resource == self.primary_part() => {
                self.path().map(Path::to_path_buf).ok_or_else(missing)
            }
            SourceKind::File | SourceKind::InMemory => Err(missing()),
        }
    }
}

/// Read one part as a dataframe carrying the source's provenance.
///
/// With a mapping, the mapping is applied exclusively: only mapped columns
/// are kept, under their target names.
pub fn read_part(
    source: &Source,
    resource: &str,
    mapping: Option<&ColumnMapping>,
) -> Result<SourcedFrame> {
    let data = match (source.kind(), source.bytes()) {
        (SourceKind::InMemory, Some(bytes)) if resource == source.primary_part() => {
            read_csv_bytes(bytes)?
        }
        _ => read_frame(&source.part_path(resource)?)?,
    };
    debug!(
        source_id = %source.id(),
        part = resource,
        rows = data.height(),
        columns = data.width(),
        "read part"
    );

    let frame = SourcedFrame::from_source(data, source.provenance()).with_step(
        DerivationStep::new("read_part").with_detail(resource),
    );
    match mapping {
        Some(mapping) => {
            let exclusive = ColumnMapping {
                entries: mapping.entries.clone(),
                exclusive: true,
            };
            Ok(map_sourced(&frame, &exclusive)?)
        }
        None => Ok(frame),
    }
}

/// Part names available in `source`, sorted.
pub fn list_parts(source: &Source) -> Result<Vec<String>> {
    let dir = match (source.kind(), source.path()) {
        (SourceKind::Directory, Some(dir)) => dir,
        _ => return Ok(vec![source.primary_part().to_string()]),
    };
    let entries = std::fs::read_dir(dir).map_err(|e| SourceError::io(dir, e))?;
    let mut parts = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| SourceError::io(dir, e))?.path();
        let is_part = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| PART_EXTENSIONS.contains(&ext));
        if !is_part {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            parts.push(stem.to_string());
        }
    }
    parts.sort();
    parts.dedup();
    Ok(parts)
}

pub(crate) fn find_part(dir: &Path, resource: &str) -> Option<PathBuf> {
    PART_EXTENSIONS
        .iter()
        .map(|ext| dir.join(format!("{resource}.{ext}")))
        .find(|path| path.is_file())
}

/// Number of data rows in a part file.
pub(crate) fn count_rows(path: &Path) -> Result<u64> {
    if is_parquet(path) {
        return Ok(read_frame(path)?.height() as u64);
    }
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .map_err(|e| read_error(path, &e))?;
    let mut count = 0u64;
    for record in reader.records() {
        record.map_err(|e| read_error(path, &e))?;
        count += 1;
    }
    Ok(count)
}

fn read_frame(path: &Path) -> Result<DataFrame> {
    if is_parquet(path) {
        let file = File::open(path).map_err(|e| SourceError::io(path, e))?;
        return ParquetReader::new(file)
            .finish()
            .map_err(|e| read_error(path, &e));
    }
    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(INFER_SCHEMA_ROWS))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .map_err(|e| read_error(path, &e))?
        .finish()
        .map_err(|e| read_error(path, &e))
}

fn read_csv_bytes(bytes: &[u8]) -> Result<DataFrame> {
    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(INFER_SCHEMA_ROWS))
        .into_reader_with_file_handle(Cursor::new(bytes.to_vec()))
        .finish()
        .map_err(|e| read_error(Path::new("<memory>"), &e))
}

fn is_parquet(path: &Path) -> bool {
    path.extension().and_then(|ext| ext.to_str()) == Some("parquet")
}

fn read_error(path: &Path, err: &dyn std::fmt::Display) -> SourceError {
    SourceError::Read {
        path: path.to_path_buf(),
        message: err.to_string(),
    }
}
