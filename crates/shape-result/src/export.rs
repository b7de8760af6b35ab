//! Writing results to disk.
//!
//! A result is exported as one CSV file per shape binding plus a
//! `result.json` manifest holding provenance, lineage and hints.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use polars::prelude::{CsvWriter, SerWriter};
use serde::{Deserialize, Serialize};
use shape_model::DerivationStep;
use tracing::info;

use crate::error::{Result, ShapeError};
use crate::result::{RenderHints, ResultProvenance, ShapeBinding, ShapeResult, SkippedShape};

/// File name of the manifest written next to the shape files.
pub const RESULT_MANIFEST: &str = "result.json";

/// One exported shape file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestShape {
    pub shape: String,
    pub file: String,
    pub rows: usize,
    pub columns: Vec<String>,
}

/// Contents of `result.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultManifest {
    pub registry_version: u32,
    pub created_at: DateTime<Utc>,
    pub provenance: ResultProvenance,
    pub shapes: Vec<ManifestShape>,
    #[serde(default)]
    pub lineage: Vec<DerivationStep>,
    #[serde(default)]
    pub skipped: Vec<SkippedShape>,
    #[serde(default)]
    pub hints: RenderHints,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
}

impl ResultManifest {
    pub fn for_result(result: &ShapeResult) -> Self {
        let shapes = result
            .bindings()
            .iter()
            .map(|binding| ManifestShape {
                shape: binding.shape.clone(),
                file: csv_file_name(&binding.shape),
                rows: binding.data.height(),
                columns: binding
                    .data
                    .get_column_names()
                    .iter()
                    .map(|name| name.to_string())
                    .collect(),
            })
            .collect();
        Self {
            registry_version: result.registry_version(),
            created_at: result.created_at(),
            provenance: result.provenance().clone(),
            shapes,
            lineage: result.lineage().to_vec(),
            skipped: result.skipped().to_vec(),
            hints: result.hints().clone(),
            payload: result.payload().cloned(),
        }
    }

    /// Read a manifest written by [`export_result`].
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| export_error(path, &e))?;
        serde_json::from_str(&content).map_err(|e| export_error(path, &e))
    }
}

fn csv_file_name(shape: &str) -> String {
    format!("{shape}.csv")
}

fn export_error(path: &Path, err: &dyn std::fmt::Display) -> ShapeError {
    ShapeError::Export {
        path: path.to_path_buf(),
        message: err.to_string(),
    }
}

/// Write one binding as CSV with a header row.
pub fn write_csv(binding: &ShapeBinding, path: &Path) -> Result<()> {
    let mut file = File::create(path).map_err(|e| export_error(path, &e))?;
    let mut df = binding.data.clone();
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(&mut df)
        .map_err(|e| export_error(path, &e))
}

/// Export every binding of `result` into `dir`, creating it if needed.
///
/// Returns the path of the written manifest.
pub fn export_result(result: &ShapeResult, dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(dir).map_err(|e| export_error(dir, &e))?;

    for binding in result.bindings() {
        write_csv(binding, &dir.join(csv_file_name(&binding.shape)))?;
    }

    let manifest = ResultManifest::for_result(result);
    let path = dir.join(RESULT_MANIFEST);
    let json = serde_json::to_string_pretty(&manifest).map_err(|e| export_error(&path, &e))?;
    fs::write(&path, json).map_err(|e| export_error(&path, &e))?;

    let files: BTreeMap<&str, usize> = manifest
        .shapes
        .iter()
        .map(|s| (s.shape.as_str(), s.rows))
        .collect();
    info!(dir = %dir.display(), shapes = ?files, "exported result");
    Ok(path)
}
