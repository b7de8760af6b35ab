//! Applying column mappings to dataframes.
//!
//! Every entry is resolved against the input before any output is built, so
//! a failing entry leaves no partially mapped frame behind. Output column
//! order is mapped targets first (in mapping order), then the unreferenced
//! input columns in their original order unless the mapping is exclusive.

use std::collections::BTreeSet;

use polars::prelude::{Column, DataFrame, DataType, NamedFrom, Series};
use shape_model::{DerivationStep, SourcedFrame};
use tracing::debug;

use crate::error::{MapError, Result};
use crate::mapping::{ColumnAliases, ColumnMapping, ColumnSource, MappingEntry};

/// Produce a new frame with columns renamed and derived per `mapping`.
///
/// The input frame is never modified.
pub fn map_columns(df: &DataFrame, mapping: &ColumnMapping) -> Result<DataFrame> {
    let mut resolved: Vec<Column> = Vec::with_capacity(mapping.entries.len());
    let mut consumed: BTreeSet<String> = BTreeSet::new();

    for entry in &mapping.entries {
        let column = resolve_entry(df, entry, &mut consumed)?;
        // Last entry wins, first position is kept.
        match resolved
            .iter_mut()
            .find(|existing| existing.name().as_str() == entry.target)
        {
            Some(slot) => *slot = column,
            None => resolved.push(column),
        }
    }

    let targets: BTreeSet<String> = resolved.iter().map(|c| c.name().to_string()).collect();
    let mut columns = resolved;
    if !mapping.exclusive {
        for column in df.get_columns() {
            let name = column.name().as_str();
            if consumed.contains(name) || targets.contains(name) {
                continue;
            }
            columns.push(column.clone());
        }
    }

    debug!(
        mapped = targets.len(),
        output_columns = columns.len(),
        exclusive = mapping.exclusive,
        "mapped columns"
    );
    Ok(DataFrame::new(columns)?)
}

/// [`map_columns`] on a sourced frame, keeping its provenance.
pub fn map_sourced(frame: &SourcedFrame, mapping: &ColumnMapping) -> Result<SourcedFrame> {
    let data = map_columns(&frame.data, mapping)?;
    let step = DerivationStep::new("map_columns").with_detail(mapping.targets().join(","));
    Ok(frame.derive(data, step))
}

/// Check that every required column is present, directly or through an alias.
///
/// All missing columns are reported at once.
pub fn require_columns(df: &DataFrame, required: &[&str], aliases: &ColumnAliases) -> Result<()> {
    let missing: Vec<String> = required
        .iter()
        .map(|name| aliases.resolve(name))
        .filter(|actual| df.column(actual).is_err())
        .map(str::to_string)
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(MapError::MissingColumns { columns: missing })
    }
}

fn resolve_entry(
    df: &DataFrame,
    entry: &MappingEntry,
    consumed: &mut BTreeSet<String>,
) -> Result<Column> {
    if entry.target.trim().is_empty() {
        return Err(MapError::EmptyTarget {
            source_desc: entry.source.describe(),
        });
    }
    let target = entry.target.as_str();
    match &entry.source {
        ColumnSource::Path(path) => {
            let column = resolve_path(df, path, consumed)?;
            Ok(column.with_name(target.into()))
        }
        ColumnSource::Constant(value) => Ok(Column::new(
            target.into(),
            vec![value.as_str(); df.height()],
        )),
        ColumnSource::StripPrefix { path, prefix } => {
            let column = resolve_path(df, path, consumed)?;
            strip_prefix(&column, path, prefix, target)
        }
    }
}

/// Find `path` as a flat column name, else descend through struct fields.
fn resolve_path(df: &DataFrame, path: &str, consumed: &mut BTreeSet<String>) -> Result<Column> {
    if let Ok(column) = df.column(path) {
        consumed.insert(path.to_string());
        return Ok(column.clone());
    }

    let segments: Vec<&str> = path.split('.').collect();
    // Prefer the longest root name, since flat names may themselves contain dots.
    // A root that is not a struct cannot hold the path; shorter roots are tried.
    for split in (1..segments.len()).rev() {
        let root = segments[..split].join(".");
        let Ok(column) = df.column(&root) else {
            continue;
        };
        if let Some(series) = descend(column.as_materialized_series(), &segments[split..]) {
            return Ok(Column::from(series));
        }
    }

    Err(MapError::MissingColumn {
        path: path.to_string(),
    })
}

/// Follow `fields` through nested struct columns.
fn descend(root: &Series, fields: &[&str]) -> Option<Series> {
    let mut series = root.clone();
    for field in fields {
        if !matches!(series.dtype(), DataType::Struct(_)) {
            return None;
        }
        series = series.struct_().ok()?.field_by_name(field).ok()?;
    }
    Some(series)
}

fn strip_prefix(column: &Column, path: &str, prefix: &str, target: &str) -> Result<Column> {
    let values = column.str().map_err(|_| MapError::NotAString {
        path: path.to_string(),
        dtype: column.dtype().to_string(),
    })?;
    let stripped: Vec<Option<String>> = values
        .into_iter()
        .map(|value| value.map(|v| v.strip_prefix(prefix).unwrap_or(v).to_string()))
        .collect();
    Ok(Series::new(target.into(), stripped).into())
}
