//! Condition analyses.

use std::collections::{BTreeMap, BTreeSet};

use polars::prelude::{Column, DataFrame, DataType};
use shape_common::column_keys;
use shape_map::ColumnAliases;
use shape_model::{DerivationStep, SourcedFrame, TranslateOptions, UnmappedPolicy};
use shape_result::registry::{PROPORTION, UPSET};
use shape_result::{Dispatcher, ShapeResult};
use shape_source::{Source, read_part};
use shape_terms::{SectionKey, TaxonomyTable, TermColumn, Translator};
use tracing::info;

use crate::error::{FhirflatError, Result};
use crate::{CONDITION_PART, PATIENT_REFERENCE_PREFIX};

const PRESENCE: &str = "presence_absence";
const CONDITION: &str = "condition";
const SUBJECT: &str = "subject";

/// Default number of conditions in an UpSet result.
pub const DEFAULT_UPSET_CONDITIONS: usize = 5;

/// Read the `condition` part with readable terms.
///
/// Columns: `subject` (without the `Patient/` prefix), `condition`,
/// `presence_absence` (boolean) and `category`. Rows with an unknown or
/// missing presence, or a condition code the taxonomy does not know, are
/// dropped.
pub fn read_condition(source: &Source, taxonomy: &TaxonomyTable) -> Result<SourcedFrame> {
    let mapping = shape_map::ColumnMapping::new()
        .strip_prefix("subject", PATIENT_REFERENCE_PREFIX, SUBJECT)
        .rename("code.code", CONDITION)
        .rename("extension.presenceAbsence.code", PRESENCE)
        .rename("category.code", "category");
    let frame = read_part(source, CONDITION_PART, Some(&mapping))?;

    let frame = Translator::new(taxonomy)
        .with_options(TranslateOptions::new().with_unmapped(UnmappedPolicy::Null))
        .translate_sourced(
            &frame,
            &[
                TermColumn::new(PRESENCE)
                    .in_section(SectionKey::PRESENCE_ABSENCE.as_str())
                    .drop_nulls(),
                TermColumn::new(CONDITION)
                    .in_section(SectionKey::CONDITION.as_str())
                    .drop_nulls(),
            ],
        )?;

    let dtype = frame.data.column(PRESENCE)?.dtype();
    if !matches!(dtype, DataType::Boolean) {
        return Err(FhirflatError::NotAFlagColumn {
            part: CONDITION_PART.to_string(),
            column: PRESENCE.to_string(),
            dtype: dtype.to_string(),
        });
    }
    Ok(frame)
}

/// One `(subject, condition, present)` triple per row with all three set.
fn condition_rows(df: &DataFrame) -> Result<Vec<(String, String, bool)>> {
    let subjects = column_keys(df.column(SUBJECT)?)?;
    let conditions = column_keys(df.column(CONDITION)?)?;
    let presence = df.column(PRESENCE)?.bool()?;

    Ok(subjects
        .into_iter()
        .zip(conditions)
        .zip(presence.into_iter())
        .filter_map(|((subject, condition), present)| Some((subject?, condition?, present?)))
        .collect())
}

/// Share of records marking each condition as present, by condition name.
pub fn condition_proportion(source: &Source, taxonomy: &TaxonomyTable) -> Result<ShapeResult> {
    let condition = read_condition(source, taxonomy)?;

    let mut tallies: BTreeMap<String, (u64, u64)> = BTreeMap::new();
    for (_, name, present) in condition_rows(&condition.data)? {
        let (hits, total) = tallies.entry(name).or_default();
        *total += 1;
        if present {
            *hits += 1;
        }
    }

    let labels: Vec<String> = tallies.keys().cloned().collect();
    let proportions: Vec<f64> = tallies
        .values()
        .map(|(hits, total)| *hits as f64 / *total as f64)
        .collect();
    let df = DataFrame::new(vec![
        Column::new(CONDITION.into(), labels),
        Column::new("proportion".into(), proportions),
    ])?;

    let frame = condition.derive(df, DerivationStep::new("condition_proportion"));
    let aliases = ColumnAliases::new().with("label", CONDITION);
    let result = Dispatcher::default().build(&frame, &[PROPORTION], Some(&aliases))?;
    info!(
        source_id = %source.id(),
        conditions = tallies.len(),
        "built condition proportions"
    );
    Ok(result)
}

/// Presence indicators for the `top_n` most often present conditions.
///
/// One row per subject with a record for any of those conditions, sorted by
/// subject; one boolean column per condition, sorted by name. A subject
/// without a record for a condition gets `false`. Ties in frequency are
/// broken by condition name.
pub fn condition_upset(
    source: &Source,
    taxonomy: &TaxonomyTable,
    top_n: usize,
) -> Result<ShapeResult> {
    let condition = read_condition(source, taxonomy)?;
    let rows = condition_rows(&condition.data)?;

    let mut present_counts: BTreeMap<&str, usize> = BTreeMap::new();
    for (_, name, present) in &rows {
        if *present {
            *present_counts.entry(name.as_str()).or_default() += 1;
        }
    }
    let mut ranked: Vec<(&str, usize)> = present_counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    let top: BTreeSet<&str> = ranked.into_iter().take(top_n).map(|(name, _)| name).collect();

    let mut by_subject: BTreeMap<&str, BTreeMap<&str, bool>> = BTreeMap::new();
    for (subject, name, present) in &rows {
        if top.contains(name.as_str()) {
            let flags = by_subject.entry(subject.as_str()).or_default();
            let flag = flags.entry(name.as_str()).or_default();
            *flag |= *present;
        }
    }

    let mut columns = Vec::with_capacity(top.len() + 1);
    columns.push(Column::new(
        SUBJECT.into(),
        by_subject.keys().copied().collect::<Vec<_>>(),
    ));
    for name in &top {
        let flags: Vec<bool> = by_subject
            .values()
            .map(|flags| flags.get(name).copied().unwrap_or(false))
            .collect();
        columns.push(Column::new((*name).into(), flags));
    }
    let df = DataFrame::new(columns)?;

    let frame = condition.derive(
        df,
        DerivationStep::new("condition_upset").with_detail(top_n.to_string()),
    );
    let result = Dispatcher::default()
        .build(&frame, &[UPSET], None)?
        .with_title("Condition UpSet plot");
    info!(
        source_id = %source.id(),
        conditions = top.len(),
        subjects = by_subject.len(),
        "built condition upset"
    );
    Ok(result)
}
