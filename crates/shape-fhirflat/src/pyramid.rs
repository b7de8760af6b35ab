//! Age pyramid by gender and outcome.

use std::collections::{BTreeMap, HashMap};

use polars::prelude::{AnyValue, Column, DataFrame};
use shape_common::{any_to_f64, column_keys, format_numeric};
use shape_map::{ColumnAliases, ColumnMapping};
use shape_model::{DerivationStep, TranslateOptions, UnmappedPolicy};
use shape_result::registry::PYRAMID;
use shape_result::{Dispatcher, ShapeResult};
use shape_source::{Source, read_part};
use shape_terms::{SectionKey, TaxonomyTable, TermColumn, Translator};
use tracing::{debug, info};

use crate::error::{FhirflatError, Result};
use crate::{ENCOUNTER_PART, PATIENT_PART, PATIENT_REFERENCE_PREFIX};

/// UCUM code for ages given in years.
pub const AGE_UNIT_YEARS: &str = "http://unitsofmeasure.org|a";

/// Right-closed age intervals.
///
/// Edges `e0 < e1 < ... < en` define the bins `(e0, e1], (e1, e2], ...`.
/// Bin `(l, r]` is labelled `"{l + 1} - {r}"`.
#[derive(Debug, Clone, PartialEq)]
pub struct AgeBins {
    edges: Vec<f64>,
}

impl Default for AgeBins {
    /// Edges -1, 0, 5, 10, ..., 120.
    fn default() -> Self {
        let mut edges = vec![-1.0];
        edges.extend((0..=24i32).map(|i| f64::from(i * 5)));
        Self { edges }
    }
}

impl AgeBins {
    /// Bins from strictly increasing, finite edges.
    pub fn new(edges: Vec<f64>) -> Result<Self> {
        if edges.len() < 2 {
            return Err(FhirflatError::InvalidBins {
                message: format!("need at least two edges, got {}", edges.len()),
            });
        }
        if let Some(edge) = edges.iter().find(|e| !e.is_finite()) {
            return Err(FhirflatError::InvalidBins {
                message: format!("edge {edge} is not finite"),
            });
        }
        if let Some(pair) = edges.windows(2).find(|w| w[0] >= w[1]) {
            return Err(FhirflatError::InvalidBins {
                message: format!("edges must increase, got {} then {}", pair[0], pair[1]),
            });
        }
        Ok(Self { edges })
    }

    pub fn edges(&self) -> &[f64] {
        &self.edges
    }

    pub fn len(&self) -> usize {
        self.edges.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Index of the bin holding `age`, or `None` outside the edges.
    pub fn bin(&self, age: f64) -> Option<usize> {
        self.edges
            .windows(2)
            .position(|w| age > w[0] && age <= w[1])
    }

    pub fn label(&self, index: usize) -> Option<String> {
        let left = self.edges.get(index)?;
        let right = self.edges.get(index + 1)?;
        Some(format!(
            "{} - {}",
            format_numeric(left + 1.0),
            format_numeric(*right)
        ))
    }
}

/// [`age_pyramid_with_bins`] with the default bins.
pub fn age_pyramid(source: &Source, taxonomy: &TaxonomyTable) -> Result<ShapeResult> {
    age_pyramid_with_bins(source, taxonomy, &AgeBins::default())
}

/// Counts of encounters by gender, age group and outcome.
///
/// Patients are joined to their encounters by subject. Only ages recorded in
/// years and inside the bins, and genders and outcomes the taxonomy knows,
/// are counted. Rows are ordered by count
/// (descending), then gender, age group and outcome.
pub fn age_pyramid_with_bins(
    source: &Source,
    taxonomy: &TaxonomyTable,
    bins: &AgeBins,
) -> Result<ShapeResult> {
    // Unknown genders and outcomes are left out of the counts.
    let translator = Translator::new(taxonomy)
        .with_options(TranslateOptions::new().with_unmapped(UnmappedPolicy::Null));

    let patient_mapping = ColumnMapping::new()
        .rename("extension.birthSex.code", "gender")
        .rename("extension.age.value", "age")
        .rename("extension.age.code", "age_unit")
        .rename("id", "subject");
    let patient = read_part(source, PATIENT_PART, Some(&patient_mapping))?;
    let patient = translator.translate_sourced(
        &patient,
        &[TermColumn::new("gender").in_section(SectionKey::GENDER.as_str())],
    )?;

    let encounter_mapping = ColumnMapping::new()
        .strip_prefix("subject", PATIENT_REFERENCE_PREFIX, "subject")
        .rename("admission.dischargeDisposition.code", "outcome");
    let encounter = read_part(source, ENCOUNTER_PART, Some(&encounter_mapping))?;
    let encounter = translator.translate_sourced(
        &encounter,
        &[TermColumn::new("outcome").in_section(SectionKey::OUTCOME.as_str())],
    )?;

    let mut outcomes: HashMap<String, Vec<String>> = HashMap::new();
    let subjects = column_keys(encounter.data.column("subject")?)?;
    let outcome_values = column_keys(encounter.data.column("outcome")?)?;
    for (subject, outcome) in subjects.into_iter().zip(outcome_values) {
        if let (Some(subject), Some(outcome)) = (subject, outcome) {
            outcomes.entry(subject).or_default().push(outcome);
        }
    }

    let data = &patient.data;
    let subjects = column_keys(data.column("subject")?)?;
    let genders = column_keys(data.column("gender")?)?;
    let units = column_keys(data.column("age_unit")?)?;
    let ages = data.column("age")?;

    let mut counts: BTreeMap<(String, usize, String), i64> = BTreeMap::new();
    let mut skipped = 0usize;
    for idx in 0..data.height() {
        if units[idx].as_deref() != Some(AGE_UNIT_YEARS) {
            skipped += 1;
            continue;
        }
        let age = any_to_f64(ages.get(idx).unwrap_or(AnyValue::Null));
        let (Some(subject), Some(gender), Some(bin)) = (
            subjects[idx].as_deref(),
            genders[idx].as_deref(),
            age.and_then(|a| bins.bin(a)),
        ) else {
            skipped += 1;
            continue;
        };
        for outcome in outcomes.get(subject).into_iter().flatten() {
            *counts
                .entry((gender.to_string(), bin, outcome.clone()))
                .or_default() += 1;
        }
    }
    debug!(patients = data.height(), skipped, "binned patient ages");

    let mut rows: Vec<((String, usize, String), i64)> = counts.into_iter().collect();
    rows.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    let mut gender_col = Vec::with_capacity(rows.len());
    let mut group_col = Vec::with_capacity(rows.len());
    let mut outcome_col = Vec::with_capacity(rows.len());
    let mut count_col = Vec::with_capacity(rows.len());
    for ((gender, bin, outcome), count) in rows {
        gender_col.push(gender);
        group_col.push(bins.label(bin).unwrap_or_default());
        outcome_col.push(outcome);
        count_col.push(count);
    }
    let df = DataFrame::new(vec![
        Column::new("gender".into(), gender_col),
        Column::new("age_group".into(), group_col),
        Column::new("outcome".into(), outcome_col),
        Column::new("count".into(), count_col),
    ])?;

    let frame = patient.derive(
        df,
        DerivationStep::new("age_pyramid").with_detail(format!("{PATIENT_PART}+{ENCOUNTER_PART}")),
    );
    let aliases = ColumnAliases::from_pairs([
        ("side", "gender"),
        ("y", "age_group"),
        ("stack_group", "outcome"),
        ("value", "count"),
    ]);
    let result = Dispatcher::default().build(&frame, &[PYRAMID], Some(&aliases))?;
    info!(
        source_id = %source.id(),
        rows = frame.height(),
        "built age pyramid"
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_bins_label_like_integer_ranges() {
        let bins = AgeBins::default();
        assert_eq!(bins.len(), 25);
        assert_eq!(bins.bin(0.0).and_then(|b| bins.label(b)).as_deref(), Some("0 - 0"));
        assert_eq!(bins.bin(3.0).and_then(|b| bins.label(b)).as_deref(), Some("1 - 5"));
        assert_eq!(bins.bin(5.0).and_then(|b| bins.label(b)).as_deref(), Some("1 - 5"));
        assert_eq!(bins.bin(17.0).and_then(|b| bins.label(b)).as_deref(), Some("16 - 20"));
        assert_eq!(bins.bin(120.0).and_then(|b| bins.label(b)).as_deref(), Some("116 - 120"));
        assert_eq!(bins.bin(120.5), None);
        assert_eq!(bins.bin(-1.0), None);
    }

    #[test]
    fn custom_bins_are_checked() {
        assert!(AgeBins::new(vec![0.0]).is_err());
        assert!(AgeBins::new(vec![0.0, 10.0, 10.0]).is_err());
        assert!(AgeBins::new(vec![0.0, f64::INFINITY]).is_err());

        let decades = AgeBins::new(vec![-1.0, 9.0, 19.0]).unwrap();
        assert_eq!(decades.bin(12.0).and_then(|b| decades.label(b)).as_deref(), Some("10 - 19"));
    }
}
