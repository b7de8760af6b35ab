//! Replacing coded cells with taxonomy labels.

use std::collections::BTreeSet;

use polars::prelude::{AnyValue, BooleanChunked, Column, DataFrame, NamedFrom, Series};
use serde::{Deserialize, Serialize};
use shape_common::cell_key;
use shape_model::{DerivationStep, SourcedFrame, TranslateOptions, UnmappedPolicy};
use tracing::debug;

use crate::error::TermError;
use crate::taxonomy::{Namespace, TaxonomyTable, TermValue, labels};

/// One column to translate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermColumn {
    pub column: String,
    /// Section to use; inferred from the column name when absent.
    #[serde(default)]
    pub section: Option<String>,
    /// Drop rows whose translated value is null.
    #[serde(default)]
    pub drop_nulls: bool,
}

impl TermColumn {
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            section: None,
            drop_nulls: false,
        }
    }

    #[must_use]
    pub fn in_section(mut self, section: impl Into<String>) -> Self {
        self.section = Some(section.into());
        self
    }

    #[must_use]
    pub fn drop_nulls(mut self) -> Self {
        self.drop_nulls = true;
        self
    }
}

/// Translates columns against one taxonomy.
#[derive(Debug, Clone)]
pub struct Translator<'a> {
    taxonomy: &'a TaxonomyTable,
    options: TranslateOptions,
}

impl<'a> Translator<'a> {
    pub fn new(taxonomy: &'a TaxonomyTable) -> Self {
        Self {
            taxonomy,
            options: TranslateOptions::default(),
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: TranslateOptions) -> Self {
        self.options = options;
        self
    }

    /// Translate `columns` in order, returning a new frame.
    ///
    /// Other columns are untouched. Fails on the first column that cannot be
    /// translated; the input is never modified.
    pub fn translate(&self, df: &DataFrame, columns: &[TermColumn]) -> Result<DataFrame, TermError> {
        let mut out = df.clone();
        for term_column in columns {
            out = self.translate_column(out, term_column)?;
        }
        Ok(out)
    }

    /// [`Translator::translate`] on a sourced frame, keeping its provenance.
    pub fn translate_sourced(
        &self,
        frame: &SourcedFrame,
        columns: &[TermColumn],
    ) -> Result<SourcedFrame, TermError> {
        let data = self.translate(&frame.data, columns)?;
        let names: Vec<&str> = columns.iter().map(|c| c.column.as_str()).collect();
        let step = DerivationStep::new("translate").with_detail(names.join(","));
        Ok(frame.derive(data, step))
    }

    fn translate_column(&self, mut df: DataFrame, term_column: &TermColumn) -> Result<DataFrame, TermError> {
        let name = term_column.column.as_str();
        let column = df.column(name).map_err(|_| TermError::MissingColumn {
            column: name.to_string(),
        })?;
        let section = self
            .taxonomy
            .resolve_section(name, term_column.section.as_deref())?;
        let namespace = self
            .taxonomy
            .section(section)
            .ok_or_else(|| TermError::SectionResolution {
                column: name.to_string(),
                candidates: vec![section.to_string()],
            })?;

        let translated = self.translate_cells(column, &namespace, name)?;
        let nulls = translated.iter().filter(|v| v.is_none()).count();
        let output = build_column(name, &translated, &namespace);
        df.with_column(output)?;

        if term_column.drop_nulls && nulls > 0 {
            let keep: BooleanChunked = translated.iter().map(|v| Some(v.is_some())).collect();
            df = df.filter(&keep)?;
        }

        debug!(
            column = name,
            section,
            rows = translated.len(),
            nulls,
            dropped = if term_column.drop_nulls { nulls } else { 0 },
            "translated column"
        );
        Ok(df)
    }

    fn translate_cells(
        &self,
        column: &Column,
        namespace: &Namespace<'_>,
        name: &str,
    ) -> Result<Vec<Option<TermValue>>, TermError> {
        let known_labels = labels(namespace);
        let known_flags: BTreeSet<bool> = namespace
            .iter()
            .filter_map(|(_, value)| value.as_flag())
            .collect();

        let mut out = Vec::with_capacity(column.len());
        for idx in 0..column.len() {
            let value = column.get(idx)?;
            let translated = match value {
                AnyValue::Null => None,
                AnyValue::Boolean(flag) if known_flags.contains(&flag) => Some(TermValue::Flag(flag)),
                other => {
                    let Some(key) = cell_key(other) else {
                        out.push(None);
                        continue;
                    };
                    if let Some(term) = namespace.get(&key) {
                        Some(term.clone())
                    } else if let Some(done) = self.already_translated(key.as_str(), &known_labels, &known_flags) {
                        Some(done)
                    } else {
                        self.unmapped(name, namespace.name(), key)?
                    }
                }
            };
            out.push(translated);
        }
        Ok(out)
    }

    /// A label of the section, the string form of one of its flags (as left
    /// in a mixed column), or the sentinel marker.
    fn already_translated(
        &self,
        key: &str,
        known_labels: &BTreeSet<String>,
        known_flags: &BTreeSet<bool>,
    ) -> Option<TermValue> {
        if known_labels.contains(key) {
            return Some(TermValue::Label(key.to_string()));
        }
        if let Some(flag) = key.parse::<bool>().ok().filter(|f| known_flags.contains(f)) {
            return Some(TermValue::Flag(flag));
        }
        match &self.options.unmapped {
            UnmappedPolicy::Sentinel(marker) if marker == key => Some(TermValue::Label(key.to_string())),
            _ => None,
        }
    }

    fn unmapped(&self, column: &str, section: &str, value: String) -> Result<Option<TermValue>, TermError> {
        match &self.options.unmapped {
            UnmappedPolicy::Keep => Ok(Some(TermValue::Label(value))),
            UnmappedPolicy::Strict => Err(TermError::UnmappedTerm {
                column: column.to_string(),
                section: section.to_string(),
                value,
            }),
            UnmappedPolicy::Sentinel(marker) => Ok(Some(TermValue::Label(marker.clone()))),
            UnmappedPolicy::Null => Ok(None),
        }
    }
}

/// Boolean when every non-null cell is a flag (or the column is all null and
/// the section holds only flags); otherwise strings.
fn build_column(name: &str, values: &[Option<TermValue>], namespace: &Namespace<'_>) -> Column {
    let mut non_null = values.iter().flatten().peekable();
    let all_flags = if non_null.peek().is_some() {
        non_null.all(|v| matches!(v, TermValue::Flag(_)))
    } else {
        !namespace.is_empty() && namespace.iter().all(|(_, v)| matches!(v, TermValue::Flag(_)))
    };

    if all_flags {
        let flags: Vec<Option<bool>> = values
            .iter()
            .map(|v| v.as_ref().and_then(TermValue::as_flag))
            .collect();
        Series::new(name.into(), flags).into()
    } else {
        let labels: Vec<Option<String>> = values
            .iter()
            .map(|v| v.as_ref().map(ToString::to_string))
            .collect();
        Series::new(name.into(), labels).into()
    }
}

/// Translate with default options (unmapped terms kept as they are).
pub fn translate(
    df: &DataFrame,
    taxonomy: &TaxonomyTable,
    columns: &[TermColumn],
) -> Result<DataFrame, TermError> {
    Translator::new(taxonomy).translate(df, columns)
}

/// Translate a sourced frame with the given options.
pub fn translate_sourced(
    frame: &SourcedFrame,
    taxonomy: &TaxonomyTable,
    columns: &[TermColumn],
    options: &TranslateOptions,
) -> Result<SourcedFrame, TermError> {
    Translator::new(taxonomy)
        .with_options(options.clone())
        .translate_sourced(frame, columns)
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::DataType;

    fn taxonomy() -> TaxonomyTable {
        TaxonomyTable::from_toml_str(
            "demo",
            r#"
[presence_absence]
"http://snomed.info/sct|373066001" = true
"http://snomed.info/sct|373067005" = false

[outcome]
"http://snomed.info/sct|371827001" = "alive"
"http://snomed.info/sct|419099009" = "death"
"#,
        )
        .unwrap()
    }

    fn codes(name: &str, values: &[Option<&str>]) -> DataFrame {
        DataFrame::new(vec![Column::new(name.into(), values.to_vec())]).unwrap()
    }

    #[test]
    fn flags_produce_boolean_column() {
        let df = codes(
            "presence_absence",
            &[
                Some("http://snomed.info/sct|373066001"),
                None,
                Some("http://snomed.info/sct|373067005"),
            ],
        );
        let out = translate(&df, &taxonomy(), &[TermColumn::new("presence_absence")]).unwrap();
        let column = out.column("presence_absence").unwrap();
        assert_eq!(column.dtype(), &DataType::Boolean);
        let values: Vec<Option<bool>> = column.bool().unwrap().into_iter().collect();
        assert_eq!(values, vec![Some(true), None, Some(false)]);
    }

    #[test]
    fn mixed_flags_and_kept_terms_become_strings() {
        let df = codes(
            "presence_absence",
            &[Some("http://snomed.info/sct|373066001"), Some("unknown-code")],
        );
        let out = translate(&df, &taxonomy(), &[TermColumn::new("presence_absence")]).unwrap();
        let column = out.column("presence_absence").unwrap().str().unwrap();
        assert_eq!(column.get(0), Some("true"));
        assert_eq!(column.get(1), Some("unknown-code"));
    }

    #[test]
    fn sentinel_and_null_policies() {
        let df = codes("outcome", &[Some("http://snomed.info/sct|371827001"), Some("x")]);
        let tx = taxonomy();

        let sentinel = Translator::new(&tx)
            .with_options(TranslateOptions::new().with_unmapped(UnmappedPolicy::sentinel()))
            .translate(&df, &[TermColumn::new("outcome")])
            .unwrap();
        assert_eq!(sentinel.column("outcome").unwrap().str().unwrap().get(1), Some("unknown"));

        let nulled = Translator::new(&tx)
            .with_options(TranslateOptions::new().with_unmapped(UnmappedPolicy::Null))
            .translate(&df, &[TermColumn::new("outcome").drop_nulls()])
            .unwrap();
        assert_eq!(nulled.height(), 1);
        assert_eq!(nulled.column("outcome").unwrap().str().unwrap().get(0), Some("alive"));
    }

    #[test]
    fn sentinel_on_flag_section_translates_once() {
        let df = codes(
            "presence_absence",
            &[Some("http://snomed.info/sct|373066001"), Some("zzz"), None],
        );
        let tx = taxonomy();
        let translator = Translator::new(&tx)
            .with_options(TranslateOptions::new().with_unmapped(UnmappedPolicy::sentinel()));
        let columns = [TermColumn::new("presence_absence")];

        let once = translator.translate(&df, &columns).unwrap();
        let values: Vec<Option<&str>> = once.column("presence_absence").unwrap().str().unwrap().into_iter().collect();
        assert_eq!(values, vec![Some("true"), Some("unknown"), None]);

        let twice = translator.translate(&once, &columns).unwrap();
        assert!(once.equals_missing(&twice));
    }

    #[test]
    fn boolean_input_is_already_translated() {
        let df = DataFrame::new(vec![Column::new("presence_absence".into(), [Some(true), None])]).unwrap();
        let out = Translator::new(&taxonomy())
            .with_options(TranslateOptions::strict())
            .translate(&df, &[TermColumn::new("presence_absence")])
            .unwrap();
        assert!(out.equals_missing(&df));
    }
}
