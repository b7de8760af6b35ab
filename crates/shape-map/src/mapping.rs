//! Declarative column mappings.
//!
//! A [`ColumnMapping`] is an ordered list of entries, each naming a target
//! column and how to produce it from the source frame. Mappings are plain
//! data and load from TOML:
//!
//! ```toml
//! exclusive = true
//!
//! [[entries]]
//! target = "condition"
//! source = { path = "code.code" }
//!
//! [[entries]]
//! target = "subject"
//! source = { strip_prefix = { path = "subject", prefix = "Patient/" } }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// How a target column is produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnSource {
    /// Copy a column. Flat names are looked up first; a dotted path then
    /// descends into struct columns (`extension.age.value`).
    Path(String),
    /// Fill the column with one literal string value.
    Constant(String),
    /// Copy a string column with a fixed prefix removed where present.
    StripPrefix { path: String, prefix: String },
}

impl ColumnSource {
    /// The source path this entry reads, if any.
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::Path(path) | Self::StripPrefix { path, .. } => Some(path),
            Self::Constant(_) => None,
        }
    }

    pub(crate) fn describe(&self) -> String {
        match self {
            Self::Path(path) => path.clone(),
            Self::Constant(value) => format!("constant '{value}'"),
            Self::StripPrefix { path, prefix } => format!("{path} without '{prefix}'"),
        }
    }
}

/// One target column of a mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingEntry {
    pub source: ColumnSource,
    pub target: String,
}

impl MappingEntry {
    pub fn new(source: ColumnSource, target: impl Into<String>) -> Self {
        Self {
            source,
            target: target.into(),
        }
    }
}

/// Ordered set of mapping entries.
///
/// When two entries name the same target the later one wins, keeping the
/// position of the first occurrence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMapping {
    #[serde(default)]
    pub entries: Vec<MappingEntry>,
    /// Keep only mapped targets, dropping every unreferenced column.
    #[serde(default)]
    pub exclusive: bool,
}

impl ColumnMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a rename mapping from `(source_path, target)` pairs.
    pub fn from_pairs<S, T>(pairs: impl IntoIterator<Item = (S, T)>) -> Self
    where
        S: Into<String>,
        T: Into<String>,
    {
        Self {
            entries: pairs
                .into_iter()
                .map(|(source, target)| MappingEntry::new(ColumnSource::Path(source.into()), target))
                .collect(),
            exclusive: false,
        }
    }

    #[must_use]
    pub fn rename(mut self, source: impl Into<String>, target: impl Into<String>) -> Self {
        self.entries
            .push(MappingEntry::new(ColumnSource::Path(source.into()), target));
        self
    }

    #[must_use]
    pub fn constant(mut self, value: impl Into<String>, target: impl Into<String>) -> Self {
        self.entries
            .push(MappingEntry::new(ColumnSource::Constant(value.into()), target));
        self
    }

    #[must_use]
    pub fn strip_prefix(
        mut self,
        source: impl Into<String>,
        prefix: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        self.entries.push(MappingEntry::new(
            ColumnSource::StripPrefix {
                path: source.into(),
                prefix: prefix.into(),
            },
            target,
        ));
        self
    }

    /// Drop columns the mapping does not produce.
    #[must_use]
    pub fn exclusive(mut self) -> Self {
        self.exclusive = true;
        self
    }

    /// Target names in output order, with duplicates collapsed.
    pub fn targets(&self) -> Vec<&str> {
        let mut targets: Vec<&str> = Vec::with_capacity(self.entries.len());
        for entry in &self.entries {
            if !targets.contains(&entry.target.as_str()) {
                targets.push(&entry.target);
            }
        }
        targets
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Canonical column name to the actual column name in a frame.
///
/// Used where a consumer requires fixed column names but the frame at hand
/// uses its own: `{"label": "condition"}` reads `label` from `condition`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColumnAliases(BTreeMap<String, String>);

impl ColumnAliases {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(canonical, actual)` pairs.
    pub fn from_pairs<C, A>(pairs: impl IntoIterator<Item = (C, A)>) -> Self
    where
        C: Into<String>,
        A: Into<String>,
    {
        Self(
            pairs
                .into_iter()
                .map(|(canonical, actual)| (canonical.into(), actual.into()))
                .collect(),
        )
    }

    #[must_use]
    pub fn with(mut self, canonical: impl Into<String>, actual: impl Into<String>) -> Self {
        self.0.insert(canonical.into(), actual.into());
        self
    }

    /// Actual column name for `canonical`, or `canonical` itself.
    pub fn resolve<'a>(&'a self, canonical: &'a str) -> &'a str {
        self.0.get(canonical).map_or(canonical, String::as_str)
    }

    pub fn get(&self, canonical: &str) -> Option<&str> {
        self.0.get(canonical).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Rename mapping from actual columns onto canonical names.
    pub fn to_mapping(&self) -> ColumnMapping {
        ColumnMapping::from_pairs(self.0.iter().map(|(canonical, actual)| (actual, canonical)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn targets_collapse_duplicates_in_first_position() {
        let mapping = ColumnMapping::new()
            .rename("a", "x")
            .rename("b", "y")
            .constant("z", "x");
        assert_eq!(mapping.targets(), vec!["x", "y"]);
    }

    #[test]
    fn aliases_resolve_or_fall_back() {
        let aliases = ColumnAliases::new().with("label", "condition");
        assert_eq!(aliases.resolve("label"), "condition");
        assert_eq!(aliases.resolve("proportion"), "proportion");

        let mapping = aliases.to_mapping();
        assert_eq!(
            mapping.entries,
            vec![MappingEntry::new(ColumnSource::Path("condition".into()), "label")]
        );
    }
}
