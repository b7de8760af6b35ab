//! Shape contracts.
//!
//! A shape is a named column contract that a dataframe must satisfy before a
//! generic analysis or plot can consume it. Contracts are plain data: a list
//! of [`ColumnSpec`]s, each with a [`SemanticType`], plus a rule for columns
//! the contract does not name ([`ExtraColumns`]).
//!
//! ## Example: `proportion`
//!
//! ```text
//! label       Label        (string-like)
//! proportion  Proportion   (numeric, 0 <= x <= 1)
//! extra       Drop         (output is projected to the two columns)
//! ```

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};

/// What a column's content must look like.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SemanticType {
    /// Categorical label, string content.
    Label,
    /// Numeric fraction in `[0, 1]`.
    Proportion,
    /// Binary indicator: booleans or 0/1.
    Indicator,
    /// Numeric age, non-negative.
    Age,
    /// Non-negative integral count.
    Count,
    /// Any finite number.
    Numeric,
}

impl SemanticType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Label => "label",
            Self::Proportion => "proportion",
            Self::Indicator => "indicator",
            Self::Age => "age",
            Self::Count => "count",
            Self::Numeric => "numeric",
        }
    }

    /// Short human description used in error messages.
    pub fn describe(&self) -> &'static str {
        match self {
            Self::Label => "string label",
            Self::Proportion => "numeric fraction in [0, 1]",
            Self::Indicator => "binary indicator (0/1 or boolean)",
            Self::Age => "non-negative numeric age",
            Self::Count => "non-negative integer count",
            Self::Numeric => "finite number",
        }
    }
}

impl std::fmt::Display for SemanticType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One named column of a contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub semantic_type: SemanticType,
    /// Optional columns may be absent; when present they must validate.
    #[serde(default)]
    pub optional: bool,
}

impl ColumnSpec {
    pub fn required(name: impl Into<String>, semantic_type: SemanticType) -> Self {
        Self {
            name: name.into(),
            semantic_type,
            optional: false,
        }
    }

    pub fn optional(name: impl Into<String>, semantic_type: SemanticType) -> Self {
        Self {
            name: name.into(),
            semantic_type,
            optional: true,
        }
    }
}

/// Treatment of columns a contract does not name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtraColumns {
    /// Closed contract: output is projected to the declared columns.
    #[default]
    Drop,
    /// Other columns pass through unchanged.
    Keep,
    /// Every other column must satisfy this type.
    Typed(SemanticType),
}

/// A named column contract. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ShapeSpecDef", into = "ShapeSpecDef")]
pub struct ShapeSpec {
    name: String,
    columns: Vec<ColumnSpec>,
    extra: ExtraColumns,
    min_extra: usize,
    description: Option<String>,
}

impl ShapeSpec {
    /// Build a contract, rejecting empty or duplicate column names.
    pub fn new(
        name: impl Into<String>,
        columns: Vec<ColumnSpec>,
        extra: ExtraColumns,
    ) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ModelError::EmptyShapeName);
        }
        let mut seen = BTreeSet::new();
        for column in &columns {
            if column.name.trim().is_empty() {
                return Err(ModelError::EmptyColumnName { shape: name });
            }
            if !seen.insert(column.name.as_str()) {
                return Err(ModelError::DuplicateColumn {
                    shape: name.clone(),
                    column: column.name.clone(),
                });
            }
        }
        Ok(Self {
            name,
            columns,
            extra,
            min_extra: 0,
            description: None,
        })
    }

    /// Require at least `count` columns beyond the declared ones.
    #[must_use]
    pub fn with_min_extra(mut self, count: usize) -> Self {
        self.min_extra = count;
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    pub fn extra(&self) -> ExtraColumns {
        self.extra
    }

    pub fn min_extra(&self) -> usize {
        self.min_extra
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Declared columns that must be present.
    pub fn required_columns(&self) -> impl Iterator<Item = &ColumnSpec> {
        self.columns.iter().filter(|c| !c.optional)
    }

    /// Look up a declared column by name.
    pub fn column(&self, name: &str) -> Option<&ColumnSpec> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// True for the identity contract: nothing declared, everything kept.
    pub fn is_identity(&self) -> bool {
        self.columns.is_empty() && self.extra == ExtraColumns::Keep && self.min_extra == 0
    }
}

/// Serialized form of [`ShapeSpec`], validated on the way in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShapeSpecDef {
    pub name: String,
    #[serde(default)]
    pub columns: Vec<ColumnSpec>,
    #[serde(default)]
    pub extra: ExtraColumns,
    #[serde(default)]
    pub min_extra: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl TryFrom<ShapeSpecDef> for ShapeSpec {
    type Error = ModelError;

    fn try_from(def: ShapeSpecDef) -> Result<Self> {
        let mut spec = ShapeSpec::new(def.name, def.columns, def.extra)?.with_min_extra(def.min_extra);
        spec.description = def.description;
        Ok(spec)
    }
}

impl From<ShapeSpec> for ShapeSpecDef {
    fn from(spec: ShapeSpec) -> Self {
        Self {
            name: spec.name,
            columns: spec.columns,
            extra: spec.extra,
            min_extra: spec.min_extra,
            description: spec.description,
        }
    }
}
