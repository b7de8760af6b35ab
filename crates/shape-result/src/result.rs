//! Provenance-carrying results.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use shape_model::{DerivationStep, Provenance, SourcedFrame};

/// A dataframe validated against one shape.
#[derive(Debug, Clone)]
pub struct ShapeBinding {
    pub shape: String,
    pub data: DataFrame,
}

/// Provenance as exported with a result. All fields are null when the input
/// had no attached source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultProvenance {
    pub source_id: Option<String>,
    pub checksum: Option<String>,
    pub record_count: Option<u64>,
}

impl From<Option<&Provenance>> for ResultProvenance {
    fn from(provenance: Option<&Provenance>) -> Self {
        match provenance {
            Some(p) => Self {
                source_id: Some(p.source_id.clone()),
                checksum: Some(p.checksum.clone()),
                record_count: Some(p.record_count),
            },
            None => Self::default(),
        }
    }
}

/// Presentation hints passed through to renderers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderHints {
    pub title: Option<String>,
    pub xlabel: Option<String>,
    pub ylabel: Option<String>,
    /// Category to color.
    #[serde(default)]
    pub colors: BTreeMap<String, String>,
}

impl RenderHints {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_axes(mut self, xlabel: impl Into<String>, ylabel: impl Into<String>) -> Self {
        self.xlabel = Some(xlabel.into());
        self.ylabel = Some(ylabel.into());
        self
    }

    #[must_use]
    pub fn with_color(mut self, category: impl Into<String>, color: impl Into<String>) -> Self {
        self.colors.insert(category.into(), color.into());
        self
    }
}

/// A shape that failed in partial-success mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedShape {
    pub shape: String,
    pub reason: String,
}

/// Canonical output: one or more shape bindings of the same input, plus the
/// provenance of that input.
///
/// Values are never mutated in place; setters consume and return a new
/// result.
#[derive(Debug, Clone)]
pub struct ShapeResult {
    bindings: Vec<ShapeBinding>,
    source: Option<Arc<Provenance>>,
    provenance: ResultProvenance,
    created_at: DateTime<Utc>,
    origin: SourcedFrame,
    lineage: Vec<DerivationStep>,
    skipped: Vec<SkippedShape>,
    hints: RenderHints,
    payload: Option<serde_json::Value>,
    registry_version: u32,
}

impl ShapeResult {
    /// Callers guarantee `bindings` is non-empty and validated against a
    /// registry of `registry_version`.
    pub(crate) fn new(
        bindings: Vec<ShapeBinding>,
        origin: SourcedFrame,
        lineage: Vec<DerivationStep>,
        skipped: Vec<SkippedShape>,
        registry_version: u32,
    ) -> Self {
        let source = origin.source_handle();
        Self {
            bindings,
            provenance: ResultProvenance::from(source.as_deref()),
            source,
            created_at: Utc::now(),
            origin,
            lineage,
            skipped,
            hints: RenderHints::default(),
            payload: None,
            registry_version,
        }
    }

    pub fn bindings(&self) -> &[ShapeBinding] {
        &self.bindings
    }

    pub fn binding(&self, shape: &str) -> Option<&ShapeBinding> {
        self.bindings.iter().find(|b| b.shape == shape)
    }

    /// Validated data for `shape`.
    pub fn data(&self, shape: &str) -> Option<&DataFrame> {
        self.binding(shape).map(|b| &b.data)
    }

    pub fn shape_names(&self) -> Vec<&str> {
        self.bindings.iter().map(|b| b.shape.as_str()).collect()
    }

    pub fn provenance(&self) -> &ResultProvenance {
        &self.provenance
    }

    /// Provenance of the attached source, if any.
    pub fn source(&self) -> Option<&Provenance> {
        self.source.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// The input before any coercion.
    pub fn origin(&self) -> &DataFrame {
        &self.origin.data
    }

    pub(crate) fn origin_frame(&self) -> &SourcedFrame {
        &self.origin
    }

    pub fn lineage(&self) -> &[DerivationStep] {
        &self.lineage
    }

    pub fn skipped(&self) -> &[SkippedShape] {
        &self.skipped
    }

    pub fn hints(&self) -> &RenderHints {
        &self.hints
    }

    pub fn payload(&self) -> Option<&serde_json::Value> {
        self.payload.as_ref()
    }

    /// Version of the registry whose contracts validated the bindings.
    pub fn registry_version(&self) -> u32 {
        self.registry_version
    }

    #[must_use]
    pub fn with_hints(mut self, hints: RenderHints) -> Self {
        self.hints = hints;
        self
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.hints.title = Some(title.into());
        self
    }

    /// Attach an opaque estimator payload.
    #[must_use]
    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = Some(payload);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::Column;

    #[test]
    fn plain_frames_have_null_provenance() {
        let df = DataFrame::new(vec![Column::new("x".into(), [1i64])]).unwrap();
        let result = ShapeResult::new(
            vec![ShapeBinding {
                shape: "passthrough".to_string(),
                data: df.clone(),
            }],
            SourcedFrame::new(df),
            vec![],
            vec![],
            crate::registry::REGISTRY_VERSION,
        );
        assert_eq!(result.provenance(), &ResultProvenance::default());
        assert!(result.source().is_none());

        let json = serde_json::to_value(result.provenance()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"source_id": null, "checksum": null, "record_count": null})
        );
    }

    #[test]
    fn setters_return_new_values() {
        let df = DataFrame::new(vec![Column::new("x".into(), [1i64])]).unwrap();
        let result = ShapeResult::new(
            vec![ShapeBinding {
                shape: "passthrough".to_string(),
                data: df.clone(),
            }],
            SourcedFrame::new(df),
            vec![],
            vec![],
            crate::registry::REGISTRY_VERSION,
        );
        let titled = result.clone().with_title("Ages").with_payload(serde_json::json!({"n": 1}));
        assert!(result.hints().title.is_none());
        assert_eq!(titled.hints().title.as_deref(), Some("Ages"));
        assert_eq!(titled.payload(), Some(&serde_json::json!({"n": 1})));
    }
}
