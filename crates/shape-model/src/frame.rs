//! Dataframes with attached provenance.
//!
//! [`SourcedFrame`] wraps a Polars DataFrame with a shared reference to the
//! provenance of the source it came from and the ordered list of derivation
//! steps applied since loading. Mapping, translation and shape validation all
//! accept and return this type so provenance survives the whole pipeline.

use std::sync::Arc;

use polars::prelude::DataFrame;

use crate::provenance::{DerivationStep, Provenance};

/// A dataframe plus the provenance of its originating source, if any.
#[derive(Debug, Clone)]
pub struct SourcedFrame {
    /// The tabular contents.
    pub data: DataFrame,
    source: Option<Arc<Provenance>>,
    lineage: Vec<DerivationStep>,
}

impl SourcedFrame {
    /// A frame with no attached source.
    pub fn new(data: DataFrame) -> Self {
        Self {
            data,
            source: None,
            lineage: Vec::new(),
        }
    }

    /// A frame derived from a verified source.
    pub fn from_source(data: DataFrame, source: Arc<Provenance>) -> Self {
        Self {
            data,
            source: Some(source),
            lineage: Vec::new(),
        }
    }

    /// The attached provenance, if the frame descends from a loaded source.
    pub fn provenance(&self) -> Option<&Provenance> {
        self.source.as_deref()
    }

    /// Shared handle to the attached provenance.
    pub fn source_handle(&self) -> Option<Arc<Provenance>> {
        self.source.clone()
    }

    /// Derivation steps applied so far, oldest first.
    pub fn lineage(&self) -> &[DerivationStep] {
        &self.lineage
    }

    /// Number of rows in the frame.
    pub fn height(&self) -> usize {
        self.data.height()
    }

    /// Replace the data, keeping source and lineage, and record the step.
    #[must_use]
    pub fn derive(&self, data: DataFrame, step: DerivationStep) -> Self {
        let mut lineage = self.lineage.clone();
        lineage.push(step);
        Self {
            data,
            source: self.source.clone(),
            lineage,
        }
    }

    /// Record a step that did not change the data.
    #[must_use]
    pub fn with_step(mut self, step: DerivationStep) -> Self {
        self.lineage.push(step);
        self
    }

    /// Split into data, provenance and lineage.
    pub fn into_parts(self) -> (DataFrame, Option<Arc<Provenance>>, Vec<DerivationStep>) {
        (self.data, self.source, self.lineage)
    }
}

impl From<DataFrame> for SourcedFrame {
    fn from(data: DataFrame) -> Self {
        Self::new(data)
    }
}
