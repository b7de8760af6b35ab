//! Provenance carried from a verified source to every derived result.
//!
//! A [`Provenance`] is the part of a loaded source that downstream frames and
//! results need to stay traceable: which source, which checksum, how many
//! primary records. Frames built without a source carry no provenance at all;
//! the fields are never filled in with guesses.

use serde::{Deserialize, Serialize};

/// Identity of the verified input a frame or result was derived from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance {
    /// Source identifier (catalog name, directory name or file stem).
    pub source_id: String,
    /// Lower-case hex SHA-256 recomputed at load time.
    pub checksum: String,
    /// Number of primary entity records (e.g. patients).
    pub record_count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// One transformation applied to a frame since it was loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivationStep {
    /// Operation name, e.g. `map_columns`, `translate`, `validate`.
    pub operation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl DerivationStep {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            detail: None,
        }
    }

    #[must_use]
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

impl std::fmt::Display for DerivationStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.detail {
            Some(detail) => write!(f, "{}({detail})", self.operation),
            None => f.write_str(&self.operation),
        }
    }
}
