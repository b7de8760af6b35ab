//! Error types for taxonomy loading and term translation.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading a taxonomy file.
#[derive(Debug, Error)]
pub enum TaxonomyError {
    #[error("taxonomy not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("failed to read taxonomy {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid taxonomy TOML {name}: {message}")]
    Toml { name: String, message: String },

    /// Structure other than sections of string or boolean entries.
    #[error("invalid taxonomy {name}: {message}")]
    Format { name: String, message: String },

    /// A label equals a key of the same section.
    #[error("taxonomy section [{section}] uses '{label}' both as a label and as a key")]
    LabelIsKey { section: String, label: String },
}

/// Errors raised while translating dataframe columns.
#[derive(Debug, Error)]
pub enum TermError {
    #[error(
        "cannot resolve taxonomy section for column '{column}': {}",
        describe_candidates(candidates)
    )]
    SectionResolution {
        column: String,
        candidates: Vec<String>,
    },

    #[error("unmapped term in column '{column}' (section [{section}]): '{value}'")]
    UnmappedTerm {
        column: String,
        section: String,
        value: String,
    },

    #[error("column '{column}' not found in DataFrame")]
    MissingColumn { column: String },

    #[error("DataFrame operation failed: {message}")]
    DataFrame { message: String },
}

fn describe_candidates(candidates: &[String]) -> String {
    if candidates.is_empty() {
        "no matching section".to_string()
    } else {
        format!("ambiguous between {}", candidates.join(", "))
    }
}

impl From<polars::prelude::PolarsError> for TermError {
    fn from(err: polars::prelude::PolarsError) -> Self {
        Self::DataFrame {
            message: err.to_string(),
        }
    }
}
