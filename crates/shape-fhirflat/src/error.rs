//! Error type for FHIRflat analyses.

use shape_map::MapError;
use shape_result::ShapeError;
use shape_source::SourceError;
use shape_terms::{TaxonomyError, TermError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FhirflatError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Map(#[from] MapError),

    #[error(transparent)]
    Taxonomy(#[from] TaxonomyError),

    #[error(transparent)]
    Term(#[from] TermError),

    #[error(transparent)]
    Shape(#[from] ShapeError),

    /// A translated flag column did not come out boolean.
    #[error("column '{column}' in part '{part}' is not a flag column after translation (dtype {dtype})")]
    NotAFlagColumn {
        part: String,
        column: String,
        dtype: String,
    },

    #[error("invalid age bins: {message}")]
    InvalidBins { message: String },

    #[error("DataFrame operation failed: {message}")]
    DataFrame { message: String },
}

impl From<polars::prelude::PolarsError> for FhirflatError {
    fn from(err: polars::prelude::PolarsError) -> Self {
        Self::DataFrame {
            message: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, FhirflatError>;
