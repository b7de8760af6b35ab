//! Error types for column mapping.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MapError {
    /// A referenced source column or nested path does not exist, including
    /// dotted paths through columns that are not structs.
    #[error("missing column: '{path}' not found in dataframe")]
    MissingColumn { path: String },

    /// Several required columns (or their aliases) are absent.
    #[error("required columns or column mappings not present: {}", columns.join(", "))]
    MissingColumns { columns: Vec<String> },

    /// A string derivation was applied to a non-string column.
    #[error("cannot derive from '{path}': expected string column, found {dtype}")]
    NotAString { path: String, dtype: String },

    /// A mapping entry has an empty target name.
    #[error("mapping entry for '{source_desc}' has an empty target column name")]
    EmptyTarget { source_desc: String },

    #[error("DataFrame operation failed: {message}")]
    DataFrame { message: String },
}

impl From<polars::prelude::PolarsError> for MapError {
    fn from(err: polars::prelude::PolarsError) -> Self {
        Self::DataFrame {
            message: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, MapError>;
