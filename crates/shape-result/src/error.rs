//! Error types for shape validation, dispatch and export.

use std::fmt;
use std::path::PathBuf;

use shape_map::MapError;
use shape_model::{ModelError, SemanticType};
use thiserror::Error;

/// How a column failed its semantic type.
#[derive(Debug, Clone, PartialEq)]
pub enum Violation {
    /// Required column absent (directly and through aliases).
    Missing,
    /// Column dtype cannot represent the semantic type.
    WrongType { actual: String },
    /// Value outside the allowed range, or not finite.
    OutOfRange { value: f64 },
    /// Value is not a recognizable 0/1 or boolean token.
    NotIndicator { value: String },
    Negative { value: f64 },
    NotIntegral { value: f64 },
    /// Null cells in a validated column.
    Null { count: usize },
    /// Fewer extra columns than the contract's minimum.
    TooFewExtra { found: usize, required: usize },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing => f.write_str("column is missing"),
            Self::WrongType { actual } => write!(f, "wrong type {actual}"),
            Self::OutOfRange { value } => write!(f, "value {value} out of range"),
            Self::NotIndicator { value } => write!(f, "value '{value}' is not an indicator"),
            Self::Negative { value } => write!(f, "negative value {value}"),
            Self::NotIntegral { value } => write!(f, "non-integral value {value}"),
            Self::Null { count } => write!(f, "{count} null value(s)"),
            Self::TooFewExtra { found, required } => {
                write!(f, "found {found} extra column(s), at least {required} required")
            }
        }
    }
}

impl Violation {
    /// Variant name, free of cell content.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Missing => "missing",
            Self::WrongType { .. } => "wrong_type",
            Self::OutOfRange { .. } => "out_of_range",
            Self::NotIndicator { .. } => "not_indicator",
            Self::Negative { .. } => "negative",
            Self::NotIntegral { .. } => "not_integral",
            Self::Null { .. } => "null",
            Self::TooFewExtra { .. } => "too_few_extra",
        }
    }

    /// The offending cell, for violations that carry one.
    pub fn cell_value(&self) -> Option<String> {
        match self {
            Self::OutOfRange { value } | Self::Negative { value } | Self::NotIntegral { value } => {
                Some(value.to_string())
            }
            Self::NotIndicator { value } => Some(value.clone()),
            _ => None,
        }
    }
}

/// One failed shape of a multi-shape request.
#[derive(Debug)]
pub struct ShapeFailure {
    pub shape: String,
    pub error: ShapeError,
}

#[derive(Debug, Error)]
pub enum ShapeError {
    #[error("unknown shape '{shape}'")]
    UnknownShape { shape: String },

    /// A column does not satisfy the shape's contract.
    #[error("shape '{shape}' column '{column}' (expected {}): {violation}", expected.describe())]
    ShapeContract {
        shape: String,
        column: String,
        expected: SemanticType,
        violation: Violation,
    },

    #[error("shape '{shape}' is already registered")]
    DuplicateShape { shape: String },

    #[error("no shapes requested")]
    NoShapesRequested,

    /// Every requested shape failed in skip mode.
    #[error("no requested shape could be built: {}", describe_failures(failures))]
    NoValidShapes { failures: Vec<ShapeFailure> },

    #[error(transparent)]
    Mapping(#[from] MapError),

    #[error("invalid shape registry: {message}")]
    Registry { message: String },

    #[error("failed to export result to {}: {message}", path.display())]
    Export { path: PathBuf, message: String },

    #[error("renderer '{renderer}' does not support shape '{shape}'")]
    UnsupportedShape { shape: String, renderer: String },

    #[error("DataFrame operation failed: {message}")]
    DataFrame { message: String },
}

impl ShapeError {
    /// Variant name (the violation kind for contract failures), free of
    /// cell content.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnknownShape { .. } => "unknown_shape",
            Self::ShapeContract { violation, .. } => violation.kind(),
            Self::DuplicateShape { .. } => "duplicate_shape",
            Self::NoShapesRequested => "no_shapes_requested",
            Self::NoValidShapes { .. } => "no_valid_shapes",
            Self::Mapping(_) => "mapping",
            Self::Registry { .. } => "registry",
            Self::Export { .. } => "export",
            Self::UnsupportedShape { .. } => "unsupported_shape",
            Self::DataFrame { .. } => "dataframe",
        }
    }

    /// Column a contract failure is about.
    pub fn column(&self) -> Option<&str> {
        match self {
            Self::ShapeContract { column, .. } => Some(column),
            _ => None,
        }
    }

    /// Cell value behind a contract failure, if any.
    pub fn cell_value(&self) -> Option<String> {
        match self {
            Self::ShapeContract { violation, .. } => violation.cell_value(),
            _ => None,
        }
    }
}

fn describe_failures(failures: &[ShapeFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("[{}] {}", f.shape, f.error))
        .collect::<Vec<_>>()
        .join("; ")
}

impl From<polars::prelude::PolarsError> for ShapeError {
    fn from(err: polars::prelude::PolarsError) -> Self {
        Self::DataFrame {
            message: err.to_string(),
        }
    }
}

impl From<ModelError> for ShapeError {
    fn from(err: ModelError) -> Self {
        Self::Registry {
            message: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ShapeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contract_message_names_shape_column_and_violation() {
        let err = ShapeError::ShapeContract {
            shape: "proportion".to_string(),
            column: "proportion".to_string(),
            expected: SemanticType::Proportion,
            violation: Violation::OutOfRange { value: 1.5 },
        };
        assert_eq!(
            err.to_string(),
            "shape 'proportion' column 'proportion' (expected numeric fraction in [0, 1]): value 1.5 out of range"
        );
    }

    #[test]
    fn log_context_separates_value_from_kind() {
        let err = ShapeError::ShapeContract {
            shape: "upset".to_string(),
            column: "asthma".to_string(),
            expected: SemanticType::Indicator,
            violation: Violation::NotIndicator {
                value: "maybe".to_string(),
            },
        };
        assert_eq!(err.kind(), "not_indicator");
        assert_eq!(err.column(), Some("asthma"));
        assert_eq!(err.cell_value().as_deref(), Some("maybe"));

        let missing = ShapeError::UnknownShape {
            shape: "bar".to_string(),
        };
        assert_eq!(missing.kind(), "unknown_shape");
        assert_eq!(missing.cell_value(), None);
    }

    #[test]
    fn no_valid_shapes_lists_failures() {
        let err = ShapeError::NoValidShapes {
            failures: vec![ShapeFailure {
                shape: "pyramid".to_string(),
                error: ShapeError::UnknownShape {
                    shape: "pyramid".to_string(),
                },
            }],
        };
        assert_eq!(
            err.to_string(),
            "no requested shape could be built: [pyramid] unknown shape 'pyramid'"
        );
    }
}
