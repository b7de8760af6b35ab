use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("shape name must not be empty")]
    EmptyShapeName,
    #[error("shape '{shape}' declares column '{column}' more than once")]
    DuplicateColumn { shape: String, column: String },
    #[error("shape '{shape}' declares an empty column name")]
    EmptyColumnName { shape: String },
}

pub type Result<T> = std::result::Result<T, ModelError>;
