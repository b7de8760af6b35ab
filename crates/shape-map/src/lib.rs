//! Column mapping for the shape-contract pipeline.
//!
//! - **mapping**: declarative [`ColumnMapping`] and [`ColumnAliases`] types
//! - **engine**: [`map_columns`], [`map_sourced`] and [`require_columns`]
//! - **error**: [`MapError`]

pub mod engine;
pub mod error;
pub mod mapping;

pub use engine::{map_columns, map_sourced, require_columns};
pub use error::{MapError, Result};
pub use mapping::{ColumnAliases, ColumnMapping, ColumnSource, MappingEntry};
