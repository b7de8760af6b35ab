//! Shared utilities for the shape-contract crates.
//!
//! This crate provides Polars `AnyValue` helpers used by the mapper, the
//! translator and the shape validator, plus the `tracing` subscriber setup
//! that embedding applications call once at startup.

pub mod logging;
pub mod polars;

pub use polars::{
    any_to_f64, any_to_string, cell_key, column_keys, dtype_is_numeric, format_numeric, parse_bool, parse_f64,
};
