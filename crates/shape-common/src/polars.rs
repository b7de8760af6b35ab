//! Polars AnyValue utility functions.
//!
//! Helpers for turning dataframe cells into lookup keys and numbers. Shape
//! validation and term translation both work cell-by-cell on these.

use polars::prelude::{AnyValue, Column, DataType, PolarsResult};

/// Converts a Polars `AnyValue` to a `String` representation.
///
/// Returns an empty string for `Null` and formats floats without trailing
/// zeros. Booleans render as `true`/`false`.
///
/// # Examples
///
/// ```
/// use polars::prelude::AnyValue;
/// use shape_common::any_to_string;
///
/// assert_eq!(any_to_string(AnyValue::Null), "");
/// assert_eq!(any_to_string(AnyValue::Int32(42)), "42");
/// assert_eq!(any_to_string(AnyValue::Boolean(true)), "true");
/// ```
pub fn any_to_string(value: AnyValue<'_>) -> String {
    match value {
        AnyValue::Null => String::new(),
        AnyValue::Int8(v) => v.to_string(),
        AnyValue::Int16(v) => v.to_string(),
        AnyValue::Int32(v) => v.to_string(),
        AnyValue::Int64(v) => v.to_string(),
        AnyValue::UInt8(v) => v.to_string(),
        AnyValue::UInt16(v) => v.to_string(),
        AnyValue::UInt32(v) => v.to_string(),
        AnyValue::UInt64(v) => v.to_string(),
        AnyValue::Float32(v) => format_numeric(f64::from(v)),
        AnyValue::Float64(v) => format_numeric(v),
        AnyValue::String(s) => s.to_string(),
        AnyValue::StringOwned(s) => s.to_string(),
        AnyValue::Boolean(b) => b.to_string(),
        other => other.to_string(),
    }
}

/// Returns the lookup key for a cell, or `None` for nulls.
///
/// Keys are the exact string form of the cell; no trimming or case folding
/// is applied because coded terms are case-sensitive. List cells (coded
/// columns of flattened FHIR resources) are keyed by their first element;
/// an empty list has no key.
pub fn cell_key(value: AnyValue<'_>) -> Option<String> {
    match value {
        AnyValue::Null => None,
        AnyValue::List(items) => items.get(0).ok().and_then(cell_key),
        other => Some(any_to_string(other)),
    }
}

/// Lookup keys for every cell of a column, in row order.
pub fn column_keys(column: &Column) -> PolarsResult<Vec<Option<String>>> {
    (0..column.len())
        .map(|idx| column.get(idx).map(cell_key))
        .collect()
}

/// Formats a floating-point number as a string without trailing zeros.
///
/// # Examples
///
/// ```
/// use shape_common::format_numeric;
///
/// assert_eq!(format_numeric(1.0), "1");
/// assert_eq!(format_numeric(0.25), "0.25");
/// assert_eq!(format_numeric(0.0), "0");
/// ```
pub fn format_numeric(v: f64) -> String {
    let s = format!("{v}");
    if !s.contains('.') {
        return s;
    }
    let trimmed = s.trim_end_matches('0').trim_end_matches('.');
    if trimmed.is_empty() || trimmed == "-" {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Converts an `AnyValue` to `f64`, returning `None` for non-numeric or null values.
///
/// Handles integer types, floating-point types, and numeric strings.
pub fn any_to_f64(value: AnyValue<'_>) -> Option<f64> {
    match value {
        AnyValue::Null => None,
        AnyValue::Int8(v) => Some(f64::from(v)),
        AnyValue::Int16(v) => Some(f64::from(v)),
        AnyValue::Int32(v) => Some(f64::from(v)),
        AnyValue::Int64(v) => Some(v as f64),
        AnyValue::UInt8(v) => Some(f64::from(v)),
        AnyValue::UInt16(v) => Some(f64::from(v)),
        AnyValue::UInt32(v) => Some(f64::from(v)),
        AnyValue::UInt64(v) => Some(v as f64),
        AnyValue::Float32(v) => Some(f64::from(v)),
        AnyValue::Float64(v) => Some(v),
        AnyValue::String(s) => parse_f64(s),
        AnyValue::StringOwned(s) => parse_f64(&s),
        AnyValue::List(items) => items.get(0).ok().and_then(any_to_f64),
        _ => None,
    }
}

/// Parses a string as `f64`, returning `None` for invalid or empty strings.
pub fn parse_f64(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok()
}

/// Parses an indicator token: `1`/`0`, `true`/`false` (case-insensitive).
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" => Some(true),
        "0" | "false" => Some(false),
        _ => None,
    }
}

/// True for the primitive integer and float dtypes.
pub fn dtype_is_numeric(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::{NamedFrom, Series};

    #[test]
    fn test_any_to_string_null() {
        assert_eq!(any_to_string(AnyValue::Null), "");
    }

    #[test]
    fn test_any_to_string_numbers() {
        assert_eq!(any_to_string(AnyValue::Int64(-100)), "-100");
        assert_eq!(any_to_string(AnyValue::Float64(0.5)), "0.5");
        assert_eq!(any_to_string(AnyValue::Float64(10.0)), "10");
    }

    #[test]
    fn test_cell_key() {
        assert_eq!(cell_key(AnyValue::Null), None);
        assert_eq!(
            cell_key(AnyValue::String("http://snomed.info/sct|248153007")),
            Some("http://snomed.info/sct|248153007".to_string())
        );
        assert_eq!(cell_key(AnyValue::String("")), Some(String::new()));
    }

    #[test]
    fn test_column_keys() {
        let column = Column::new("code".into(), [Some(248153007i64), None]);
        assert_eq!(
            column_keys(&column).unwrap(),
            vec![Some("248153007".to_string()), None]
        );
    }

    #[test]
    fn test_list_cells_use_first_element() {
        let codes = Series::new("code".into(), ["http://snomed.info/sct|248153007", "other"]);
        assert_eq!(
            cell_key(AnyValue::List(codes)),
            Some("http://snomed.info/sct|248153007".to_string())
        );
        let empty = Series::new_empty("code".into(), &DataType::String);
        assert_eq!(cell_key(AnyValue::List(empty)), None);
        assert_eq!(
            any_to_f64(AnyValue::List(Series::new("age".into(), [34.0f64]))),
            Some(34.0)
        );

        let column = Column::new(
            "code".into(),
            [
                Series::new("".into(), ["a|1"]),
                Series::new("".into(), ["b|2", "c|3"]),
            ],
        );
        assert_eq!(
            column_keys(&column).unwrap(),
            vec![Some("a|1".to_string()), Some("b|2".to_string())]
        );
    }

    #[test]
    fn test_format_numeric_keeps_integers() {
        assert_eq!(format_numeric(100.0), "100");
        assert_eq!(format_numeric(-0.0), "-0");
        assert_eq!(format_numeric(1.50), "1.5");
    }

    #[test]
    fn test_any_to_f64() {
        assert_eq!(any_to_f64(AnyValue::Int32(3)), Some(3.0));
        assert_eq!(any_to_f64(AnyValue::String(" 0.8 ")), Some(0.8));
        assert_eq!(any_to_f64(AnyValue::String("n/a")), None);
        assert_eq!(any_to_f64(AnyValue::Boolean(true)), None);
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("1"), Some(true));
        assert_eq!(parse_bool(" FALSE "), Some(false));
        assert_eq!(parse_bool("yes"), None);
    }

    #[test]
    fn test_dtype_is_numeric() {
        assert!(dtype_is_numeric(&DataType::Float64));
        assert!(dtype_is_numeric(&DataType::UInt8));
        assert!(!dtype_is_numeric(&DataType::String));
        assert!(!dtype_is_numeric(&DataType::Boolean));
    }
}
