//! Contract checks and column coercion.
//!
//! Each declared column is looked up by its own name first, then through
//! the caller's aliases. Accepted columns are coerced to the canonical dtype
//! of their semantic type:
//!
//! | type         | accepted input                          | output    |
//! |--------------|-----------------------------------------|-----------|
//! | `label`      | string                                  | String    |
//! | `proportion` | numeric or numeric strings, `0..=1`     | Float64   |
//! | `indicator`  | boolean, 0/1, `"0"`/`"1"`/`"true"`/`"false"` | Boolean |
//! | `age`        | numeric, `>= 0`                         | Float64   |
//! | `count`      | integral numeric, `>= 0`                | Int64     |
//! | `numeric`    | finite numeric                          | Float64   |
//!
//! Nulls fail every type. Values are never clamped or rounded.

use std::collections::BTreeSet;

use polars::prelude::{AnyValue, Column, DataFrame, DataType};
use shape_common::{any_to_f64, dtype_is_numeric, format_numeric, parse_bool};
use shape_map::ColumnAliases;
use shape_model::{ColumnSpec, ExtraColumns, SemanticType, ShapeSpec};
use tracing::debug;

use crate::error::{Result, ShapeError, Violation};

/// Column name reported when the extra-column minimum is not met.
const EXTRA_COLUMNS: &str = "<extra>";

/// Validate `df` against `spec`, returning the coerced frame.
///
/// Output columns are the declared ones in declared order, followed by the
/// other input columns when the contract keeps or types them.
pub fn validate_shape(
    df: &DataFrame,
    spec: &ShapeSpec,
    aliases: Option<&ColumnAliases>,
) -> Result<DataFrame> {
    if spec.is_identity() {
        return Ok(df.clone());
    }

    let mut used: BTreeSet<String> = spec.columns().iter().map(|c| c.name.clone()).collect();
    let mut output = Vec::with_capacity(df.width());
    for column_spec in spec.columns() {
        if let Some(column) = resolve_declared(df, spec, column_spec, aliases, &mut used)? {
            output.push(column);
        }
    }

    let extras: Vec<&Column> = df
        .get_columns()
        .iter()
        .filter(|c| !used.contains(c.name().as_str()))
        .collect();
    if extras.len() < spec.min_extra() {
        return Err(ShapeError::ShapeContract {
            shape: spec.name().to_string(),
            column: EXTRA_COLUMNS.to_string(),
            expected: match spec.extra() {
                ExtraColumns::Typed(t) => t,
                ExtraColumns::Drop | ExtraColumns::Keep => SemanticType::Label,
            },
            violation: Violation::TooFewExtra {
                found: extras.len(),
                required: spec.min_extra(),
            },
        });
    }

    match spec.extra() {
        ExtraColumns::Drop => {}
        ExtraColumns::Keep => output.extend(extras.into_iter().cloned()),
        ExtraColumns::Typed(semantic_type) => {
            for column in extras {
                let coerced = coerce_column(column, semantic_type)
                    .map_err(|v| contract(spec, column.name().as_str(), semantic_type, v))?;
                output.push(coerced);
            }
        }
    }

    debug!(
        shape = spec.name(),
        rows = df.height(),
        columns = output.len(),
        "validated shape"
    );
    Ok(DataFrame::new(output)?)
}

fn resolve_declared(
    df: &DataFrame,
    spec: &ShapeSpec,
    column_spec: &ColumnSpec,
    aliases: Option<&ColumnAliases>,
    used: &mut BTreeSet<String>,
) -> Result<Option<Column>> {
    let name = column_spec.name.as_str();
    let semantic_type = column_spec.semantic_type;

    let direct_violation = match df.column(name) {
        Ok(column) => match coerce_column(column, semantic_type) {
            Ok(coerced) => return Ok(Some(coerced)),
            Err(violation) => Some(violation),
        },
        Err(_) => None,
    };

    let alias = aliases
        .and_then(|a| a.get(name))
        .filter(|actual| *actual != name);
    if let Some(actual) = alias
        && let Ok(source) = df.column(actual)
    {
        used.insert(actual.to_string());
        let renamed = source.clone().with_name(name.into());
        return coerce_column(&renamed, semantic_type)
            .map(Some)
            .map_err(|v| contract(spec, name, semantic_type, v));
    }

    match direct_violation {
        Some(violation) => Err(contract(spec, name, semantic_type, violation)),
        None if column_spec.optional => Ok(None),
        None => Err(contract(spec, name, semantic_type, Violation::Missing)),
    }
}

fn contract(spec: &ShapeSpec, column: &str, expected: SemanticType, violation: Violation) -> ShapeError {
    ShapeError::ShapeContract {
        shape: spec.name().to_string(),
        column: column.to_string(),
        expected,
        violation,
    }
}

/// Check one column against a semantic type and coerce it.
///
/// The column keeps its name.
pub fn coerce_column(column: &Column, semantic_type: SemanticType) -> std::result::Result<Column, Violation> {
    let nulls = column.null_count();
    if nulls > 0 {
        return Err(Violation::Null { count: nulls });
    }

    match semantic_type {
        SemanticType::Label => match column.dtype() {
            DataType::String => Ok(column.clone()),
            other => Err(wrong_type(other)),
        },
        SemanticType::Indicator => coerce_indicator(column),
        SemanticType::Proportion => {
            let values = numeric_values(column)?;
            if let Some(v) = values.iter().find(|v| !(0.0..=1.0).contains(*v)) {
                return Err(Violation::OutOfRange { value: *v });
            }
            Ok(Column::new(column.name().clone(), values))
        }
        SemanticType::Age => {
            let values = numeric_values(column)?;
            check_non_negative(&values)?;
            Ok(Column::new(column.name().clone(), values))
        }
        SemanticType::Count => {
            let values = numeric_values(column)?;
            check_non_negative(&values)?;
            if let Some(v) = values.iter().find(|v| v.fract() != 0.0) {
                return Err(Violation::NotIntegral { value: *v });
            }
            let counts: Vec<i64> = values.iter().map(|v| *v as i64).collect();
            Ok(Column::new(column.name().clone(), counts))
        }
        SemanticType::Numeric => {
            let values = numeric_values(column)?;
            if let Some(v) = values.iter().find(|v| !v.is_finite()) {
                return Err(Violation::OutOfRange { value: *v });
            }
            Ok(Column::new(column.name().clone(), values))
        }
    }
}

fn wrong_type(dtype: &DataType) -> Violation {
    Violation::WrongType {
        actual: dtype.to_string(),
    }
}

fn check_non_negative(values: &[f64]) -> std::result::Result<(), Violation> {
    if let Some(v) = values.iter().find(|v| !v.is_finite()) {
        return Err(Violation::OutOfRange { value: *v });
    }
    if let Some(v) = values.iter().find(|v| **v < 0.0) {
        return Err(Violation::Negative { value: *v });
    }
    Ok(())
}

/// All cells as `f64`. Strings must parse as numbers.
fn numeric_values(column: &Column) -> std::result::Result<Vec<f64>, Violation> {
    let dtype = column.dtype();
    if !dtype_is_numeric(dtype) && !matches!(dtype, DataType::String) {
        return Err(wrong_type(dtype));
    }
    let mut values = Vec::with_capacity(column.len());
    for idx in 0..column.len() {
        let value = column.get(idx).unwrap_or(AnyValue::Null);
        match any_to_f64(value) {
            Some(v) => values.push(v),
            None => {
                return Err(Violation::WrongType {
                    actual: format!("{dtype} with non-numeric values"),
                });
            }
        }
    }
    Ok(values)
}

fn coerce_indicator(column: &Column) -> std::result::Result<Column, Violation> {
    let dtype = column.dtype();
    if matches!(dtype, DataType::Boolean) {
        return Ok(column.clone());
    }

    let mut flags = Vec::with_capacity(column.len());
    if dtype_is_numeric(dtype) {
        for v in numeric_values(column)? {
            if v == 0.0 {
                flags.push(false);
            } else if v == 1.0 {
                flags.push(true);
            } else {
                return Err(Violation::NotIndicator {
                    value: format_numeric(v),
                });
            }
        }
    } else if let Ok(strings) = column.str() {
        for value in strings.into_iter().flatten() {
            match parse_bool(value) {
                Some(flag) => flags.push(flag),
                None => {
                    return Err(Violation::NotIndicator {
                        value: value.to_string(),
                    });
                }
            }
        }
    } else {
        return Err(wrong_type(dtype));
    }
    Ok(Column::new(column.name().clone(), flags))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column<const N: usize>(values: [f64; N]) -> Column {
        Column::new("x".into(), values)
    }

    #[test]
    fn proportion_rejects_out_of_range_without_clamping() {
        let err = coerce_column(&column([0.2, 1.5]), SemanticType::Proportion).unwrap_err();
        assert_eq!(err, Violation::OutOfRange { value: 1.5 });
    }

    #[test]
    fn proportion_accepts_numeric_strings() {
        let strings = Column::new("x".into(), ["0.25", "1"]);
        let coerced = coerce_column(&strings, SemanticType::Proportion).unwrap();
        assert_eq!(coerced.dtype(), &DataType::Float64);
        assert_eq!(coerced.f64().unwrap().get(0), Some(0.25));
    }

    #[test]
    fn count_requires_integral_non_negative() {
        assert_eq!(
            coerce_column(&column([1.0, 2.5]), SemanticType::Count).unwrap_err(),
            Violation::NotIntegral { value: 2.5 }
        );
        assert_eq!(
            coerce_column(&column([-1.0]), SemanticType::Count).unwrap_err(),
            Violation::Negative { value: -1.0 }
        );
        let counts = coerce_column(&column([3.0, 0.0]), SemanticType::Count).unwrap();
        assert_eq!(counts.dtype(), &DataType::Int64);
    }

    #[test]
    fn indicator_tokens() {
        let tokens = Column::new("x".into(), ["1", "false", "TRUE"]);
        let flags = coerce_column(&tokens, SemanticType::Indicator).unwrap();
        let values: Vec<Option<bool>> = flags.bool().unwrap().into_iter().collect();
        assert_eq!(values, vec![Some(true), Some(false), Some(true)]);

        let numbers = Column::new("x".into(), [0i64, 2]);
        assert_eq!(
            coerce_column(&numbers, SemanticType::Indicator).unwrap_err(),
            Violation::NotIndicator {
                value: "2".to_string()
            }
        );
    }

    #[test]
    fn nulls_fail_every_type() {
        let with_null = Column::new("x".into(), [Some("a"), None]);
        assert_eq!(
            coerce_column(&with_null, SemanticType::Label).unwrap_err(),
            Violation::Null { count: 1 }
        );
    }

    #[test]
    fn label_requires_strings() {
        assert!(matches!(
            coerce_column(&column([1.0]), SemanticType::Label),
            Err(Violation::WrongType { .. })
        ));
    }

    #[test]
    fn age_and_numeric() {
        assert_eq!(
            coerce_column(&column([-0.5]), SemanticType::Age).unwrap_err(),
            Violation::Negative { value: -0.5 }
        );
        assert!(matches!(
            coerce_column(&column([f64::NAN]), SemanticType::Numeric),
            Err(Violation::OutOfRange { .. })
        ));
        let ages = Column::new("x".into(), [30i32, 41]);
        assert_eq!(
            coerce_column(&ages, SemanticType::Age).unwrap().dtype(),
            &DataType::Float64
        );
    }
}
