//! Integration tests for column mapping.

use polars::prelude::*;
use shape_map::{
    ColumnAliases, ColumnMapping, MapError, map_columns, map_sourced, require_columns,
};
use shape_model::SourcedFrame;

fn names(df: &DataFrame) -> Vec<String> {
    df.get_column_names()
        .into_iter()
        .map(|n| n.to_string())
        .collect()
}

fn patients() -> DataFrame {
    df! {
        "id" => &["p1", "p2", "p3"],
        "value" => &[34.0, 61.0, 7.0],
        "unit" => &["a", "a", "mo"],
        "sex" => &["248153007", "248152002", "248152002"],
    }
    .unwrap()
}

/// `extension` struct column holding an `age` struct with `value` and `code`.
fn nested_patients() -> DataFrame {
    patients()
        .lazy()
        .select([
            col("id"),
            as_struct(vec![col("value"), col("unit").alias("code")]).alias("age"),
        ])
        .select([
            col("id"),
            as_struct(vec![col("age")]).alias("extension"),
        ])
        .collect()
        .unwrap()
}

#[test]
fn missing_column_fails_without_partial_output() {
    let df = patients();
    let mapping = ColumnMapping::new()
        .rename("id", "subject")
        .rename("birth_sex", "gender");

    let err = map_columns(&df, &mapping).unwrap_err();
    match err {
        MapError::MissingColumn { path } => assert_eq!(path, "birth_sex"),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(names(&df), vec!["id", "value", "unit", "sex"]);
}

#[test]
fn unreferenced_columns_follow_in_original_order() {
    let mapping = ColumnMapping::from_pairs([("sex", "gender"), ("id", "subject")]);
    let mapped = map_columns(&patients(), &mapping).unwrap();
    assert_eq!(names(&mapped), vec!["gender", "subject", "value", "unit"]);
}

#[test]
fn exclusive_mapping_keeps_only_targets() {
    let mapping = ColumnMapping::from_pairs([("value", "age")]).exclusive();
    let mapped = map_columns(&patients(), &mapping).unwrap();
    assert_eq!(names(&mapped), vec!["age"]);
    assert_eq!(mapped.height(), 3);
}

#[test]
fn later_entry_wins_for_duplicate_target() {
    let mapping = ColumnMapping::new()
        .rename("id", "subject")
        .rename("unit", "age_unit")
        .constant("anonymous", "subject");
    let mapped = map_columns(&patients(), &mapping).unwrap();

    assert_eq!(names(&mapped), vec!["subject", "age_unit", "value", "sex"]);
    let subject = mapped.column("subject").unwrap().str().unwrap();
    assert_eq!(subject.get(0), Some("anonymous"));
    assert_eq!(subject.get(2), Some("anonymous"));
}

#[test]
fn dotted_paths_descend_into_structs() {
    let df = nested_patients();
    let mapping = ColumnMapping::from_pairs([
        ("id", "subject"),
        ("extension.age.value", "age"),
        ("extension.age.code", "age_unit"),
    ])
    .exclusive();

    let mapped = map_columns(&df, &mapping).unwrap();
    assert_eq!(names(&mapped), vec!["subject", "age", "age_unit"]);
    let ages = mapped.column("age").unwrap().f64().unwrap();
    assert_eq!(ages.get(1), Some(61.0));
    let units = mapped.column("age_unit").unwrap().str().unwrap();
    assert_eq!(units.get(2), Some("mo"));
}

#[test]
fn dotted_path_into_flat_column_is_missing() {
    let mapping = ColumnMapping::from_pairs([("id.value", "x")]);
    let err = map_columns(&patients(), &mapping).unwrap_err();
    assert!(matches!(err, MapError::MissingColumn { ref path } if path == "id.value"), "{err}");
}

#[test]
fn missing_struct_field_is_missing_column() {
    let mapping = ColumnMapping::from_pairs([("extension.age.unit", "x")]);
    let err = map_columns(&nested_patients(), &mapping).unwrap_err();
    assert!(matches!(err, MapError::MissingColumn { .. }), "{err}");
}

#[test]
fn mapping_loads_from_toml() {
    let mapping: ColumnMapping = toml::from_str(
        r#"
exclusive = true

[[entries]]
target = "subject"
source = { strip_prefix = { path = "id", prefix = "p" } }

[[entries]]
target = "study"
source = { constant = "demo" }
"#,
    )
    .unwrap();

    let mapped = map_columns(&patients(), &mapping).unwrap();
    assert_eq!(names(&mapped), vec!["subject", "study"]);
    let subject = mapped.column("subject").unwrap().str().unwrap();
    assert_eq!(subject.get(0), Some("1"));
}

#[test]
fn sourced_mapping_records_lineage() {
    let frame = SourcedFrame::new(patients());
    let mapping = ColumnMapping::from_pairs([("sex", "gender")]);
    let mapped = map_sourced(&frame, &mapping).unwrap();

    assert!(mapped.provenance().is_none());
    assert_eq!(mapped.lineage().len(), 1);
    assert_eq!(mapped.lineage()[0].to_string(), "map_columns(gender)");
    assert!(frame.lineage().is_empty());
}

#[test]
fn require_columns_reports_every_missing_column() {
    let df = patients();
    let aliases = ColumnAliases::new().with("subject", "id");

    assert!(require_columns(&df, &["subject", "value"], &aliases).is_ok());

    let err = require_columns(&df, &["subject", "label", "proportion"], &aliases).unwrap_err();
    match err {
        MapError::MissingColumns { columns } => {
            assert_eq!(columns, vec!["label".to_string(), "proportion".to_string()]);
        }
        other => panic!("unexpected error: {other}"),
    }
}
