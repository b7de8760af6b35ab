//! Tests for shape-model serialization and option defaults.

use shape_model::{
    DispatchOptions, ExtraColumns, OnShapeError, Provenance, SemanticType, ShapeSpec,
    TranslateOptions, UnmappedPolicy,
};

#[test]
fn shape_spec_deserializes_from_toml() {
    let spec: ShapeSpec = toml::from_str(
        r#"
name = "dose_response"
extra = "keep"
description = "Dose against response rate"

[[columns]]
name = "dose"
type = "numeric"

[[columns]]
name = "response"
type = "proportion"
optional = true
"#,
    )
    .expect("parse spec");

    assert_eq!(spec.name(), "dose_response");
    assert_eq!(spec.extra(), ExtraColumns::Keep);
    assert_eq!(spec.columns().len(), 2);
    assert_eq!(spec.columns()[0].semantic_type, SemanticType::Numeric);
    assert!(spec.columns()[1].optional);
    assert_eq!(spec.description(), Some("Dose against response rate"));
}

#[test]
fn typed_extra_columns_deserialize() {
    let spec: ShapeSpec = toml::from_str(
        r#"
name = "flags"
extra = { typed = "indicator" }
min_extra = 2
"#,
    )
    .expect("parse spec");
    assert_eq!(spec.extra(), ExtraColumns::Typed(SemanticType::Indicator));
    assert_eq!(spec.min_extra(), 2);
}

#[test]
fn invalid_spec_is_rejected_during_deserialization() {
    let result: Result<ShapeSpec, _> = toml::from_str(
        r#"
name = "dup"
[[columns]]
name = "a"
type = "label"
[[columns]]
name = "a"
type = "count"
"#,
    );
    let err = result.unwrap_err().to_string();
    assert!(err.contains("declares column 'a' more than once"), "{err}");
}

#[test]
fn dispatch_options_parse_from_config() {
    let options: DispatchOptions = toml::from_str(r#"on_shape_error = "skip_shape""#).unwrap();
    assert_eq!(options.on_shape_error, OnShapeError::SkipShape);
    assert_eq!(DispatchOptions::default().on_shape_error, OnShapeError::Abort);
}

#[test]
fn unmapped_policy_defaults_to_keep() {
    assert_eq!(TranslateOptions::default().unmapped, UnmappedPolicy::Keep);
    assert_eq!(
        UnmappedPolicy::sentinel(),
        UnmappedPolicy::Sentinel("unknown".to_string())
    );
    let options: TranslateOptions = toml::from_str(r#"unmapped = { sentinel = "n/a" }"#).unwrap();
    assert_eq!(options.unmapped, UnmappedPolicy::Sentinel("n/a".to_string()));
}

#[test]
fn provenance_serializes_without_empty_description() {
    let provenance = Provenance {
        source_id: "demo".to_string(),
        checksum: "ab".repeat(32),
        record_count: 10,
        description: None,
    };
    let json = serde_json::to_value(&provenance).unwrap();
    assert_eq!(json["record_count"], 10);
    assert!(json.get("description").is_none());
}
