//! Integration tests for taxonomy loading and term translation.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use polars::prelude::*;
use proptest::prelude::*;
use shape_model::{Provenance, SourcedFrame, TranslateOptions, UnmappedPolicy};
use shape_terms::{
    SectionKey, TaxonomyError, TaxonomyTable, TermColumn, TermError, Translator,
    load_named_taxonomy, load_taxonomy, translate, translate_sourced,
};

const MALE: &str = "http://snomed.info/sct|248153007";
const FEMALE: &str = "http://snomed.info/sct|248152002";
const UNKNOWN: &str = "http://snomed.info/sct|999999999";

fn data_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/data")
}

fn taxonomy() -> TaxonomyTable {
    load_taxonomy(&data_dir().join("clinical.toml")).unwrap()
}

fn strings(df: &DataFrame, name: &str) -> Vec<Option<String>> {
    df.column(name)
        .unwrap()
        .str()
        .unwrap()
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect()
}

#[test]
fn gender_codes_keep_unmapped_terms_by_default() {
    let df = df! { "gender" => &[MALE, UNKNOWN] }.unwrap();
    let out = translate(&df, &taxonomy(), &[TermColumn::new("gender")]).unwrap();
    assert_eq!(
        strings(&out, "gender"),
        vec![Some("male".to_string()), Some(UNKNOWN.to_string())]
    );
}

#[test]
fn strict_mode_rejects_unmapped_terms() {
    let df = df! { "gender" => &[MALE, UNKNOWN] }.unwrap();
    let tx = taxonomy();
    let err = Translator::new(&tx)
        .with_options(TranslateOptions::strict())
        .translate(&df, &[TermColumn::new("gender")])
        .unwrap_err();
    match err {
        TermError::UnmappedTerm {
            column,
            section,
            value,
        } => {
            assert_eq!(column, "gender");
            assert_eq!(section, "gender");
            assert_eq!(value, UNKNOWN);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn other_columns_are_untouched() {
    let df = df! {
        "subject" => &["p1", "p2"],
        "gender" => &[FEMALE, MALE],
        "age" => &[41.0, 7.0],
    }
    .unwrap();
    let out = translate(&df, &taxonomy(), &[TermColumn::new("gender")]).unwrap();
    assert_eq!(out.get_column_names(), df.get_column_names());
    for name in ["subject", "age"] {
        let before = df.column(name).unwrap().as_materialized_series();
        let after = out.column(name).unwrap().as_materialized_series();
        assert!(after.equals(before), "{name} changed");
    }
    assert_eq!(strings(&df, "gender")[0].as_deref(), Some(FEMALE));
}

#[test]
fn column_resolves_to_section_by_normalized_name() {
    let df = df! {
        "presence_absence" => &["http://snomed.info/sct|373066001", "http://snomed.info/sct|373067005"],
    }
    .unwrap();
    let out = translate(&df, &taxonomy(), &[TermColumn::new("presence_absence")]).unwrap();
    let flags: Vec<Option<bool>> = out.column("presence_absence").unwrap().bool().unwrap().into_iter().collect();
    assert_eq!(flags, vec![Some(true), Some(false)]);
}

#[test]
fn explicit_section_overrides_column_name() {
    let df = df! { "sex" => &[MALE] }.unwrap();
    let out = translate(&df, &taxonomy(), &[TermColumn::new("sex").in_section("gender")]).unwrap();
    assert_eq!(strings(&out, "sex"), vec![Some("male".to_string())]);

    let err = translate(&df, &taxonomy(), &[TermColumn::new("sex")]).unwrap_err();
    assert!(matches!(err, TermError::SectionResolution { .. }), "{err}");
}

#[test]
fn missing_column_is_reported() {
    let df = df! { "sex" => &[MALE] }.unwrap();
    let err = translate(&df, &taxonomy(), &[TermColumn::new("gender")]).unwrap_err();
    assert!(matches!(err, TermError::MissingColumn { ref column } if column == "gender"));
}

#[test]
fn drop_nulls_removes_untranslatable_rows() {
    let df = df! {
        "subject" => &["p1", "p2", "p3"],
        "outcome" => &[Some("http://snomed.info/sct|371827001"), None, Some("http://snomed.info/sct|306689006")],
    }
    .unwrap();
    let out = translate(&df, &taxonomy(), &[TermColumn::new("outcome").drop_nulls()]).unwrap();
    assert_eq!(out.height(), 2);
    assert_eq!(
        strings(&out, "subject"),
        vec![Some("p1".to_string()), Some("p3".to_string())]
    );
}

#[test]
fn sourced_translation_keeps_provenance() {
    let provenance = Arc::new(Provenance {
        source_id: "demo".to_string(),
        checksum: "ab".repeat(32),
        record_count: 2,
        description: None,
    });
    let frame = SourcedFrame::from_source(df! { "gender" => &[MALE, FEMALE] }.unwrap(), provenance);
    let out = translate_sourced(
        &frame,
        &taxonomy(),
        &[TermColumn::new("gender")],
        &TranslateOptions::new().with_unmapped(UnmappedPolicy::Null),
    )
    .unwrap();
    assert_eq!(out.provenance().map(|p| p.source_id.as_str()), Some("demo"));
    assert_eq!(out.lineage().last().map(ToString::to_string).as_deref(), Some("translate(gender)"));
}

#[test]
fn named_loading_accepts_optional_extension() {
    let dir = data_dir();
    let with_ext = load_named_taxonomy(&dir, "clinical.toml").unwrap();
    let without = load_named_taxonomy(&dir, "clinical").unwrap();
    assert_eq!(with_ext, without);
    assert_eq!(without.name(), "clinical");
    assert_eq!(
        without.namespace(SectionKey::OUTCOME).unwrap().code_for("death"),
        Some("http://snomed.info/sct|419099009")
    );

    let err = load_named_taxonomy(&dir, "notfound").unwrap_err();
    assert!(matches!(err, TaxonomyError::NotFound { .. }), "{err}");
}

#[test]
fn label_key_collision_in_file_fails_to_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.toml");
    std::fs::write(&path, "[outcome]\nalive = \"death\"\ndeath = \"gone\"\n").unwrap();
    assert!(matches!(
        load_taxonomy(&path),
        Err(TaxonomyError::LabelIsKey { .. })
    ));
}

fn code() -> impl Strategy<Value = Option<String>> {
    prop_oneof![
        Just(Some(MALE.to_string())),
        Just(Some(FEMALE.to_string())),
        Just(Some("male".to_string())),
        Just(None),
        "[a-z|0-9]{1,12}".prop_map(Some),
    ]
}

fn policy() -> impl Strategy<Value = UnmappedPolicy> {
    prop_oneof![
        Just(UnmappedPolicy::Keep),
        Just(UnmappedPolicy::sentinel()),
        Just(UnmappedPolicy::Null),
    ]
}

fn presence() -> impl Strategy<Value = Option<String>> {
    prop_oneof![
        Just(Some("http://snomed.info/sct|373066001".to_string())),
        Just(Some("http://snomed.info/sct|373067005".to_string())),
        Just(Some("true".to_string())),
        Just(Some("unknown".to_string())),
        Just(None),
        "[a-z|0-9]{1,12}".prop_map(Some),
    ]
}

proptest! {
    #[test]
    fn flag_translation_is_idempotent(values in proptest::collection::vec(presence(), 0..20), policy in policy()) {
        let tx = taxonomy();
        let translator = Translator::new(&tx)
            .with_options(TranslateOptions::new().with_unmapped(policy));
        let df = DataFrame::new(vec![Column::new("presence_absence".into(), values)]).unwrap();
        let columns = [TermColumn::new("presence_absence")];

        let once = translator.translate(&df, &columns).unwrap();
        let twice = translator.translate(&once, &columns).unwrap();
        prop_assert!(once.equals_missing(&twice));
    }

    #[test]
    fn translation_is_idempotent(values in proptest::collection::vec(code(), 0..20), policy in policy()) {
        let tx = taxonomy();
        let translator = Translator::new(&tx)
            .with_options(TranslateOptions::new().with_unmapped(policy));
        let df = DataFrame::new(vec![Column::new("gender".into(), values)]).unwrap();
        let columns = [TermColumn::new("gender")];

        let once = translator.translate(&df, &columns).unwrap();
        let twice = translator.translate(&once, &columns).unwrap();
        prop_assert!(once.equals_missing(&twice));
    }
}
