use std::fs;

use etd_depositor::load_config::load_mappings;

const MAPPINGS_YAML: &str = r#"
agreements:
  "FIPPA":
    identifier: fs
    required: true
  "LAC Non-Exclusive License":
    identifier: lnel
    required: false
abbreviation:
  "Doctor of Philosophy": "Ph.D."
discipline:
  "MA-07": "Communication"
lc_subject:
  "B001":
    - ["a", "Agriculture."]
  "B013":
    - ["a", "Wood."]
    - ["a", "Forest products.", "x", "Biotechnology"]
character_substitutions:
  "’": "'"
"#;

#[test]
fn parses_a_well_formed_mappings_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("mappings.yaml");
    fs::write(&path, MAPPINGS_YAML).expect("write mappings");

    let mappings = load_mappings(&path).expect("mappings should parse");

    assert_eq!(mappings.agreements["FIPPA"].identifier, "fs");
    assert!(mappings.agreements["FIPPA"].required);
    assert!(!mappings.agreements["LAC Non-Exclusive License"].required);
    assert_eq!(mappings.abbreviation["Doctor of Philosophy"], "Ph.D.");
    assert_eq!(mappings.discipline["MA-07"], "Communication");
    assert_eq!(mappings.lc_subject["B013"].len(), 2);
    assert_eq!(mappings.character_substitutions["\u{2019}"], "'");
}

#[test]
fn missing_file_is_an_error() {
    let err = load_mappings("/definitely/not/here.yaml").expect_err("missing file should fail");
    assert!(err.to_string().contains("Failed to read mappings file"));
}

#[test]
fn malformed_yaml_is_an_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("mappings.yaml");
    fs::write(&path, "agreements: [not, a, map").expect("write mappings");

    let err = load_mappings(&path).expect_err("malformed YAML should fail");
    assert!(err.to_string().contains("Failed to parse mappings YAML"));
}

#[test]
fn repository_example_mappings_parse() {
    let mappings = load_mappings("mappings.yaml").expect("the shipped example should parse");
    assert!(mappings.agreements.contains_key("FIPPA"));
    assert!(!mappings.lc_subject.is_empty());
}
