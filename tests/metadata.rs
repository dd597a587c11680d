use std::collections::BTreeMap;
use std::path::Path;

use etd_depositor::load_config::Mappings;
use etd_depositor::metadata::{
    default_rights_notes, extract_package_data, process_contributors, process_date,
    process_degree, process_degree_abbreviation, process_degree_discipline,
    process_degree_level, process_description, process_language, process_subjects,
};

fn mappings() -> Mappings {
    let mut abbreviation = BTreeMap::new();
    abbreviation.insert("Doctor of Philosophy".to_string(), "Ph.D.".to_string());

    let mut discipline = BTreeMap::new();
    discipline.insert("PHD-01".to_string(), "Processing Studies".to_string());
    discipline.insert("MA-07".to_string(), "Communication".to_string());
    discipline.insert("MA-15".to_string(), "English".to_string());

    let mut lc_subject = BTreeMap::new();
    lc_subject.insert(
        "CODE1".to_string(),
        vec![
            vec!["a".to_string(), "TestCode1.".to_string()],
            vec![
                "a".to_string(),
                "Test2".to_string(),
                "x".to_string(),
                "Specify".to_string(),
            ],
        ],
    );
    lc_subject.insert(
        "CODE2".to_string(),
        vec![vec!["a".to_string(), "TestCode2.".to_string()]],
    );
    lc_subject.insert(
        "B001".to_string(),
        vec![vec!["a".to_string(), "Agriculture.".to_string()]],
    );
    lc_subject.insert(
        "B013".to_string(),
        vec![
            vec!["a".to_string(), "Wood.".to_string()],
            vec![
                "a".to_string(),
                "Forest products.".to_string(),
                "x".to_string(),
                "Biotechnology".to_string(),
            ],
        ],
    );

    Mappings {
        agreements: BTreeMap::new(),
        abbreviation,
        discipline,
        lc_subject,
        character_substitutions: BTreeMap::new(),
    }
}

const FULL_DOCUMENT: &str = r#"<thesis
xmlns="http://www.ndltd.org/standards/metadata/etdms/1.1/"
xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"
xmlns:dc="http://purl.org/dc/elements/1.1/"
xmlns:dcterms="http://purl.org/dc/terms/"
>
  <dc:title xml:lang="en">Title</dc:title>
  <dc:creator>Creator, Test</dc:creator>
  <dc:subject>CODE1</dc:subject>
  <dc:subject>CODE2</dc:subject>
  <dc:description role="abstract" xml:lang="en">
    &#233;Abstract
  </dc:description>
  <dc:publisher>Publisher</dc:publisher>
  <dc:contributor role="co-author">Contributor A</dc:contributor>
  <dc:contributor>Contributor B</dc:contributor>
  <dc:date>2021-01-01</dc:date>
  <dc:type>Electronic Thesis or Dissertation</dc:type>
  <dc:language>fre</dc:language>
  <degree>
    <name>Doctor of Philosophy</name>
    <level>2</level>
    <discipline>PHD-01</discipline>
    <grantor>Carleton University</grantor>
  </degree>
</thesis>"#;

#[test]
fn extracts_a_complete_package() {
    let data = extract_package_data(
        FULL_DOCUMENT,
        "StudentNumber_ThesisNumber",
        77,
        vec!["agreement_one".to_string(), "agreement_two".to_string()],
        Path::new("/a/path/here"),
        &mappings(),
    )
    .expect("a complete document should extract");

    assert_eq!(data.name, "StudentNumber_ThesisNumber");
    assert_eq!(
        data.source_identifier,
        "8fa99d4e9e189018f4781a5549d0f092616664c2d15403c4a83b3d62b967719d",
        "source identifier is the SHA-256 of the package name"
    );
    assert_eq!(data.title, "Title");
    assert_eq!(data.creator, "Creator, Test");
    assert_eq!(
        data.subjects,
        vec![
            vec!["a".to_string(), "TestCode1.".to_string()],
            vec![
                "a".to_string(),
                "Test2".to_string(),
                "x".to_string(),
                "Specify".to_string()
            ],
            vec!["a".to_string(), "TestCode2.".to_string()],
        ]
    );
    assert_eq!(data.abstract_text, "\u{00E9}Abstract");
    assert_eq!(data.publisher, "Publisher");
    assert_eq!(
        data.contributors,
        vec!["Contributor A (Co-author)", "Contributor B"]
    );
    assert_eq!(data.date, "2021-01-01");
    assert_eq!(data.year, "2021");
    assert_eq!(data.language, "fra");
    assert_eq!(data.agreements, vec!["agreement_one", "agreement_two"]);
    assert_eq!(data.degree.as_deref(), Some("Doctor of Philosophy"));
    assert_eq!(data.abbreviation.as_deref(), Some("Ph.D."));
    assert_eq!(data.discipline.as_deref(), Some("Processing Studies"));
    assert_eq!(data.level, "2");
    assert_eq!(data.doi, "10.22215/etd/2021-77");
    assert_eq!(data.rights_notes, default_rights_notes("2021"));
    assert_eq!(data.path, Path::new("/a/path/here"));
}

#[test]
fn empty_document_is_missing_title() {
    let xml = r#"<thesis xmlns:dc="http://purl.org/dc/elements/1.1/"></thesis>"#;
    let err = extract_package_data(xml, "x", 1, vec![], Path::new("/p"), &mappings())
        .expect_err("empty document should fail");
    assert!(err.to_string().contains("title tag is missing"));
}

#[test]
fn title_without_creator_is_missing_creator() {
    let xml = r#"<thesis xmlns:dc="http://purl.org/dc/elements/1.1/">
  <dc:title xml:lang="en">Title</dc:title>
</thesis>"#;
    let err = extract_package_data(xml, "x", 1, vec![], Path::new("/p"), &mappings())
        .expect_err("document without creator should fail");
    assert!(err.to_string().contains("creator tag is missing"));
}

#[test]
fn malformed_xml_is_a_metadata_error() {
    let err = extract_package_data("<thesis><dc:title>", "x", 1, vec![], Path::new("/p"), &mappings())
        .expect_err("malformed XML should fail");
    assert!(
        err.is_package_fault(),
        "XML parse errors fail the package, not the run"
    );
}

#[test]
fn subjects_concatenate_and_deduplicate() {
    let codes = vec![
        "  B001".to_string(),
        "B013  ".to_string(),
        "Unknown".to_string(),
        "B001 ".to_string(),
        " B013 ".to_string(),
    ];
    assert_eq!(
        process_subjects(&codes, &mappings()),
        vec![
            vec!["a".to_string(), "Agriculture.".to_string()],
            vec!["a".to_string(), "Wood.".to_string()],
            vec![
                "a".to_string(),
                "Forest products.".to_string(),
                "x".to_string(),
                "Biotechnology".to_string()
            ],
        ],
        "unknown codes are dropped and duplicate tuples keep first-seen order"
    );
}

#[test]
fn description_collapses_whitespace_and_substitutes_characters() {
    let mut mappings = mappings();
    assert_eq!(
        process_description("   \n\r   Abstract!\n  \n\r", &mappings),
        "Abstract!"
    );

    mappings
        .character_substitutions
        .insert("\u{2019}".to_string(), "'".to_string());
    mappings
        .character_substitutions
        .insert("\u{2013}".to_string(), "-".to_string());
    assert_eq!(
        process_description("It\u{2019}s fine \u{2013} mostly", &mappings),
        "It's fine - mostly"
    );
}

#[test]
fn contributors_render_with_capitalized_roles() {
    let contributors = vec![
        ("Kevin Bowrin".to_string(), None),
        ("James Ronin".to_string(), Some("co-author".to_string())),
    ];
    assert_eq!(
        process_contributors(&contributors),
        vec!["Kevin Bowrin", "James Ronin (Co-author)"]
    );
}

#[test]
fn date_parses_or_fails_with_named_value() {
    assert_eq!(
        process_date("2021-06-01").expect("valid date"),
        ("2021-06-01".to_string(), "2021".to_string())
    );
    assert_eq!(
        process_date("1900-06-01").expect("valid date").1,
        "1900"
    );

    let err = process_date("").expect_err("empty date should fail");
    assert!(err.to_string().contains("date tag is missing"));

    let err = process_date("13-13-13").expect_err("malformed date should fail");
    assert!(err
        .to_string()
        .contains("date value 13-13-13 is not properly formatted"));

    let err = process_date("BLAH").expect_err("malformed date should fail");
    assert!(err.to_string().contains("not properly formatted"));
}

#[test]
fn language_normalizes_or_rejects() {
    assert_eq!(process_language("fre").expect("known"), "fra");
    assert_eq!(process_language("fra").expect("known"), "fra");
    assert_eq!(process_language("ger").expect("known"), "deu");
    assert_eq!(process_language("deu").expect("known"), "deu");
    assert_eq!(process_language("spa").expect("known"), "spa");
    assert_eq!(process_language("eng").expect("known"), "eng");
    assert_eq!(process_language("").expect("blank defaults to English"), "eng");

    let err = process_language("bla").expect_err("unknown language should fail");
    assert!(err.to_string().contains("unexpected language bla found"));
}

#[test]
fn degree_expands_historical_truncations() {
    assert_eq!(
        process_degree("Master of Stuff").as_deref(),
        Some("Master of Stuff")
    );
    assert_eq!(
        process_degree(" Master of Stuff ").as_deref(),
        Some("Master of Stuff")
    );
    assert_eq!(
        process_degree("Master of Architectural Stud").as_deref(),
        Some("Master of Architectural Studies")
    );
    assert_eq!(
        process_degree("Master of Information Tech").as_deref(),
        Some("Master of Information Technology")
    );
    assert_eq!(process_degree(""), None, "a blank degree is unmapped, not fatal");
}

#[test]
fn degree_abbreviation_and_discipline_lookups() {
    let mappings = mappings();
    assert_eq!(
        process_degree_abbreviation(Some("Doctor of Philosophy"), &mappings).as_deref(),
        Some("Ph.D.")
    );
    assert_eq!(process_degree_abbreviation(Some("Unknown"), &mappings), None);
    assert_eq!(process_degree_abbreviation(None, &mappings), None);

    assert_eq!(
        process_degree_discipline("MA-07", &mappings).as_deref(),
        Some("Communication")
    );
    assert_eq!(
        process_degree_discipline("   MA-15   ", &mappings).as_deref(),
        Some("English")
    );
    assert_eq!(process_degree_discipline("Unknown", &mappings), None);
}

#[test]
fn degree_level_accepts_only_graduate_levels() {
    assert_eq!(process_degree_level("1").expect("master's"), "1");
    assert_eq!(process_degree_level("2").expect("doctoral"), "2");

    let err = process_degree_level("").expect_err("missing level should fail");
    assert!(err.to_string().contains("degree level is missing"));

    let err = process_degree_level("0").expect_err("undergraduate work should fail");
    assert!(err.to_string().contains("undergraduate work"));

    let err = process_degree_level("blah").expect_err("junk level should fail");
    assert!(err.to_string().contains("invalid degree level"));

    let err = process_degree_level("3").expect_err("out-of-range level should fail");
    assert!(err.to_string().contains("invalid degree level"));
}
