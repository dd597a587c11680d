use std::path::PathBuf;

use etd_depositor::crossref::{split_creator, CrossrefBatch};
use etd_depositor::package::{CompletedPackage, PackageData, StagedPackage};

fn completed(creator: &str) -> CompletedPackage {
    CompletedPackage {
        staged: StagedPackage {
            data: PackageData {
                name: "pkg".to_string(),
                source_identifier: String::new(),
                title: "Title".to_string(),
                creator: creator.to_string(),
                subjects: vec![],
                abstract_text: String::new(),
                publisher: String::new(),
                contributors: vec![],
                date: "2021-01-01".to_string(),
                year: "2021".to_string(),
                language: "eng".to_string(),
                agreements: vec![],
                degree: Some("Doctor of Philosophy".to_string()),
                abbreviation: None,
                discipline: None,
                level: "2".to_string(),
                doi: "10.22215/etd/2021-1".to_string(),
                rights_notes: String::new(),
                path: PathBuf::new(),
            },
            files: vec![],
        },
        url: "https://a.url.here/work1".to_string(),
    }
}

#[test]
fn creator_splits_on_the_first_comma() {
    assert_eq!(
        split_creator("Creator, Test"),
        ("Creator".to_string(), "Test".to_string())
    );
    assert_eq!(
        split_creator("Mononymous"),
        ("Mononymous".to_string(), String::new()),
        "mononymous creators yield an empty given name"
    );
    assert_eq!(
        split_creator("Surname, Given, Extra"),
        ("Surname".to_string(), "Given, Extra".to_string()),
        "only the first comma splits"
    );
}

#[test]
fn batch_header_carries_the_depositor_identity() {
    let batch = CrossrefBatch::new();
    let xml = batch.to_xml(1_600_000_000, 16_000_000_000_000_000).expect("serializable");

    assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
    assert!(xml.contains("<doi_batch"));
    assert!(xml.contains("version=\"4.4.1\""));
    assert!(xml.contains("xmlns=\"http://www.crossref.org/schema/4.4.1\""));
    assert!(xml.contains("<doi_batch_id>1600000000</doi_batch_id>"));
    assert!(xml.contains("<timestamp>16000000000000000</timestamp>"));
    assert!(xml.contains("<depositor_name>Carleton University Library</depositor_name>"));
    assert!(xml.contains("<email_address>doi@library.carleton.ca</email_address>"));
    assert!(xml.contains("<registrant>Carleton University</registrant>"));
    assert!(xml.contains("<body>"), "an empty batch still has a body element");
}

#[test]
fn dissertations_append_in_completion_order() {
    let mut batch = CrossrefBatch::new();
    assert!(batch.is_empty());

    batch.add(&completed("Creator, Test"));
    batch.add(&completed("Mononymous"));
    assert_eq!(batch.len(), 2);

    let xml = batch.to_xml(1, 2).expect("serializable");

    let first = xml.find("<surname>Creator</surname>").expect("first entry");
    let second = xml.find("<surname>Mononymous</surname>").expect("second entry");
    assert!(first < second, "entries keep completion order");

    assert!(xml.contains("<given_name>Test</given_name>"));
    assert!(xml.contains("<given_name></given_name>") || xml.contains("<given_name/>"));
    assert!(xml.contains("contributor_role=\"author\""));
    assert!(xml.contains("sequence=\"first\""));
    assert!(xml.contains("<title>Title</title>"));
    assert!(xml.contains("<year>2021</year>"));
    assert!(xml.contains("media_type=\"online\""));
    assert!(xml.contains("<institution_name>Carleton University</institution_name>"));
    assert!(xml.contains("<institution_place>Ottawa, Ontario</institution_place>"));
    assert!(xml.contains("<degree>Doctor of Philosophy</degree>"));
    assert!(xml.contains("<doi>10.22215/etd/2021-1</doi>"));
    assert!(xml.contains("<resource>https://a.url.here/work1</resource>"));
}

#[test]
fn batch_writes_once_to_disk() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("crossref.xml");

    let mut batch = CrossrefBatch::new();
    batch.add(&completed("Creator, Test"));
    batch.write_to(&path).expect("batch should write");

    let content = std::fs::read_to_string(&path).expect("file exists");
    assert!(content.contains("<dissertation>"));
    assert!(content.contains("<doi>10.22215/etd/2021-1</doi>"));
}
