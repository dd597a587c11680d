//! Import-manifest generation: one CSV row per completed package, in the
//! fixed column order the repository's bulk importer expects.

use std::path::Path;

use crate::config::DOI_URL_PREFIX;
use crate::error::DepositError;
use crate::package::{flag_or, StagedPackage};

/// Joins list-valued manifest fields. Chosen over a plain comma so natural
/// punctuation inside names and titles cannot split a value on re-import.
pub const LIST_DELIMITER: &str = "|||";

/// Constant `model` column value for every deposited package.
const MODEL: &str = "Etd";

/// Constant `resource_type` column value for every deposited package.
const RESOURCE_TYPE: &str = "Thesis";

pub const HEADER_COLUMNS: [&str; 19] = [
    "source_identifier",
    "model",
    "title",
    "creator",
    "identifier",
    "subject",
    "abstract",
    "publisher",
    "contributor",
    "date_created",
    "language",
    "agreement",
    "degree",
    "degree_discipline",
    "degree_level",
    "resource_type",
    "parents",
    "file",
    "rights_notes",
];

/// Render the subject column from the heading tuples: the primary heading
/// with any trailing period stripped, plus `" -- "` and the period-stripped
/// secondary heading for 4-element tuples, tuples joined with `|`.
pub fn create_csv_subject(subjects: &[Vec<String>]) -> String {
    let mut rendered: Vec<String> = Vec::new();
    for tuple in subjects {
        let Some(primary) = tuple.get(1) else {
            continue;
        };
        let mut subject = primary.trim_end_matches('.').to_string();
        if tuple.len() == 4 {
            if let Some(secondary) = tuple.get(3) {
                subject.push_str(" -- ");
                subject.push_str(secondary.trim_end_matches('.'));
            }
        }
        rendered.push(subject);
    }
    rendered.join("|")
}

/// Render the composite degree column, `"<degree> (<abbreviation>)"`.
/// Unmapped values surface as the FLAG marker so they are easy to spot in
/// review, never silently blank.
fn create_csv_degree(degree: Option<&str>, abbreviation: Option<&str>) -> String {
    format!("{} ({})", flag_or(degree), flag_or(abbreviation))
}

/// Write the fixed header row of a new manifest file.
pub fn write_manifest_header(manifest_path: &Path) -> Result<(), DepositError> {
    let mut writer = csv::Writer::from_path(manifest_path)?;
    writer.write_record(HEADER_COLUMNS)?;
    writer.flush()?;
    Ok(())
}

/// Build the manifest row for a staged package, in header order.
pub fn manifest_row(package: &StagedPackage, collection_id: &str) -> Vec<String> {
    let data = &package.data;
    vec![
        data.source_identifier.clone(),
        MODEL.to_string(),
        data.title.clone(),
        data.creator.clone(),
        format!("DOI: {}{}", DOI_URL_PREFIX, data.doi),
        create_csv_subject(&data.subjects),
        data.abstract_text.clone(),
        data.publisher.clone(),
        data.contributors.join(LIST_DELIMITER),
        data.year.clone(),
        data.language.clone(),
        data.agreements.join(LIST_DELIMITER),
        create_csv_degree(data.degree.as_deref(), data.abbreviation.as_deref()),
        flag_or(data.discipline.as_deref()).to_string(),
        data.level.clone(),
        RESOURCE_TYPE.to_string(),
        collection_id.to_string(),
        package.files.join(LIST_DELIMITER),
        data.rights_notes.clone(),
    ]
}

/// Append one package row to the manifest file.
pub fn add_to_manifest(
    manifest_path: &Path,
    package: &StagedPackage,
    collection_id: &str,
) -> Result<(), DepositError> {
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(manifest_path)?;
    let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(file);
    writer.write_record(manifest_row(package, collection_id))?;
    writer.flush()?;
    Ok(())
}
