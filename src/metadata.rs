//! Descriptive-metadata extraction.
//!
//! The package metadata document is XML with two co-resident namespaces: the
//! Dublin Core element set (title, creator, subject, ...) and the ETDMS
//! thesis extension carrying the degree name, level and discipline as nested
//! elements. The document is walked once with a `quick-xml` event loop into
//! a raw field set, then each field is independently validated and
//! normalized into a [`PackageData`].

use chrono::Datelike;
use chrono::NaiveDate;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::path::Path;

use crate::config::INSTITUTION;
use crate::error::DepositError;
use crate::load_config::Mappings;
use crate::package::{mint_doi, source_identifier, PackageData};

/// Raw field values as they appear in the document, before validation.
#[derive(Debug, Default)]
struct RawMetadata {
    title: String,
    creator: String,
    subjects: Vec<String>,
    description: String,
    publisher: String,
    contributors: Vec<(String, Option<String>)>,
    date: String,
    language: String,
    rights_notes: String,
    degree_name: String,
    degree_level: String,
    degree_discipline: String,
}

/// Walk the document and collect raw field values by element path.
fn parse_document(xml: &str) -> Result<RawMetadata, DepositError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut raw = RawMetadata::default();
    let mut buf = Vec::new();
    // Path of local element names from the root down to the current element.
    let mut path: Vec<String> = Vec::new();
    let mut text = String::new();
    let mut contributor_role: Option<String> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).to_string();
                if name == "contributor" {
                    contributor_role = None;
                    for attr in e.attributes().flatten() {
                        if attr.key.as_ref() == b"role" {
                            contributor_role =
                                Some(String::from_utf8_lossy(&attr.value).to_string());
                        }
                    }
                }
                path.push(name);
                text.clear();
            }
            Ok(Event::Text(e)) => {
                text.push_str(&e.unescape().unwrap_or_default());
            }
            Ok(Event::CData(e)) => {
                text.push_str(&String::from_utf8_lossy(&e.into_inner()));
            }
            Ok(Event::End(_)) => {
                commit_field(&mut raw, &path, &text, &mut contributor_role);
                path.pop();
                text.clear();
            }
            Ok(Event::Empty(ref e)) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).to_string();
                path.push(name);
                commit_field(&mut raw, &path, "", &mut contributor_role);
                path.pop();
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(DepositError::Metadata(format!("error parsing XML, {e}")));
            }
            _ => {}
        }
        buf.clear();
    }

    Ok(raw)
}

/// Store one element's text into the raw field set, keyed by its path.
/// Single-valued fields keep their first occurrence, matching the source
/// documents where repeats are not meaningful.
fn commit_field(
    raw: &mut RawMetadata,
    path: &[String],
    text: &str,
    contributor_role: &mut Option<String>,
) {
    let local: Vec<&str> = path.iter().map(String::as_str).collect();
    match local.as_slice() {
        [_, "title"] if raw.title.is_empty() => raw.title = text.to_string(),
        [_, "creator"] if raw.creator.is_empty() => raw.creator = text.to_string(),
        [_, "subject"] => raw.subjects.push(text.to_string()),
        [_, "description"] if raw.description.is_empty() => raw.description = text.to_string(),
        [_, "publisher"] if raw.publisher.is_empty() => raw.publisher = text.to_string(),
        [_, "contributor"] => raw
            .contributors
            .push((text.to_string(), contributor_role.take())),
        [_, "date"] if raw.date.is_empty() => raw.date = text.to_string(),
        [_, "language"] if raw.language.is_empty() => raw.language = text.to_string(),
        [_, "rights_notes"] if raw.rights_notes.is_empty() => {
            raw.rights_notes = text.to_string()
        }
        [_, "degree", "name"] if raw.degree_name.is_empty() => {
            raw.degree_name = text.to_string()
        }
        [_, "degree", "level"] if raw.degree_level.is_empty() => {
            raw.degree_level = text.to_string()
        }
        [_, "degree", "discipline"] if raw.degree_discipline.is_empty() => {
            raw.degree_discipline = text.to_string()
        }
        _ => {}
    }
}

/// Map subject codes to their classification tuples, in document order,
/// dropping exact duplicate tuples while keeping the first occurrence.
pub fn process_subjects(codes: &[String], mappings: &Mappings) -> Vec<Vec<String>> {
    let mut subjects: Vec<Vec<String>> = Vec::new();
    for code in codes {
        let code = codes_key(code);
        if let Some(tuples) = mappings.lc_subject.get(code) {
            for tuple in tuples {
                if !subjects.contains(tuple) {
                    subjects.push(tuple.clone());
                }
            }
        }
    }
    subjects
}

fn codes_key(code: &str) -> &str {
    let code = code.trim();
    code.strip_suffix('.').unwrap_or(code)
}

/// Collapse literal newlines to spaces and apply the configured character
/// substitutions (curly quotes, dashes, ...).
pub fn process_description(description: &str, mappings: &Mappings) -> String {
    let mut text = description.replace('\n', " ").replace('\r', "");
    for (from, to) in &mappings.character_substitutions {
        text = text.replace(from.as_str(), to);
    }
    text.trim().to_string()
}

/// Render contributors as "Name (Role)" with the role's first letter
/// capitalized, or "Name" when no role is present. Order is preserved.
pub fn process_contributors(contributors: &[(String, Option<String>)]) -> Vec<String> {
    contributors
        .iter()
        .map(|(name, role)| {
            let name = name.trim();
            match role.as_deref().filter(|r| !r.is_empty()) {
                Some(role) => {
                    let mut chars = role.chars();
                    let capitalized = match chars.next() {
                        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                        None => String::new(),
                    };
                    format!("{name} ({capitalized})")
                }
                None => name.to_string(),
            }
        })
        .collect()
}

/// Check the date is properly formatted; return the date and year.
pub fn process_date(date: &str) -> Result<(String, String), DepositError> {
    let date = date.trim();
    if date.is_empty() {
        return Err(DepositError::Metadata("date tag is missing".to_string()));
    }
    match NaiveDate::parse_from_str(date, "%Y-%m-%d") {
        Ok(parsed) => Ok((date.to_string(), parsed.year().to_string())),
        Err(_) => Err(DepositError::Metadata(format!(
            "date value {date} is not properly formatted"
        ))),
    }
}

/// Normalize known ISO-2/3 language variants to a canonical 3-letter code.
/// A blank language is treated as English; anything unrecognized aborts.
pub fn process_language(language: &str) -> Result<String, DepositError> {
    match language.trim() {
        "fre" | "fra" => Ok("fra".to_string()),
        "ger" | "deu" => Ok("deu".to_string()),
        "spa" => Ok("spa".to_string()),
        "eng" | "" => Ok("eng".to_string()),
        other => Err(DepositError::Metadata(format!(
            "unexpected language {other} found"
        ))),
    }
}

/// Expand the two truncated degree names the submission system produces;
/// a blank degree is unmapped, not fatal.
pub fn process_degree(degree: &str) -> Option<String> {
    match degree.trim() {
        "Master of Architectural Stud" => Some("Master of Architectural Studies".to_string()),
        "Master of Information Tech" => Some("Master of Information Technology".to_string()),
        "" => None,
        other => Some(other.to_string()),
    }
}

pub fn process_degree_abbreviation(
    degree: Option<&str>,
    mappings: &Mappings,
) -> Option<String> {
    degree.and_then(|degree| mappings.abbreviation.get(degree).cloned())
}

pub fn process_degree_discipline(discipline: &str, mappings: &Mappings) -> Option<String> {
    mappings.discipline.get(discipline.trim()).cloned()
}

/// Degree level must be "1" (master's) or "2" (doctoral). This pipeline
/// handles only graduate submissions, so "0" is a hard error.
pub fn process_degree_level(level: &str) -> Result<String, DepositError> {
    let level = level.trim();
    if level.is_empty() {
        return Err(DepositError::Metadata(
            "degree level is missing".to_string(),
        ));
    }
    if level == "0" {
        return Err(DepositError::Metadata(
            "received undergraduate work, degree level is 0".to_string(),
        ));
    }
    if level != "1" && level != "2" {
        return Err(DepositError::Metadata("invalid degree level".to_string()));
    }
    Ok(level.to_string())
}

/// The institutional rights statement applied when the submission carries
/// none of its own.
pub fn default_rights_notes(year: &str) -> String {
    format!(
        "Copyright \u{00A9} {year} the author(s). Theses may be used for \
         non-commercial research, educational, or related academic purposes \
         only. Such uses include personal study, distribution to students, \
         research and scholarship. Theses may only be shared by linking to \
         Carleton University Digital Library and no part may be copied \
         without proper attribution to the author; no part may be used for \
         commercial purposes directly or indirectly via a for-profit \
         platform; no adaptation or derivative works are permitted without \
         consent from the copyright owner."
    )
}

/// Extract and validate the package data from the metadata document.
///
/// `doi_sequence` is the run counter value this package will consume if it
/// completes phase one; the caller advances the counter only on success.
pub fn extract_package_data(
    xml: &str,
    name: &str,
    doi_sequence: u32,
    agreements: Vec<String>,
    package_path: &Path,
    mappings: &Mappings,
) -> Result<PackageData, DepositError> {
    let raw = parse_document(xml)?;

    let title = raw.title.trim().to_string();
    if title.is_empty() {
        return Err(DepositError::Metadata("title tag is missing".to_string()));
    }

    let creator = raw.creator.trim().to_string();
    if creator.is_empty() {
        return Err(DepositError::Metadata(
            "creator tag is missing".to_string(),
        ));
    }

    let subjects = process_subjects(&raw.subjects, mappings);
    let abstract_text = process_description(&raw.description, mappings);

    let publisher = match raw.publisher.trim() {
        "" => INSTITUTION.to_string(),
        publisher => publisher.to_string(),
    };

    let contributors = process_contributors(&raw.contributors);
    let (date, year) = process_date(&raw.date)?;
    let language = process_language(&raw.language)?;

    let degree = process_degree(&raw.degree_name);
    let abbreviation = process_degree_abbreviation(degree.as_deref(), mappings);
    let discipline = process_degree_discipline(&raw.degree_discipline, mappings);
    let level = process_degree_level(&raw.degree_level)?;

    let rights_notes = match raw.rights_notes.trim() {
        "" => default_rights_notes(&year),
        notes => notes.to_string(),
    };

    let doi = mint_doi(&year, doi_sequence);

    Ok(PackageData {
        name: name.to_string(),
        source_identifier: source_identifier(name),
        title,
        creator,
        subjects,
        abstract_text,
        publisher,
        contributors,
        date,
        year,
        language,
        agreements,
        degree,
        abbreviation,
        discipline,
        level,
        doi,
        rights_notes,
        path: package_path.to_path_buf(),
    })
}
