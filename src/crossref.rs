//! Crossref DOI-registration batch.
//!
//! One batch document is accumulated per run: completed packages append a
//! `dissertation` record in completion order, and the document is serialized
//! once at the end of the run against the pinned 4.4.1 schema.

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::config::{DEPOSITOR_EMAIL, DEPOSITOR_NAME, INSTITUTION, INSTITUTION_PLACE};
use crate::error::DepositError;
use crate::package::{flag_or, CompletedPackage};

const SCHEMA_VERSION: &str = "4.4.1";
const SCHEMA_NAMESPACE: &str = "http://www.crossref.org/schema/4.4.1";
const SCHEMA_LOCATION: &str =
    "http://www.crossref.org/schema/4.4.1 http://www.crossref.org/schemas/crossref4.4.1.xsd";

/// Split a "Surname, Given" creator into Crossref's surname and given-name
/// parts. Crossref still expects both; mononymous creators (no comma) yield
/// an empty given name.
pub fn split_creator(creator: &str) -> (String, String) {
    match creator.split_once(',') {
        Some((surname, given)) => (surname.trim().to_string(), given.trim().to_string()),
        None => (creator.trim().to_string(), String::new()),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Dissertation {
    given_name: String,
    surname: String,
    title: String,
    approval_year: String,
    degree: String,
    doi: String,
    resource: String,
}

/// The per-run batch accumulator.
#[derive(Debug, Default)]
pub struct CrossrefBatch {
    dissertations: Vec<Dissertation>,
}

impl CrossrefBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.dissertations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dissertations.is_empty()
    }

    /// Append the dissertation record for a completed package.
    pub fn add(&mut self, package: &CompletedPackage) {
        let data = &package.staged.data;
        let (surname, given_name) = split_creator(&data.creator);
        self.dissertations.push(Dissertation {
            given_name,
            surname,
            title: data.title.clone(),
            approval_year: data.year.clone(),
            degree: flag_or(data.degree.as_deref()).to_string(),
            doi: data.doi.clone(),
            resource: package.url.clone(),
        });
    }

    /// Serialize the batch document. `batch_id` and `timestamp` identify
    /// the deposit to Crossref; the orchestrator derives them from the
    /// submission time.
    pub fn to_xml(&self, batch_id: u64, timestamp: u64) -> Result<String, DepositError> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

        let mut root = BytesStart::new("doi_batch");
        root.push_attribute(("version", SCHEMA_VERSION));
        root.push_attribute(("xmlns", SCHEMA_NAMESPACE));
        root.push_attribute(("xmlns:xsi", "http://www.w3.org/2001/XMLSchema-instance"));
        root.push_attribute(("xsi:schemaLocation", SCHEMA_LOCATION));
        writer.write_event(Event::Start(root))?;

        writer.write_event(Event::Start(BytesStart::new("head")))?;
        text_element(&mut writer, "doi_batch_id", &batch_id.to_string())?;
        text_element(&mut writer, "timestamp", &timestamp.to_string())?;
        writer.write_event(Event::Start(BytesStart::new("depositor")))?;
        text_element(&mut writer, "depositor_name", DEPOSITOR_NAME)?;
        text_element(&mut writer, "email_address", DEPOSITOR_EMAIL)?;
        writer.write_event(Event::End(BytesEnd::new("depositor")))?;
        text_element(&mut writer, "registrant", INSTITUTION)?;
        writer.write_event(Event::End(BytesEnd::new("head")))?;

        writer.write_event(Event::Start(BytesStart::new("body")))?;
        for dissertation in &self.dissertations {
            write_dissertation(&mut writer, dissertation)?;
        }
        writer.write_event(Event::End(BytesEnd::new("body")))?;

        writer.write_event(Event::End(BytesEnd::new("doi_batch")))?;

        Ok(String::from_utf8_lossy(&writer.into_inner()).into_owned())
    }

    /// Write the batch document once, at the end of the run.
    pub fn write_to(&self, path: &Path) -> Result<(), DepositError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        let batch_id = now.as_secs();
        let timestamp = now.as_secs() * 10_000_000;
        let xml = self.to_xml(batch_id, timestamp)?;
        std::fs::write(path, xml)?;
        Ok(())
    }
}

fn write_dissertation(
    writer: &mut Writer<Vec<u8>>,
    dissertation: &Dissertation,
) -> Result<(), DepositError> {
    writer.write_event(Event::Start(BytesStart::new("dissertation")))?;

    let mut person = BytesStart::new("person_name");
    person.push_attribute(("contributor_role", "author"));
    person.push_attribute(("sequence", "first"));
    writer.write_event(Event::Start(person))?;
    text_element(writer, "given_name", &dissertation.given_name)?;
    text_element(writer, "surname", &dissertation.surname)?;
    writer.write_event(Event::End(BytesEnd::new("person_name")))?;

    writer.write_event(Event::Start(BytesStart::new("titles")))?;
    text_element(writer, "title", &dissertation.title)?;
    writer.write_event(Event::End(BytesEnd::new("titles")))?;

    let mut approval = BytesStart::new("approval_date");
    approval.push_attribute(("media_type", "online"));
    writer.write_event(Event::Start(approval))?;
    text_element(writer, "year", &dissertation.approval_year)?;
    writer.write_event(Event::End(BytesEnd::new("approval_date")))?;

    writer.write_event(Event::Start(BytesStart::new("institution")))?;
    text_element(writer, "institution_name", INSTITUTION)?;
    text_element(writer, "institution_place", INSTITUTION_PLACE)?;
    writer.write_event(Event::End(BytesEnd::new("institution")))?;

    text_element(writer, "degree", &dissertation.degree)?;

    writer.write_event(Event::Start(BytesStart::new("doi_data")))?;
    text_element(writer, "doi", &dissertation.doi)?;
    text_element(writer, "resource", &dissertation.resource)?;
    writer.write_event(Event::End(BytesEnd::new("doi_data")))?;

    writer.write_event(Event::End(BytesEnd::new("dissertation")))?;
    Ok(())
}

fn text_element(
    writer: &mut Writer<Vec<u8>>,
    name: &str,
    text: &str,
) -> Result<(), DepositError> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}
