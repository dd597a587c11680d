//! MARC record generation.
//!
//! Builds one binary bibliographic record (ISO 2709 framing) per completed
//! package, with the fixed field layout catalogers expect for electronic
//! thesis deposits. No example in the ecosystem we build on carries a MARC
//! writer, so the record/directory framing is implemented here; the field
//! content mirrors the cataloging template exactly.

use chrono::NaiveDate;
use std::path::Path;
use tracing::warn;

use crate::config::{DOI_URL_PREFIX, INSTITUTION};
use crate::error::DepositError;
use crate::package::CompletedPackage;

const FIELD_TERMINATOR: u8 = 0x1E;
const RECORD_TERMINATOR: u8 = 0x1D;
const SUBFIELD_DELIMITER: u8 = 0x1F;

// Leader template: record status/type "nam", UTF-8 encoding, RDA-era
// indicator/subfield counts. Record length and base address are filled in
// during serialization.
const LEADER_TEMPLATE: &str = "     nam a22     4i 4500";

/// One variable field: a control field (no indicators, raw data) or a data
/// field (two indicators plus coded subfields).
#[derive(Debug, Clone)]
pub enum Field {
    Control {
        tag: &'static str,
        data: String,
    },
    Data {
        tag: &'static str,
        indicators: [char; 2],
        subfields: Vec<(char, String)>,
    },
}

impl Field {
    fn encode(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        match self {
            Field::Control { data, .. } => {
                bytes.extend_from_slice(data.as_bytes());
            }
            Field::Data {
                indicators,
                subfields,
                ..
            } => {
                let mut ind = [0u8; 4];
                bytes.extend_from_slice(indicators[0].encode_utf8(&mut ind).as_bytes());
                bytes.extend_from_slice(indicators[1].encode_utf8(&mut ind).as_bytes());
                for (code, value) in subfields {
                    bytes.push(SUBFIELD_DELIMITER);
                    let mut code_buf = [0u8; 4];
                    bytes.extend_from_slice(code.encode_utf8(&mut code_buf).as_bytes());
                    bytes.extend_from_slice(value.as_bytes());
                }
            }
        }
        bytes.push(FIELD_TERMINATOR);
        bytes
    }

    fn tag(&self) -> &'static str {
        match self {
            Field::Control { tag, .. } => tag,
            Field::Data { tag, .. } => tag,
        }
    }
}

/// An in-memory MARC record, serializable to the binary transmission format.
#[derive(Debug, Default, Clone)]
pub struct MarcRecord {
    fields: Vec<Field>,
}

impl MarcRecord {
    pub fn new() -> Self {
        Self { fields: Vec::new() }
    }

    pub fn add_control(&mut self, tag: &'static str, data: impl Into<String>) {
        self.fields.push(Field::Control {
            tag,
            data: data.into(),
        });
    }

    pub fn add_data(
        &mut self,
        tag: &'static str,
        indicators: [char; 2],
        subfields: Vec<(char, String)>,
    ) {
        self.fields.push(Field::Data {
            tag,
            indicators,
            subfields,
        });
    }

    /// Serialize to ISO 2709: leader, directory, field data, terminator.
    /// Directory lengths and offsets are byte counts of the UTF-8 encoding.
    pub fn as_marc(&self) -> Vec<u8> {
        let encoded: Vec<(&'static str, Vec<u8>)> = self
            .fields
            .iter()
            .map(|field| (field.tag(), field.encode()))
            .collect();

        let mut directory = String::new();
        let mut field_data: Vec<u8> = Vec::new();
        for (tag, bytes) in &encoded {
            directory.push_str(&format!(
                "{}{:04}{:05}",
                tag,
                bytes.len(),
                field_data.len()
            ));
            field_data.extend_from_slice(bytes);
        }

        let base_address = 24 + directory.len() + 1;
        let record_length = base_address + field_data.len() + 1;

        let mut leader = LEADER_TEMPLATE.to_string();
        leader.replace_range(0..5, &format!("{record_length:05}"));
        leader.replace_range(12..17, &format!("{base_address:05}"));

        let mut record = Vec::with_capacity(record_length);
        record.extend_from_slice(leader.as_bytes());
        record.extend_from_slice(directory.as_bytes());
        record.push(FIELD_TERMINATOR);
        record.extend_from_slice(&field_data);
        record.push(RECORD_TERMINATOR);
        record
    }
}

/// Split the title at the first colon into a punctuated main title and
/// subtitle; without a colon the whole title gets a closing period.
fn title_field(title: &str) -> Field {
    let mut subfields = Vec::new();
    if let Some((main, subtitle)) = title.split_once(':') {
        subfields.push(('a', format!("{} :", main.trim())));
        let mut subtitle = subtitle.trim().to_string();
        if !subtitle.ends_with('.') {
            subtitle.push('.');
        }
        subfields.push(('b', subtitle));
    } else {
        let mut main = title.trim().to_string();
        if !main.ends_with('.') {
            main.push('.');
        }
        subfields.push(('a', main));
    }
    Field::Data {
        tag: "245",
        indicators: ['1', '0'],
        subfields,
    }
}

/// Build the full record for a completed package. `today` is the processing
/// date stamped into the 008 field and the provenance note.
pub fn build_marc_record(package: &CompletedPackage, today: NaiveDate) -> MarcRecord {
    let data = &package.staged.data;
    let mut record = MarcRecord::new();

    // The added author heading keeps the open-ended name form: a trailing
    // hyphen is left alone, anything else gets a comma.
    let mut author = data.creator.trim().to_string();
    if !author.ends_with('-') {
        author.push(',');
    }

    let abbreviation = data.abbreviation.as_deref().unwrap_or_default();
    let discipline = data.discipline.as_deref().unwrap_or_default();

    record.add_control("006", "m     o  d        ");
    record.add_control("007", "cr || ||||||||");
    record.add_control(
        "008",
        format!(
            "{}s{}    onca||||omb|| 000|0 eng d",
            today.format("%y%m%d"),
            data.year
        ),
    );
    record.add_data(
        "040",
        [' ', ' '],
        vec![
            ('a', "CaOOCC".to_string()),
            ('b', "eng".to_string()),
            ('e', "rda".to_string()),
            ('c', "CaOOCC".to_string()),
        ],
    );
    record.add_data(
        "100",
        ['1', ' '],
        vec![('a', author), ('e', "author".to_string())],
    );
    record.fields.push(title_field(&data.title));
    record.add_data(
        "264",
        [' ', '1'],
        vec![('a', "Ottawa,".to_string()), ('c', data.year.clone())],
    );
    record.add_data(
        "264",
        [' ', '4'],
        vec![('c', format!("\u{00A9}{}", data.year))],
    );
    record.add_data(
        "300",
        [' ', ' '],
        vec![
            ('a', "1 online resource :".to_string()),
            ('b', "illustrations".to_string()),
        ],
    );
    record.add_data(
        "336",
        [' ', ' '],
        vec![
            ('a', "text".to_string()),
            ('b', "txt".to_string()),
            ('2', "rdacontent".to_string()),
        ],
    );
    record.add_data(
        "337",
        [' ', ' '],
        vec![
            ('a', "computer".to_string()),
            ('b', "c".to_string()),
            ('2', "rdamedia".to_string()),
        ],
    );
    record.add_data(
        "338",
        [' ', ' '],
        vec![
            ('a', "online resource".to_string()),
            ('b', "cr".to_string()),
            ('2', "rdacarrier".to_string()),
        ],
    );
    record.add_data(
        "502",
        [' ', ' '],
        vec![(
            'a',
            format!("Thesis ({abbreviation}) - {INSTITUTION}, {}.", data.year),
        )],
    );
    record.add_data(
        "504",
        [' ', ' '],
        vec![('a', "Includes bibliographical references.".to_string())],
    );
    record.add_data(
        "540",
        [' ', ' '],
        vec![(
            'a',
            "Licensed through author open access agreement. Commercial use prohibited \
             without author's consent."
                .to_string(),
        )],
    );
    record.add_data(
        "591",
        [' ', ' '],
        vec![
            ('a', "e-thesis deposit".to_string()),
            ('9', "LOCAL".to_string()),
        ],
    );
    for tuple in &data.subjects {
        if tuple.len() % 2 != 0 {
            warn!(package = %data.name, ?tuple, "Skipping malformed subject tuple");
            continue;
        }
        let subfields: Vec<(char, String)> = tuple
            .chunks(2)
            .filter_map(|pair| {
                let code = pair[0].chars().next()?;
                Some((code, pair[1].clone()))
            })
            .collect();
        record.add_data("650", [' ', '0'], subfields);
    }
    record.add_data(
        "710",
        ['2', ' '],
        vec![
            ('a', format!("{INSTITUTION}.")),
            ('k', "Theses and Dissertations.".to_string()),
            ('g', format!("{discipline}.")),
        ],
    );
    record.add_data(
        "856",
        ['4', '0'],
        vec![
            ('u', format!("{}{}", DOI_URL_PREFIX, data.doi)),
            (
                'z',
                "Free Access (Carleton University Institutional Repository Full Text)"
                    .to_string(),
            ),
        ],
    );
    record.add_data(
        "979",
        [' ', ' '],
        vec![
            (
                'a',
                format!("MARC file generated {} on ETD Depositor", today.format("%Y-%m-%d")),
            ),
            ('9', "LOCAL".to_string()),
        ],
    );

    record
}

/// Build and write the record for a completed package into the MARC area.
pub fn create_marc_record(
    package: &CompletedPackage,
    marc_path: &Path,
    today: NaiveDate,
) -> Result<(), DepositError> {
    let record = build_marc_record(package, today);
    let out_path = marc_path.join(format!("{}_marc.mrc", package.staged.data.name));
    std::fs::write(out_path, record.as_marc())?;
    Ok(())
}
