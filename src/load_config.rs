//! `load_config` module: loads the externally supplied mapping tables — the
//! code→value dictionaries the pipeline consults for agreements, degree
//! abbreviations, disciplines, subject classifications, and abstract
//! character substitutions.
//!
//! This is the only place where untrusted YAML is parsed and mapped into the
//! typed [`Mappings`] struct. The tables are loaded once per run and never
//! mutated afterwards.
//!
//! # Errors
//! All errors here use `anyhow::Error` for context-rich diagnostics and are
//! surfaced at the CLI boundary. Malformed subject tuples (arity other than
//! 2 or 4) are a load-time warning, not an error: the MARC builder skips
//! them again at generation time.

use anyhow::Result;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{error, info, warn};

/// One recognized compliance agreement: the term identifier recorded for
/// signed agreements, and whether a signature is mandatory.
#[derive(Debug, Clone, Deserialize)]
pub struct AgreementRule {
    pub identifier: String,
    pub required: bool,
}

/// The full set of mapping tables for a run.
#[derive(Debug, Clone, Deserialize)]
pub struct Mappings {
    /// Agreement name (the line prefix in the permissions document) → rule.
    pub agreements: BTreeMap<String, AgreementRule>,
    /// Full degree name → catalog abbreviation, e.g. "Doctor of Philosophy" → "Ph.D.".
    pub abbreviation: BTreeMap<String, String>,
    /// Discipline code → discipline name, e.g. "MA-07" → "Communication".
    pub discipline: BTreeMap<String, String>,
    /// Subject classification code → list of heading tuples (2 or 4 elements).
    pub lc_subject: BTreeMap<String, Vec<Vec<String>>>,
    /// Character substitutions applied to abstracts (curly quotes, dashes, ...).
    pub character_substitutions: BTreeMap<String, String>,
}

impl Mappings {
    /// Warn about subject tuples whose arity the artifact generators cannot
    /// use. They stay in the table; the MARC builder skips them per record.
    pub fn validate_subjects(&self) {
        for (code, tuples) in &self.lc_subject {
            for tuple in tuples {
                if tuple.len() != 2 && tuple.len() != 4 {
                    warn!(
                        code = %code,
                        arity = tuple.len(),
                        "Subject mapping tuple is not formatted correctly"
                    );
                }
            }
        }
    }
}

/// Load and validate the mappings YAML file.
pub fn load_mappings<P: AsRef<Path>>(path: P) -> Result<Mappings> {
    let path_ref = path.as_ref();
    info!(mappings_path = ?path_ref, "Loading mapping tables from file");

    let content = match fs::read_to_string(path_ref) {
        Ok(content) => content,
        Err(e) => {
            error!(error = ?e, mappings_path = ?path_ref, "Failed to read mappings file");
            return Err(anyhow::anyhow!(
                "Failed to read mappings file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    let mappings: Mappings = match serde_yaml::from_str(&content) {
        Ok(mappings) => mappings,
        Err(e) => {
            error!(error = ?e, mappings_path = ?path_ref, "Failed to parse mappings YAML");
            return Err(anyhow::anyhow!("Failed to parse mappings YAML: {e}"));
        }
    };

    info!(
        agreements = mappings.agreements.len(),
        abbreviations = mappings.abbreviation.len(),
        disciplines = mappings.discipline.len(),
        subjects = mappings.lc_subject.len(),
        "Parsed mapping tables"
    );
    mappings.validate_subjects();

    Ok(mappings)
}
