//! Package record types: the bibliographic description extracted from one
//! ETD submission, and the immutable stage wrappers the orchestrator moves a
//! package through. Each pipeline stage produces a new value instead of
//! mutating the previous one, so a partially-populated record can never
//! reach the artifact generators.

use sha2::{Digest, Sha256};
use std::path::PathBuf;

use crate::config::DOI_PREFIX;

/// FLAG is rendered where a controlled-vocabulary lookup had no mapped
/// result. It exists only at output boundaries; the model keeps unmapped
/// values as `None`.
pub const FLAG: &str = "FLAG";

/// The bibliographic description of one submission, produced by the
/// metadata extractor after permissions validation has passed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageData {
    /// Package directory name, e.g. "100000000_1234".
    pub name: String,
    /// Stable external lookup key: lowercase hex SHA-256 of `name`.
    pub source_identifier: String,
    pub title: String,
    /// "Surname, Given" convention; mononymous creators have no comma.
    pub creator: String,
    /// Subject heading tuples, each 2 or 4 elements, deduplicated.
    pub subjects: Vec<Vec<String>>,
    pub abstract_text: String,
    pub publisher: String,
    /// Rendered contributor strings, "Name (Role)" or "Name".
    pub contributors: Vec<String>,
    /// Approval date as submitted, `YYYY-MM-DD`.
    pub date: String,
    /// Year extracted from `date`.
    pub year: String,
    /// Canonical ISO-3 language code: eng, fra, deu or spa.
    pub language: String,
    /// Identifiers of signed recognized agreements, in document order.
    pub agreements: Vec<String>,
    /// Full degree name; `None` when blank in the submission.
    pub degree: Option<String>,
    /// Degree abbreviation; `None` when the mapping has no entry.
    pub abbreviation: Option<String>,
    /// Discipline name; `None` when the mapping has no entry.
    pub discipline: Option<String>,
    /// Degree level, validated to "1" (master's) or "2" (doctoral).
    pub level: String,
    /// Minted DOI, `<prefix>/etd/<year>-<sequence>`.
    pub doi: String,
    pub rights_notes: String,
    /// Source directory of the package.
    pub path: PathBuf,
}

/// A package whose files have been selected, renamed and copied to the
/// output files area. Produced by the file assembler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedPackage {
    pub data: PackageData,
    /// Staged file names, primary document first.
    pub files: Vec<String>,
}

/// A package whose public catalog URL has been resolved after import.
/// Only completed packages feed the MARC and Crossref generators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedPackage {
    pub staged: StagedPackage,
    pub url: String,
}

/// Compute the stable external lookup key for a package name.
pub fn source_identifier(name: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(name.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Mint the DOI for a package from its approval year and the run's
/// sequence counter.
pub fn mint_doi(year: &str, sequence: u32) -> String {
    format!("{DOI_PREFIX}/etd/{year}-{sequence}")
}

/// Render an optional mapped value at an output boundary.
pub fn flag_or(value: Option<&str>) -> &str {
    value.unwrap_or(FLAG)
}
