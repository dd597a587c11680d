//! Compliance-document validation.
//!
//! The permissions document is line-oriented: one statement per line, drawn
//! from a fixed vocabulary. Every line is classified into a
//! [`PermissionLine`] variant and consumed by a single exhaustive match, so
//! the "fail on anything unexpected" contract is explicit: informational
//! lines are skipped, an unexpired embargo or an unsigned required
//! agreement aborts the package, and any unrecognized line aborts the
//! package quoting the offending text.

use chrono::NaiveDate;

use crate::error::DepositError;
use crate::load_config::Mappings;

/// Classification of one line of the permissions document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PermissionLine<'a> {
    /// Student ID / Thesis ID headers; carry no compliance meaning.
    Informational,
    /// An embargo statement with its trailing `DD-MMM-YY` date token.
    EmbargoExpiry(&'a str),
    /// A recognized agreement statement and whether it was signed.
    Agreement { name: &'a str, signed: bool },
    /// Anything outside the fixed vocabulary.
    Unrecognized(&'a str),
}

/// Classify a single trimmed line against the recognized-prefix vocabulary.
pub fn classify_line<'a>(line: &'a str, mappings: &'a Mappings) -> PermissionLine<'a> {
    if line.starts_with("Student ID") || line.starts_with("Thesis ID") {
        return PermissionLine::Informational;
    }
    if line.starts_with("Embargo Expiry") {
        let token = line.split_whitespace().nth(2).unwrap_or("");
        return PermissionLine::EmbargoExpiry(token);
    }
    for name in mappings.agreements.keys() {
        if line.starts_with(name.as_str()) {
            let signed = line.split("||").nth(2) == Some("Y");
            return PermissionLine::Agreement { name, signed };
        }
    }
    PermissionLine::Unrecognized(line)
}

/// Parse an embargo date token in `DD-MMM-YY` form. Two-digit years are
/// always in the 2000s.
pub fn embargo_date(token: &str) -> Option<NaiveDate> {
    let mut parts = token.split('-');
    let day: u32 = parts.next()?.parse().ok()?;
    let month = match parts.next()? {
        "JAN" => 1,
        "FEB" => 2,
        "MAR" => 3,
        "APR" => 4,
        "MAY" => 5,
        "JUN" => 6,
        "JUL" => 7,
        "AUG" => 8,
        "SEP" => 9,
        "OCT" => 10,
        "NOV" => 11,
        "DEC" => 12,
        _ => return None,
    };
    let year: i32 = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    NaiveDate::from_ymd_opt(2000 + year, month, day)
}

/// Validate the permissions document content against the agreement rules.
///
/// The package must be out of embargo relative to `today` (an embargo date
/// equal to today has passed) and every required agreement must be signed.
/// Returns the identifiers of signed recognized agreements, in document
/// order. Any unexpected or malformed line fails the whole package.
pub fn process_agreements(
    content: &str,
    mappings: &Mappings,
    today: NaiveDate,
) -> Result<Vec<String>, DepositError> {
    let mut agreements = Vec::new();

    for line in content.trim().lines() {
        let line = line.trim();
        match classify_line(line, mappings) {
            PermissionLine::Informational => continue,
            PermissionLine::EmbargoExpiry(token) => {
                let expiry = embargo_date(token).ok_or_else(|| {
                    DepositError::Metadata(format!(
                        "the embargo date {token} could not be processed"
                    ))
                })?;
                if expiry > today {
                    return Err(DepositError::Metadata(format!(
                        "the embargo date of {token}, which is {expiry}, has not passed"
                    )));
                }
            }
            PermissionLine::Agreement { name, signed } => {
                let rule = &mappings.agreements[name];
                if rule.required && !signed {
                    return Err(DepositError::Metadata(format!(
                        "{line} is required but not signed"
                    )));
                }
                if signed {
                    agreements.push(rule.identifier.clone());
                }
            }
            PermissionLine::Unrecognized(text) => {
                return Err(DepositError::Metadata(format!(
                    "{text} was not expected in the permissions document"
                )));
            }
        }
    }

    Ok(agreements)
}
