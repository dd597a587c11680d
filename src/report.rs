//! Run reporting: the human-readable summary of a deposit run and the
//! companion ingest-list CSV reviewers use to spot flagged content.

use chrono::NaiveDate;
use std::path::{Path, PathBuf};

use crate::error::DepositError;
use crate::package::CompletedPackage;

/// Outcome of one full pipeline run.
#[derive(Debug, Default)]
pub struct DepositReport {
    pub completed: Vec<CompletedPackage>,
    /// (package name, reason) for every package that failed a stage.
    pub failures: Vec<(String, String)>,
    /// (package name, reason) for packages excluded by configuration.
    pub skipped: Vec<(String, String)>,
}

impl DepositReport {
    pub fn record_failure(&mut self, name: &str, reason: impl Into<String>) {
        self.failures.push((name.to_string(), reason.into()));
    }

    pub fn record_skip(&mut self, name: &str, reason: impl Into<String>) {
        self.skipped.push((name.to_string(), reason.into()));
    }
}

/// Shorten a title to the given width on a word boundary.
fn shorten(text: &str, width: usize) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.len() <= width {
        return collapsed;
    }
    let mut shortened = String::new();
    for word in collapsed.split(' ') {
        let candidate_len = if shortened.is_empty() {
            word.len()
        } else {
            shortened.len() + 1 + word.len()
        };
        if candidate_len + 3 > width {
            break;
        }
        if !shortened.is_empty() {
            shortened.push(' ');
        }
        shortened.push_str(word);
    }
    shortened.push_str("...");
    shortened
}

/// Render the run report body: completed packages with identifying
/// metadata, then every failed and skipped package with its reason.
pub fn report_text(report: &DepositReport, run_date: NaiveDate) -> String {
    let mut contents = format!("ETD Depositor Report - Run on {run_date}.\n\n");

    contents.push_str(&format!(
        "{} completed packages.\n",
        report.completed.len()
    ));
    for package in &report.completed {
        let data = &package.staged.data;
        contents.push_str(&format!(
            "{} - {} {}\n",
            data.creator,
            shorten(&data.title, 40),
            package.url
        ));
    }
    contents.push('\n');

    contents.push_str(&format!("{} failed packages.\n", report.failures.len()));
    for (name, reason) in &report.failures {
        contents.push_str(&format!("{name}: {reason}\n"));
    }

    if !report.skipped.is_empty() {
        contents.push('\n');
        contents.push_str(&format!("{} skipped packages.\n", report.skipped.len()));
        for (name, reason) in &report.skipped {
            contents.push_str(&format!("{name}: {reason}\n"));
        }
    }

    contents
}

/// Write the report into the reports area and return its path.
pub fn write_report(
    report: &DepositReport,
    reports_path: &Path,
    run_date: NaiveDate,
) -> Result<PathBuf, DepositError> {
    let path = reports_path.join(format!("{run_date}-report.txt"));
    std::fs::write(&path, report_text(report, run_date))?;
    Ok(path)
}

/// Review notes for one completed package: unmapped degree fields, LaTeX
/// residue in the abstract, and replacement characters from bad source
/// encodings.
fn flagged_content(package: &CompletedPackage) -> String {
    let data = &package.staged.data;
    let mut contents = String::new();
    if data.degree.is_none() {
        contents.push_str(" Degree is flagged.");
    }
    if data.abbreviation.is_none() {
        contents.push_str(" Degree abbreviation is flagged.");
    }
    if data.discipline.is_none() {
        contents.push_str(" Degree discipline is flagged.");
    }
    if data.abstract_text.contains('$') {
        contents.push_str(" Abstract contains '$', LaTeX codes?");
    }
    if data.abstract_text.contains('\\') {
        contents.push_str(" Abstract contains '\\', LaTeX codes?");
    }
    if data.title.contains('\u{FFFD}') {
        contents.push_str(" Title contains replacement character.");
    }
    if data.creator.contains('\u{FFFD}') {
        contents.push_str(" Creator contains replacement character.");
    }
    if data.abstract_text.contains('\u{FFFD}') {
        contents.push_str(" Abstract contains replacement character.");
    }
    if data.contributors.iter().any(|c| c.contains('\u{FFFD}')) {
        contents.push_str(" Contributors contains replacement character.");
    }
    contents
}

/// Write the ingest-list CSV for the run's completed packages.
pub fn write_ingest_list(
    completed: &[CompletedPackage],
    csv_path: &Path,
    processed_at: &str,
) -> Result<(), DepositError> {
    let mut writer = csv::Writer::from_path(csv_path)?;
    writer.write_record([
        "Author Name",
        "Package File Name",
        "Date Processed",
        "Link to Thesis",
        "PDF File",
        "Supplemental File",
        "Flagged Content",
    ])?;

    for package in completed {
        let data = &package.staged.data;
        let pdf_files = package
            .staged
            .files
            .iter()
            .filter(|f| f.ends_with(".pdf"))
            .cloned()
            .collect::<Vec<_>>()
            .join(", ");
        let zip_files = package
            .staged
            .files
            .iter()
            .filter(|f| f.ends_with(".zip"))
            .cloned()
            .collect::<Vec<_>>()
            .join(", ");

        writer.write_record([
            data.creator.as_str(),
            data.name.as_str(),
            processed_at,
            package.url.as_str(),
            pdf_files.as_str(),
            zip_files.as_str(),
            flagged_content(package).as_str(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}
