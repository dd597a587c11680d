//! High-level pipeline: drives every ready package through validation,
//! extraction, file staging, manifest generation, catalog resolution and
//! artifact generation, and accumulates the run report.
//!
//! # Per-package state machine
//! `Ready → Validating → Extracting → FileStaged → ManifestWritten →`
//! (external import, opaque) `→ Resolving → Completed | Failed`.
//!
//! Phase one takes each package to `ManifestWritten`; the DOI sequence
//! counter advances only on that transition, so failed and skipped packages
//! never consume a DOI suffix. Phase two resolves each surviving package's
//! catalog URL and emits its MARC record and Crossref entry. Completed
//! packages are moved to the done area.
//!
//! # Error handling
//! Package faults ([`DepositError::is_package_fault`]) are converted into
//! failure-log entries at the per-package boundary and never abort the
//! batch; anything else (unexpected I/O, CSV, archive errors) is fatal to
//! the run and propagates to the caller.
//!
//! # Concurrency
//! Deliberately sequential: one package is fully processed before the next
//! begins. Ordering matters only for deterministic DOI sequencing and the
//! append order of the Crossref batch.

use chrono::{Local, NaiveDate};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use crate::config::{
    ContainerCheck, DepositConfig, CROSSREF_SUBDIR, DONE_SUBDIR, FILES_SUBDIR, MANIFEST_SUBDIR,
    MARC_SUBDIR, REPORTS_SUBDIR,
};
use crate::crossref::CrossrefBatch;
use crate::error::DepositError;
use crate::files::copy_package_files;
use crate::load_config::Mappings;
use crate::manifest::{add_to_manifest, write_manifest_header};
use crate::marc::create_marc_record;
use crate::metadata::extract_package_data;
use crate::package::{CompletedPackage, StagedPackage};
use crate::permissions::process_agreements;
use crate::report::{write_ingest_list, write_report, DepositReport};
use crate::resolve::{resolve_url, CatalogClient, RetryPolicy};

/// List the package directories awaiting processing, in name order so DOI
/// sequencing is deterministic across runs.
fn find_etd_packages(ready_path: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut packages = Vec::new();
    for entry in fs::read_dir(ready_path)? {
        let entry = entry?;
        if entry.path().is_dir() {
            packages.push(entry.path());
        }
    }
    packages.sort();
    Ok(packages)
}

fn package_name(package_path: &Path) -> String {
    package_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Read a package-internal file, converting absence into a package fault
/// rather than a fatal I/O error.
fn read_package_file(path: &Path) -> Result<String, DepositError> {
    fs::read_to_string(path)
        .map_err(|e| DepositError::MissingFile(format!("{}: {e}", path.display())))
}

/// Take one package from `Ready` to `FileStaged`: permissions validation,
/// metadata extraction with the run's current DOI sequence value, and file
/// staging into the output files area.
fn stage_package(
    package_path: &Path,
    name: &str,
    doi_sequence: u32,
    mappings: &Mappings,
    files_path: &Path,
    today: NaiveDate,
) -> Result<StagedPackage, DepositError> {
    info!(package = %name, "[DEPOSIT] Validating permissions");
    let permissions_path = package_path
        .join("data")
        .join("meta")
        .join(format!("{name}_permissions_meta.txt"));
    let permissions_content = read_package_file(&permissions_path)?;
    let agreements = process_agreements(&permissions_content, mappings, today)?;

    info!(package = %name, "[DEPOSIT] Extracting metadata");
    let metadata_path = package_path
        .join("data")
        .join("meta")
        .join(format!("{name}_etdms_meta.xml"));
    let metadata_xml = read_package_file(&metadata_path)?;
    let data = extract_package_data(
        &metadata_xml,
        name,
        doi_sequence,
        agreements,
        package_path,
        mappings,
    )?;

    info!(package = %name, "[DEPOSIT] Staging files");
    let files = copy_package_files(&data, files_path)?;

    Ok(StagedPackage { data, files })
}

/// Run the full deposit pipeline over every ready package.
pub async fn deposit<C, V>(
    config: &DepositConfig,
    mappings: &Mappings,
    catalog: &C,
    container_check: &V,
    retry: &RetryPolicy,
) -> Result<DepositReport, DepositError>
where
    C: CatalogClient + ?Sized,
    V: ContainerCheck + ?Sized,
{
    info!("[DEPOSIT] Starting deposit pipeline");
    config.create_output_directories()?;

    let today = Local::now().date_naive();
    let files_path = config.subdir(FILES_SUBDIR);
    let marc_path = config.subdir(MARC_SUBDIR);
    let done_path = config.subdir(DONE_SUBDIR);

    let manifest_path = config
        .subdir(MANIFEST_SUBDIR)
        .join(format!("{today}-metadata.csv"));
    write_manifest_header(&manifest_path)?;

    let packages = find_etd_packages(&config.ready_path())?;
    info!(count = packages.len(), "[DEPOSIT] Found packages to process");

    let mut report = DepositReport::default();
    let mut staged_packages: Vec<StagedPackage> = Vec::new();
    let mut doi_sequence = config.doi_start;

    // Phase one: Ready → ManifestWritten.
    for package_path in &packages {
        let name = package_name(package_path);

        if config.skip.iter().any(|skip| skip == &name) {
            info!(package = %name, "[DEPOSIT] Skipped (excluded by configuration)");
            report.record_skip(&name, "Skipped (excluded by configuration)");
            continue;
        }

        if !config.invalid_ok && !container_check.is_valid(package_path) {
            warn!(package = %name, "[DEPOSIT] Container check failed");
            report.record_failure(&name, "Invalid BagIt.");
            continue;
        }

        match stage_package(package_path, &name, doi_sequence, mappings, &files_path, today) {
            Ok(staged) => {
                add_to_manifest(&manifest_path, &staged, &config.collection_id)?;
                doi_sequence += 1;
                info!(package = %name, doi = %staged.data.doi, "[DEPOSIT] Manifest row written");
                staged_packages.push(staged);
            }
            Err(e) if e.is_package_fault() => {
                error!(package = %name, error = %e, "[DEPOSIT] Package failed");
                report.record_failure(&name, e.to_string());
            }
            Err(e) => {
                error!(package = %name, error = %e, "[DEPOSIT][FATAL] Unexpected error");
                return Err(e);
            }
        }
    }

    // The repository import happens out of band; phase two reconciles it.
    let mut crossref = CrossrefBatch::new();

    for staged in staged_packages {
        let name = staged.data.name.clone();
        info!(package = %name, "[DEPOSIT] Resolving catalog URL");

        let url = match resolve_url(catalog, retry, &name, &staged.data.source_identifier).await
        {
            Ok(url) => url,
            Err(e) if e.is_package_fault() => {
                error!(package = %name, error = %e, "[DEPOSIT] Resolution failed");
                report.record_failure(&name, "Link not found in repository.");
                continue;
            }
            Err(e) => return Err(e),
        };

        let completed = CompletedPackage { staged, url };
        create_marc_record(&completed, &marc_path, today)?;
        crossref.add(&completed);

        let source_path = &completed.staged.data.path;
        fs::rename(source_path, done_path.join(&name))?;
        info!(package = %name, "[DEPOSIT] Completed");
        report.completed.push(completed);
    }

    let crossref_path = config
        .subdir(CROSSREF_SUBDIR)
        .join(format!("{today}-crossref.xml"));
    crossref.write_to(&crossref_path)?;
    info!(
        entries = crossref.len(),
        path = %crossref_path.display(),
        "[DEPOSIT] Wrote Crossref batch"
    );

    let reports_path = config.subdir(REPORTS_SUBDIR);
    let report_path = write_report(&report, &reports_path, today)?;
    let processed_at = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    write_ingest_list(
        &report.completed,
        &reports_path.join(format!("{today}-ingest_list.csv")),
        &processed_at,
    )?;
    info!(
        completed = report.completed.len(),
        failed = report.failures.len(),
        skipped = report.skipped.len(),
        report = %report_path.display(),
        "[DEPOSIT] Run complete"
    );

    Ok(report)
}
