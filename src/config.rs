use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

// DOI_PREFIX is the library's registered DOI prefix, used when minting new
// DOIs for ETDs.
pub const DOI_PREFIX: &str = "10.22215";

// DOI_URL_PREFIX makes a minted DOI resolvable.
pub const DOI_URL_PREFIX: &str = "https://doi.org/";

pub const INSTITUTION: &str = "Carleton University";
pub const INSTITUTION_PLACE: &str = "Ottawa, Ontario";
pub const DEPOSITOR_NAME: &str = "Carleton University Library";
pub const DEPOSITOR_EMAIL: &str = "doi@library.carleton.ca";

// Subdirectories managed under the processing directory.
pub const READY_SUBDIR: &str = "ready";
pub const DONE_SUBDIR: &str = "done";
pub const FILES_SUBDIR: &str = "files";
pub const MARC_SUBDIR: &str = "marc";
pub const CROSSREF_SUBDIR: &str = "crossref";
pub const MANIFEST_SUBDIR: &str = "manifest";
pub const REPORTS_SUBDIR: &str = "reports";

/// Run parameters for one invocation of the deposit pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepositConfig {
    /// Directory holding `ready/` packages and receiving all output areas.
    pub processing_directory: PathBuf,
    /// Base URL of the repository catalog, e.g. `https://repo.library.example.ca`.
    pub catalog_base_url: String,
    /// The parent collection reference written to the manifest `parents` column.
    pub collection_id: String,
    /// Starting value for the incrementing part of minted DOIs.
    pub doi_start: u32,
    /// Process packages even when the container check fails.
    pub invalid_ok: bool,
    /// Package names excluded from this run before any DOI allocation.
    pub skip: Vec<String>,
}

impl DepositConfig {
    pub fn ready_path(&self) -> PathBuf {
        self.processing_directory.join(READY_SUBDIR)
    }

    pub fn subdir(&self, name: &str) -> PathBuf {
        self.processing_directory.join(name)
    }

    /// Create every managed output area under the processing directory.
    pub fn create_output_directories(&self) -> std::io::Result<()> {
        for name in [
            DONE_SUBDIR,
            FILES_SUBDIR,
            MARC_SUBDIR,
            CROSSREF_SUBDIR,
            MANIFEST_SUBDIR,
            REPORTS_SUBDIR,
        ] {
            std::fs::create_dir_all(self.subdir(name))?;
        }
        Ok(())
    }

    pub fn trace_loaded(&self) {
        info!(
            processing_directory = %self.processing_directory.display(),
            catalog_base_url = %self.catalog_base_url,
            doi_start = self.doi_start,
            skip_count = self.skip.len(),
            "Loaded DepositConfig"
        );
        debug!(?self, "DepositConfig loaded (full debug)");
    }
}

/// Oracle for the package container's integrity check.
///
/// The container format itself is outside this crate's scope; the pipeline
/// only needs a valid/invalid verdict before touching package contents.
pub trait ContainerCheck {
    fn is_valid(&self, package_path: &Path) -> bool;
}

/// Container check that looks for the BagIt declaration file. Bit-level
/// checksum verification is delegated to the packaging tools upstream.
pub struct BagMarkerCheck;

impl ContainerCheck for BagMarkerCheck {
    fn is_valid(&self, package_path: &Path) -> bool {
        package_path.join("bagit.txt").is_file()
    }
}
