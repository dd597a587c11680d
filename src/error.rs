use thiserror::Error;

/// Errors raised while processing a deposit run.
///
/// The first three variants are per-package faults: the orchestrator catches
/// them at the package boundary, logs the package as failed, and carries on
/// with the rest of the batch. Everything else is treated as fatal to the
/// whole run.
#[derive(Debug, Error)]
pub enum DepositError {
    /// An expected file is absent, e.g. no PDF candidate in the data area.
    #[error("required file is missing, {0}")]
    MissingFile(String),

    /// A field validation or parsing failure in the package metadata,
    /// including compliance-document violations and XML parse errors.
    #[error("metadata error, {0}")]
    Metadata(String),

    /// The catalog lookup for an imported package exhausted its retries.
    #[error("could not resolve a catalog URL for {0}")]
    GetUrlFailed(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Zip(#[from] zip::result::ZipError),

    #[error(transparent)]
    Xml(#[from] quick_xml::Error),
}

impl DepositError {
    /// True when the error should fail only the current package, not the run.
    pub fn is_package_fault(&self) -> bool {
        matches!(
            self,
            DepositError::MissingFile(_)
                | DepositError::Metadata(_)
                | DepositError::GetUrlFailed(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, DepositError>;
