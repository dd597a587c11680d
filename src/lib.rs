//! # etd-depositor
//!
//! Processing pipeline for packaged electronic thesis and dissertation
//! submissions. For each package in the ready area the pipeline validates
//! the compliance document, extracts and normalizes the bibliographic
//! metadata, stages the thesis files under deterministic names, and emits
//! the three artifacts a repository ingest workflow consumes: a CSV import
//! manifest, a binary MARC record per package, and a Crossref
//! DOI-registration batch per run. After import it resolves each item's
//! public catalog URL and writes a run report.
//!
//! Module map:
//! - [`cli`] / [`config`] / [`load_config`]: invocation surface, run
//!   parameters, and the externally supplied mapping tables.
//! - [`permissions`] / [`metadata`] / [`files`]: per-package validation and
//!   normalization stages.
//! - [`manifest`] / [`marc`] / [`crossref`]: the three artifact generators.
//! - [`resolve`]: catalog URL resolution with a bounded retry policy.
//! - [`deposit`]: the per-package state machine and batch orchestration.
//! - [`report`]: run report and ingest-list generation.

pub mod cli;
pub mod config;
pub mod crossref;
pub mod deposit;
pub mod error;
pub mod files;
pub mod load_config;
pub mod manifest;
pub mod marc;
pub mod metadata;
pub mod package;
pub mod permissions;
pub mod report;
pub mod resolve;

pub use cli::{run, Cli};
pub use config::DepositConfig;
pub use error::DepositError;
pub use package::{CompletedPackage, PackageData, StagedPackage};
