//! CLI interface for etd-depositor: command parsing, argument validation,
//! and the async entrypoint shared by `main` and the integration tests.
//!
//! All business logic (validation, extraction, artifact generation) lives in
//! the library modules; this module is strictly CLI glue and orchestration
//! wiring.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::{BagMarkerCheck, DepositConfig};
use crate::deposit::deposit;
use crate::load_config::load_mappings;
use crate::resolve::{HttpCatalogClient, RetryPolicy};

/// CLI for etd-depositor: process packaged thesis submissions into
/// repository ingest artifacts.
#[derive(Parser)]
#[clap(
    name = "etd-depositor",
    version,
    about = "Validate ETD packages and generate import manifest, MARC and Crossref artifacts"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Process every package in the ready directory
    Process {
        /// Directory containing the ready/ packages and output areas
        #[clap(long)]
        processing_directory: PathBuf,
        /// Path to the mappings YAML file
        #[clap(long, default_value = "mappings.yaml")]
        mappings: PathBuf,
        /// Base URL of the repository catalog
        #[clap(long)]
        catalog_url: String,
        /// Parent collection reference for the manifest
        #[clap(long)]
        collection: String,
        /// Starting number of the incrementing part of the generated DOIs
        #[clap(long)]
        doi_start: u32,
        /// Continue processing packages whose container check fails
        #[clap(long)]
        invalid_ok: bool,
        /// Package names to exclude from this run (repeatable)
        #[clap(long)]
        skip: Vec<String>,
    },
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    tracing::info!("trace_initialised");

    match cli.command {
        Commands::Process {
            processing_directory,
            mappings,
            catalog_url,
            collection,
            doi_start,
            invalid_ok,
            skip,
        } => {
            let mappings = load_mappings(mappings)?;
            let config = DepositConfig {
                processing_directory,
                catalog_base_url: catalog_url.clone(),
                collection_id: collection,
                doi_start,
                invalid_ok,
                skip,
            };
            config.trace_loaded();

            let catalog = HttpCatalogClient::new(catalog_url);
            let report = deposit(
                &config,
                &mappings,
                &catalog,
                &BagMarkerCheck,
                &RetryPolicy::default(),
            )
            .await?;

            tracing::info!(
                completed = report.completed.len(),
                failed = report.failures.len(),
                skipped = report.skipped.len(),
                "Deposit run complete"
            );
            Ok(())
        }
    }
}
