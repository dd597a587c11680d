//! Catalog URL resolution.
//!
//! After the (out-of-band) repository import, each package's public catalog
//! URL is discovered by querying the catalog's search endpoint for the
//! package's stable `source_identifier`. Import is asynchronous on the
//! repository side, so the lookup is retried on a bounded quadratic backoff
//! schedule.
//!
//! The catalog is reached through the [`CatalogClient`] trait so tests can
//! substitute a deterministic mock; the retry schedule is a first-class
//! [`RetryPolicy`] value whose backoff function is pure, so the timing rules
//! are unit-testable without real sleeps.

use async_trait::async_trait;
use mockall::automock;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::DepositError;

/// Read-only lookup against the external catalog.
///
/// Implementations return the public URL for the record matching the given
/// source identifier, or `None` when the import has not surfaced yet.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait CatalogClient: Send + Sync {
    async fn lookup_url(
        &self,
        source_identifier: &str,
    ) -> Result<Option<String>, Box<dyn std::error::Error + Send + Sync>>;
}

/// Bounded retry schedule: attempt `i` (0-based) sleeps `i²` backoff units
/// before running, so the first attempt is immediate.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff_unit: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            backoff_unit: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// The pause before the given 0-based attempt.
    pub fn delay_before(&self, attempt: u32) -> Duration {
        self.backoff_unit * (attempt * attempt)
    }
}

/// Poll the catalog for a package's URL until it appears or the retry
/// policy is exhausted. Exhaustion fails the package, not the run.
pub async fn resolve_url<C: CatalogClient + ?Sized>(
    client: &C,
    policy: &RetryPolicy,
    package_name: &str,
    source_identifier: &str,
) -> Result<String, DepositError> {
    for attempt in 0..policy.max_attempts {
        let delay = policy.delay_before(attempt);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        match client.lookup_url(source_identifier).await {
            Ok(Some(url)) => {
                debug!(package = %package_name, url = %url, attempt, "Resolved catalog URL");
                return Ok(url);
            }
            Ok(None) => {
                debug!(package = %package_name, attempt, "Package not yet in catalog");
            }
            Err(e) => {
                warn!(package = %package_name, attempt, error = ?e, "Catalog lookup failed");
            }
        }
    }
    Err(DepositError::GetUrlFailed(package_name.to_string()))
}

#[derive(Debug, Deserialize)]
struct CatalogResponse {
    response: CatalogDocs,
}

#[derive(Debug, Deserialize)]
struct CatalogDocs {
    #[serde(default)]
    docs: Vec<CatalogDoc>,
}

#[derive(Debug, Deserialize)]
struct CatalogDoc {
    id: String,
    #[serde(default)]
    source_tesim: Vec<String>,
}

/// Catalog client backed by the repository's JSON search endpoint.
pub struct HttpCatalogClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpCatalogClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl CatalogClient for HttpCatalogClient {
    async fn lookup_url(
        &self,
        source_identifier: &str,
    ) -> Result<Option<String>, Box<dyn std::error::Error + Send + Sync>> {
        let url = format!("{}/catalog.json", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("q", source_identifier),
                ("search_field", "source_tesim"),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!("catalog returned status {status}").into());
        }

        let parsed: CatalogResponse = response.json().await?;
        let matched = parsed
            .response
            .docs
            .into_iter()
            .find(|doc| doc.source_tesim.iter().any(|s| s == source_identifier));

        Ok(matched.map(|doc| format!("{}/concern/etds/{}", self.base_url, doc.id)))
    }
}
