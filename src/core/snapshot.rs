// src/core/snapshot.rs

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tracing::{debug, info, warn};

use crate::core::grade::lexical_max_grade;
use crate::core::models::{
    COUNTRY_NOT_FOUND, LOGO_NOT_FOUND, OWNER_NOT_FOUND, Server, Snapshot, TITLE_NOT_FOUND,
};
use crate::core::scanner::{
    PageMetadata, PageMetadataFetcher, ScanEndpoint, ScanProvider, WhoisInfo, WhoisResolver,
};
use crate::error::PostureError;

/// Composes the scan provider and the enrichment adapters into one `Snapshot`.
///
/// Only the scan itself can fail the build. WHOIS and page-metadata failures,
/// including the ones cut off by `enrichment_timeout`, are logged and replaced
/// by sentinel text.
pub struct SnapshotBuilder {
    scanner: Arc<dyn ScanProvider>,
    whois: Arc<dyn WhoisResolver>,
    pages: Arc<dyn PageMetadataFetcher>,
    enrichment_timeout: Duration,
}

impl SnapshotBuilder {
    /// Creates a builder over the three adapters.
    ///
    /// # Arguments
    /// * `scanner` - The TLS assessment provider.
    /// * `whois` - Resolver queried once per endpoint address.
    /// * `pages` - Fetcher for the landing page `head`.
    /// * `enrichment_timeout` - Upper bound on each WHOIS lookup and on the page fetch.
    pub fn new(
        scanner: Arc<dyn ScanProvider>,
        whois: Arc<dyn WhoisResolver>,
        pages: Arc<dyn PageMetadataFetcher>,
        enrichment_timeout: Duration,
    ) -> Self {
        Self {
            scanner,
            whois,
            pages,
            enrichment_timeout,
        }
    }

    /// Builds the snapshot for `host`.
    ///
    /// # Arguments
    /// * `host` - The normalized host, as returned by `normalize_target`.
    ///
    /// # Returns
    /// A `Snapshot` with servers in the provider's endpoint order, or the
    /// provider's `PostureError` when the scan itself fails.
    pub async fn build(&self, host: &str) -> Result<Snapshot, PostureError> {
        info!(site = host, "Building snapshot.");
        let payload = self.scanner.scan(host).await?;
        let is_down = payload.is_down();

        // WHOIS lookups for every endpoint run alongside the single page fetch.
        let (servers, metadata) = tokio::join!(
            join_all(payload.endpoints.iter().map(|endpoint| self.resolve_server(endpoint))),
            self.fetch_metadata(host)
        );

        let grades: Vec<&str> = servers.iter().map(|s| s.grade.as_str()).collect();
        let ssl_grade = lexical_max_grade(&grades);
        debug!(grades = ?grades, ssl_grade = %ssl_grade, "Aggregated endpoint grades.");

        let snapshot = Snapshot {
            servers,
            ssl_grade,
            title: metadata.title.unwrap_or_else(|| TITLE_NOT_FOUND.to_string()),
            logo: metadata.logo.unwrap_or_else(|| LOGO_NOT_FOUND.to_string()),
            is_down,
        };
        info!(
            servers = snapshot.servers.len(),
            ssl_grade = %snapshot.ssl_grade,
            is_down = snapshot.is_down,
            "Snapshot built."
        );
        Ok(snapshot)
    }

    async fn resolve_server(&self, endpoint: &ScanEndpoint) -> Server {
        let address = endpoint.ip_address.clone().unwrap_or_default();
        let grade = endpoint.grade.clone().unwrap_or_default();

        let info = if address.is_empty() {
            warn!("Endpoint without an address, skipping WHOIS.");
            WhoisInfo::default()
        } else {
            match tokio::time::timeout(self.enrichment_timeout, self.whois.lookup(&address)).await {
                Ok(Ok(info)) => info,
                Ok(Err(e)) => {
                    warn!(address = %address, error = %e, "WHOIS lookup degraded to sentinels.");
                    WhoisInfo::default()
                }
                Err(_) => {
                    warn!(address = %address, "WHOIS lookup timed out, using sentinels.");
                    WhoisInfo::default()
                }
            }
        };

        Server {
            address,
            grade,
            country: info.country.unwrap_or_else(|| COUNTRY_NOT_FOUND.to_string()),
            owner: info.owner.unwrap_or_else(|| OWNER_NOT_FOUND.to_string()),
        }
    }

    async fn fetch_metadata(&self, host: &str) -> PageMetadata {
        match tokio::time::timeout(self.enrichment_timeout, self.pages.fetch(host)).await {
            Ok(Ok(metadata)) => metadata,
            Ok(Err(e)) => {
                warn!(site = host, error = %e, "Page metadata degraded to sentinels.");
                PageMetadata::default()
            }
            Err(_) => {
                warn!(site = host, "Page metadata fetch timed out, using sentinels.");
                PageMetadata::default()
            }
        }
    }
}
