// src/core/scanner/mod.rs

// Narrow interfaces to the external collaborators the snapshot builder talks to,
// plus the production implementation of each.
pub mod page_metadata;
pub mod ssl_labs;
pub mod whois;

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::{EnrichmentError, PostureError};

/// Top-level status the scan provider reports when it could not assess a host.
pub const STATUS_ERROR: &str = "ERROR";

// --- Scan Provider ---

/// Typed form of the scan provider's `analyze` response. Only the fields the
/// snapshot needs are decoded; everything else in the payload is ignored.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ScanPayload {
    pub status: String,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub endpoints: Vec<ScanEndpoint>,
}

impl ScanPayload {
    pub fn is_down(&self) -> bool {
        self.status == STATUS_ERROR
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ScanEndpoint {
    #[serde(default)]
    pub ip_address: Option<String>,
    #[serde(default)]
    pub grade: Option<String>,
}

#[async_trait]
pub trait ScanProvider: Send + Sync {
    /// Runs (or fetches) the TLS assessment for `host`.
    async fn scan(&self, host: &str) -> Result<ScanPayload, PostureError>;
}

// --- WHOIS ---

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WhoisInfo {
    pub country: Option<String>,
    pub owner: Option<String>,
}

#[async_trait]
pub trait WhoisResolver: Send + Sync {
    /// Resolves owner and country for one server address.
    ///
    /// # Arguments
    /// * `ip` - An IPv4 or IPv6 literal taken from the scan payload.
    ///
    /// # Returns
    /// `WhoisInfo` with `None` for whatever the answer did not contain, or an
    /// `EnrichmentError` that the caller degrades to sentinels.
    async fn lookup(&self, ip: &str) -> Result<WhoisInfo, EnrichmentError>;
}

// --- Page Metadata ---

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageMetadata {
    pub title: Option<String>,
    pub logo: Option<String>,
}

#[async_trait]
pub trait PageMetadataFetcher: Send + Sync {
    /// Reads title and favicon link from the landing page of `host`.
    async fn fetch(&self, host: &str) -> Result<PageMetadata, EnrichmentError>;
}

/// Shared HTTP client for the scan provider and the page fetcher.
///
/// # Arguments
/// * `user_agent` - Sent with every request.
/// * `timeout` - Total time allowed per request, body included.
///
/// # Returns
/// The client, or the builder's error (for example a user agent that is not a
/// valid header value).
pub fn build_http_client(user_agent: &str, timeout: Duration) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(user_agent)
        .timeout(timeout)
        .build()
}
