// src/core/scanner/ssl_labs.rs

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::{debug, error, info, warn};
use url::Url;

use super::{ScanPayload, ScanProvider};
use crate::error::PostureError;

pub const DEFAULT_SCAN_API_URL: &str = "https://api.ssllabs.com/api/v3";

const INITIAL_BACKOFF: Duration = Duration::from_millis(250);

/// Client for the SSL Labs v3 `analyze` endpoint.
///
/// One call per request. Transport failures and overload responses (429, 5xx)
/// are retried up to `retries` extra times with doubling backoff; a body that
/// does not decode is reported immediately.
pub struct SslLabsClient {
    client: reqwest::Client,
    base_url: String,
    from_cache: bool,
    retries: u32,
}

/// Why a single attempt failed. Only `Transient` is worth another try.
enum AttemptError {
    Transient(String),
    Fatal(PostureError),
}

impl SslLabsClient {
    /// Creates a client for the `analyze` endpoint under `base_url`.
    ///
    /// # Arguments
    /// * `client` - Shared HTTP client; its timeout bounds every attempt.
    /// * `base_url` - API root such as `https://api.ssllabs.com/api/v3`. A trailing
    ///   slash is ignored.
    /// * `from_cache` - Adds `fromCache=on` so the provider may answer from a recent assessment.
    /// * `retries` - Extra attempts after a transient failure.
    pub fn new(client: reqwest::Client, base_url: &str, from_cache: bool, retries: u32) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            from_cache,
            retries,
        }
    }

    fn analyze_url(&self, host: &str) -> Result<Url, PostureError> {
        let mut params = vec![("host", host)];
        if self.from_cache {
            params.push(("fromCache", "on"));
        }
        Url::parse_with_params(&format!("{}/analyze", self.base_url), &params)
            .map_err(|e| PostureError::ScanUnavailable(format!("invalid scan API URL: {}", e)))
    }

    async fn attempt(&self, url: &Url) -> Result<ScanPayload, AttemptError> {
        let response = self.client.get(url.clone()).send().await.map_err(|e| {
            warn!(url = %url, error = %e, "Scan provider request failed.");
            AttemptError::Transient(format!("request failed: {}", e))
        })?;

        let status = response.status();
        debug!(status = %status, "Received scan provider response.");
        if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
            return Err(AttemptError::Transient(format!("provider answered {}", status)));
        }

        let body = response.text().await.map_err(|e| {
            AttemptError::Transient(format!("failed to read response body: {}", e))
        })?;

        decode_payload(&body).map_err(AttemptError::Fatal)
    }
}

#[async_trait]
impl ScanProvider for SslLabsClient {
    /// Requests the assessment for `host`, retrying transient failures.
    ///
    /// # Arguments
    /// * `host` - The normalized host to assess.
    ///
    /// # Returns
    /// The decoded `ScanPayload`, including payloads whose status is `ERROR`
    /// (the snapshot reports those as down). `PostureError::ScanUnavailable`
    /// once retries run out or the body does not decode.
    async fn scan(&self, host: &str) -> Result<ScanPayload, PostureError> {
        info!(site = host, "Requesting TLS assessment.");
        let url = self.analyze_url(host)?;
        let mut backoff = INITIAL_BACKOFF;
        let mut attempt = 0;

        loop {
            // The backoff only grows on transient failures; decode errors end the loop at once.
            match self.attempt(&url).await {
                Ok(payload) => {
                    info!(
                        status = %payload.status,
                        endpoints = payload.endpoints.len(),
                        "TLS assessment received."
                    );
                    return Ok(payload);
                }
                Err(AttemptError::Fatal(e)) => {
                    error!(error = %e, "Scan provider payload rejected.");
                    return Err(e);
                }
                Err(AttemptError::Transient(reason)) if attempt < self.retries => {
                    attempt += 1;
                    warn!(attempt, reason = %reason, "Retrying scan provider request.");
                    tokio::time::sleep(backoff).await;
                    backoff *= 2;
                }
                Err(AttemptError::Transient(reason)) => {
                    error!(reason = %reason, "Scan provider unavailable.");
                    return Err(PostureError::ScanUnavailable(reason));
                }
            }
        }
    }
}

/// Decodes an `analyze` response body into the typed payload.
///
/// # Arguments
/// * `body` - Raw JSON text from the provider.
///
/// # Returns
/// The `ScanPayload`, or `PostureError::ScanUnavailable` when `status` is
/// missing or the JSON is malformed. Unknown fields are ignored.
pub fn decode_payload(body: &str) -> Result<ScanPayload, PostureError> {
    serde_json::from_str(body)
        .map_err(|e| PostureError::ScanUnavailable(format!("unexpected payload: {}", e)))
}
