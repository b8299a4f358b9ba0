// src/error.rs

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Errors that fail a whole posture request.
#[derive(Debug, Error)]
pub enum PostureError {
    /// Missing, empty, or host-less `site` parameter. Raised before any adapter call.
    #[error("Invalid target: {0}")]
    InvalidTarget(String),

    /// The scan provider could not be reached, timed out, or sent a payload
    /// that does not decode.
    #[error("Scan provider unavailable: {0}")]
    ScanUnavailable(String),

    /// The record store failed mid-transaction.
    #[error("Record store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Serialization failed: {0}")]
    Serialization(String),
}

impl From<sqlx::Error> for PostureError {
    fn from(e: sqlx::Error) -> Self {
        PostureError::StoreUnavailable(e.to_string())
    }
}

impl From<sqlx::migrate::MigrateError> for PostureError {
    fn from(e: sqlx::migrate::MigrateError) -> Self {
        PostureError::StoreUnavailable(format!("migration failed: {}", e))
    }
}

// Every failure surfaces as a plain-text 500.
impl IntoResponse for PostureError {
    fn into_response(self) -> Response {
        (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()).into_response()
    }
}

/// Failures of the WHOIS and page-metadata adapters. These never leave the
/// snapshot builder: they are logged and replaced by sentinel text.
#[derive(Debug, Error)]
pub enum EnrichmentError {
    #[error("WHOIS lookup failed: {0}")]
    Whois(String),

    #[error("Page fetch failed: {0}")]
    PageFetch(String),

    #[error("Timed out after {0} seconds")]
    Timeout(u64),
}
