// src/core/models.rs

use serde::{Deserialize, Serialize};

use crate::error::PostureError;

// --- Sentinels ---
// Text reported in place of a value an adapter could not resolve.

pub const COUNTRY_NOT_FOUND: &str = "country not found";
pub const OWNER_NOT_FOUND: &str = "owner not found";
pub const TITLE_NOT_FOUND: &str = "title not found";
pub const LOGO_NOT_FOUND: &str = "logo not found";
pub const GRADE_NOT_FOUND: &str = "not found";

// --- Snapshot Models ---

/// One scanned endpoint of a site, enriched with WHOIS ownership data.
///
/// The serialized form of a `Vec<Server>` is also what gets persisted as a
/// server-set blob, so field order and names here are part of the stored format.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Server {
    pub address: String,
    #[serde(rename = "ssl_grade")]
    pub grade: String,
    pub country: String,
    pub owner: String,
}

impl Server {
    pub fn new(address: &str, grade: &str, country: &str, owner: &str) -> Self {
        Self {
            address: address.to_string(),
            grade: grade.to_string(),
            country: country.to_string(),
            owner: owner.to_string(),
        }
    }
}

/// The fresh view of a site at one point in time. Never persisted directly;
/// it is the input the diff engine compares against history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Snapshot {
    pub servers: Vec<Server>,
    pub ssl_grade: String,
    pub title: String,
    pub logo: String,
    pub is_down: bool,
}

impl Snapshot {
    /// Serialized form of `servers`, used only for equality checks.
    pub fn server_set_blob(&self) -> Result<String, PostureError> {
        serialize_servers(&self.servers)
    }
}

/// Order-sensitive serialization of a server list.
pub fn serialize_servers(servers: &[Server]) -> Result<String, PostureError> {
    serde_json::to_string(servers).map_err(|e| PostureError::Serialization(e.to_string()))
}

// --- History Models ---

/// The single persisted row per URL.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct HistoryRecord {
    pub url: String,
    pub last_refreshed_at: i64,
    pub previous_grade: String,
    pub current_grade: String,
    pub previous_server_set_blob: String,
    pub current_server_set_blob: String,
}

impl HistoryRecord {
    /// Record for a URL observed for the first time: both baselines equal the snapshot.
    pub fn first_observation(url: &str, snapshot: &Snapshot, now: i64) -> Result<Self, PostureError> {
        let blob = snapshot.server_set_blob()?;
        Ok(Self {
            url: url.to_string(),
            last_refreshed_at: now,
            previous_grade: snapshot.ssl_grade.clone(),
            current_grade: snapshot.ssl_grade.clone(),
            previous_server_set_blob: blob.clone(),
            current_server_set_blob: blob,
        })
    }

    /// The record after a refresh: the stored "current" baseline shifts to "previous".
    pub fn refreshed(&self, snapshot: &Snapshot, now: i64) -> Result<Self, PostureError> {
        Ok(Self {
            url: self.url.clone(),
            last_refreshed_at: now,
            previous_grade: self.current_grade.clone(),
            current_grade: snapshot.ssl_grade.clone(),
            previous_server_set_blob: self.current_server_set_blob.clone(),
            current_server_set_blob: snapshot.server_set_blob()?,
        })
    }
}

// --- Response Models ---

/// What the `/scan` route returns: the snapshot plus the two fields derived
/// from history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResponseRecord {
    pub servers: Vec<Server>,
    pub servers_changed: bool,
    pub ssl_grade: String,
    pub previous_ssl_grade: String,
    pub logo: String,
    pub title: String,
    pub is_down: bool,
}

impl ResponseRecord {
    pub fn from_snapshot(snapshot: Snapshot, previous_ssl_grade: String, servers_changed: bool) -> Self {
        Self {
            servers: snapshot.servers,
            servers_changed,
            ssl_grade: snapshot.ssl_grade,
            previous_ssl_grade,
            logo: snapshot.logo,
            title: snapshot.title,
            is_down: snapshot.is_down,
        }
    }
}

/// Body of the `/visited` route.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct VisitedUrls {
    pub items: Vec<String>,
}
