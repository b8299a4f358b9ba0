// Shared fakes for the integration tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use vanguard_posture::api::AppState;
use vanguard_posture::core::diff_engine::{DEFAULT_STALENESS_WINDOW_SECS, DiffEngine};
use vanguard_posture::core::models::{
    HistoryRecord, LOGO_NOT_FOUND, Server, Snapshot, TITLE_NOT_FOUND,
};
use vanguard_posture::core::scanner::{
    PageMetadata, PageMetadataFetcher, ScanEndpoint, ScanPayload, ScanProvider, WhoisInfo,
    WhoisResolver,
};
use vanguard_posture::core::snapshot::SnapshotBuilder;
use vanguard_posture::error::{EnrichmentError, PostureError};
use vanguard_posture::store::RecordStore;

/// Scan provider answering from a fixed host → endpoints table. Unknown hosts
/// are reported as unreachable.
pub struct TableScan {
    pub hosts: HashMap<String, Vec<(String, String)>>,
    pub calls: AtomicUsize,
}

impl TableScan {
    pub fn new(entries: Vec<(&str, Vec<(&str, &str)>)>) -> Self {
        let hosts = entries
            .into_iter()
            .map(|(host, endpoints)| {
                let endpoints = endpoints
                    .iter()
                    .map(|(ip, grade)| (ip.to_string(), grade.to_string()))
                    .collect();
                (host.to_string(), endpoints)
            })
            .collect();
        Self {
            hosts,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ScanProvider for TableScan {
    async fn scan(&self, host: &str) -> Result<ScanPayload, PostureError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let endpoints = self
            .hosts
            .get(host)
            .ok_or_else(|| PostureError::ScanUnavailable(format!("{} unreachable", host)))?;
        Ok(ScanPayload {
            status: "READY".to_string(),
            host: Some(host.to_string()),
            endpoints: endpoints
                .iter()
                .map(|(ip, grade)| ScanEndpoint {
                    ip_address: Some(ip.clone()),
                    grade: Some(grade.clone()),
                })
                .collect(),
        })
    }
}

pub struct FixedWhois;

#[async_trait]
impl WhoisResolver for FixedWhois {
    async fn lookup(&self, ip: &str) -> Result<WhoisInfo, EnrichmentError> {
        Ok(WhoisInfo {
            country: Some("US".to_string()),
            owner: Some(format!("Owner of {}", ip)),
        })
    }
}

pub struct NoPage;

#[async_trait]
impl PageMetadataFetcher for NoPage {
    async fn fetch(&self, _host: &str) -> Result<PageMetadata, EnrichmentError> {
        Err(EnrichmentError::PageFetch("offline".to_string()))
    }
}

/// Record store whose backend is gone: every call fails.
pub struct DownStore;

fn store_down() -> PostureError {
    PostureError::StoreUnavailable("unable to open database file".to_string())
}

#[async_trait]
impl RecordStore for DownStore {
    async fn get(&self, _url: &str) -> Result<Option<HistoryRecord>, PostureError> {
        Err(store_down())
    }

    async fn upsert(&self, _record: &HistoryRecord) -> Result<(), PostureError> {
        Err(store_down())
    }

    async fn insert_if_absent(&self, _record: &HistoryRecord) -> Result<bool, PostureError> {
        Err(store_down())
    }

    async fn replace_if_unchanged(
        &self,
        _record: &HistoryRecord,
        _expected_refreshed_at: i64,
    ) -> Result<bool, PostureError> {
        Err(store_down())
    }

    async fn list_urls(&self) -> Result<Vec<String>, PostureError> {
        Err(store_down())
    }
}

pub fn app_state(scan: Arc<TableScan>, store: Arc<dyn RecordStore>) -> Arc<AppState> {
    let builder = SnapshotBuilder::new(
        scan,
        Arc::new(FixedWhois),
        Arc::new(NoPage),
        Duration::from_secs(1),
    );
    let engine = DiffEngine::new(store.clone(), DEFAULT_STALENESS_WINDOW_SECS);
    Arc::new(AppState::new(builder, engine, store))
}

pub fn snapshot(servers: &[(&str, &str)], grade: &str) -> Snapshot {
    Snapshot {
        servers: servers
            .iter()
            .map(|(ip, g)| Server::new(ip, g, "US", "Org"))
            .collect(),
        ssl_grade: grade.to_string(),
        title: TITLE_NOT_FOUND.to_string(),
        logo: LOGO_NOT_FOUND.to_string(),
        is_down: false,
    }
}
