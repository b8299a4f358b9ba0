// src/store/mod.rs

//! Persistence of `HistoryRecord`s, one row per URL.

pub mod memory;
pub mod sqlite;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::core::models::HistoryRecord;
use crate::error::PostureError;

pub use memory::MemoryRecordStore;
pub use sqlite::SqliteRecordStore;

/// `--database-url` value selecting the non-persistent store.
pub const MEMORY_DATABASE_URL: &str = "memory";

/// Keyed history storage. Every method touches at most one URL, so calls for
/// different URLs never interact.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn get(&self, url: &str) -> Result<Option<HistoryRecord>, PostureError>;

    /// Inserts the record, or overwrites the row with the same URL.
    async fn upsert(&self, record: &HistoryRecord) -> Result<(), PostureError>;

    /// Inserts the record unless a row for its URL exists. Returns whether it was inserted.
    async fn insert_if_absent(&self, record: &HistoryRecord) -> Result<bool, PostureError>;

    /// Overwrites the stored row in a single statement, but only while its
    /// `last_refreshed_at` still equals `expected_refreshed_at`. Returns
    /// whether the swap happened.
    async fn replace_if_unchanged(
        &self,
        record: &HistoryRecord,
        expected_refreshed_at: i64,
    ) -> Result<bool, PostureError>;

    /// Every URL that has a row, in no guaranteed order.
    async fn list_urls(&self) -> Result<Vec<String>, PostureError>;
}

/// Opens the store named by `database_url`: `memory` for the in-process map,
/// anything else is handed to SQLite.
pub async fn open_store(database_url: &str) -> Result<Arc<dyn RecordStore>, PostureError> {
    if database_url == MEMORY_DATABASE_URL {
        info!("Using in-memory record store; history will not survive a restart.");
        return Ok(Arc::new(MemoryRecordStore::new()));
    }
    let store = SqliteRecordStore::connect(database_url).await?;
    Ok(Arc::new(store))
}
