// src/store/memory.rs

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::RecordStore;
use crate::core::models::HistoryRecord;
use crate::error::PostureError;

/// `RecordStore` backed by a map behind an async lock. Used for tests and
/// `--database-url memory` runs.
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    records: RwLock<HashMap<String, HistoryRecord>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn get(&self, url: &str) -> Result<Option<HistoryRecord>, PostureError> {
        Ok(self.records.read().await.get(url).cloned())
    }

    async fn upsert(&self, record: &HistoryRecord) -> Result<(), PostureError> {
        self.records
            .write()
            .await
            .insert(record.url.clone(), record.clone());
        Ok(())
    }

    async fn insert_if_absent(&self, record: &HistoryRecord) -> Result<bool, PostureError> {
        let mut records = self.records.write().await;
        if records.contains_key(&record.url) {
            return Ok(false);
        }
        records.insert(record.url.clone(), record.clone());
        Ok(true)
    }

    async fn replace_if_unchanged(
        &self,
        record: &HistoryRecord,
        expected_refreshed_at: i64,
    ) -> Result<bool, PostureError> {
        let mut records = self.records.write().await;
        match records.get_mut(&record.url) {
            Some(stored) if stored.last_refreshed_at == expected_refreshed_at => {
                *stored = record.clone();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn list_urls(&self) -> Result<Vec<String>, PostureError> {
        Ok(self.records.read().await.keys().cloned().collect())
    }
}
